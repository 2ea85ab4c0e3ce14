//! Lookup table from `(status, message)` to a business error code

use stampede_config::{ErrorCode, VocabularyConfig, VocabularyEntry};
use std::collections::HashMap;

/// Error vocabulary shared by the classifier and the configuration file
#[derive(Debug, Clone)]
pub struct ErrorVocabulary {
    by_status: HashMap<u16, Vec<(String, ErrorCode)>>,
}

impl ErrorVocabulary {
    pub fn new(entries: &[VocabularyEntry]) -> Self {
        let mut by_status: HashMap<u16, Vec<(String, ErrorCode)>> = HashMap::new();
        for entry in entries {
            by_status
                .entry(entry.status)
                .or_default()
                .push((entry.message.clone(), entry.code));
        }
        Self { by_status }
    }

    /// Exact match on status and message
    pub fn lookup(&self, status: u16, message: &str) -> Option<ErrorCode> {
        self.by_status
            .get(&status)?
            .iter()
            .find(|(m, _)| m == message)
            .map(|(_, code)| *code)
    }
}

impl Default for ErrorVocabulary {
    fn default() -> Self {
        Self::from(&VocabularyConfig::default())
    }
}

impl From<&VocabularyConfig> for ErrorVocabulary {
    fn from(config: &VocabularyConfig) -> Self {
        Self::new(&config.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_requires_status_and_message() {
        let vocabulary = ErrorVocabulary::new(&[
            VocabularyEntry::new(ErrorCode::InsufficientStock, 400, "sold out"),
            VocabularyEntry::new(ErrorCode::LockWaitTimeout, 500, "lock timeout"),
        ]);

        assert_eq!(
            vocabulary.lookup(400, "sold out"),
            Some(ErrorCode::InsufficientStock)
        );
        assert_eq!(vocabulary.lookup(500, "sold out"), None);
        assert_eq!(vocabulary.lookup(400, "sold out "), None);
        assert_eq!(
            vocabulary.lookup(500, "lock timeout"),
            Some(ErrorCode::LockWaitTimeout)
        );
    }
}
