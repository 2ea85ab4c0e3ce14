//! Error-code vocabulary of the allocation service
//!
//! The allocation service reports business failures as a status code plus a
//! human-readable message. This table binds each failure the harness cares
//! about to the exact `(status, message)` pair the service emits, so the
//! classifier never carries literal text of its own.

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Business failures recognised by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The actor already holds this coupon
    AlreadyAllocated,
    /// The coupon's quantity is exhausted
    InsufficientStock,
    /// The service gave up waiting for its coupon lock
    LockWaitTimeout,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AlreadyAllocated => "already_allocated",
            ErrorCode::InsufficientStock => "insufficient_stock",
            ErrorCode::LockWaitTimeout => "lock_wait_timeout",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(status, message)` binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub code: ErrorCode,
    pub status: u16,
    pub message: String,
}

impl VocabularyEntry {
    pub fn new(code: ErrorCode, status: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    #[serde(default = "default_entries")]
    pub entries: Vec<VocabularyEntry>,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            entries: default_entries(),
        }
    }
}

impl Validatable for VocabularyConfig {
    fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            validate_required_string(&entry.message, "message", self.domain_name())?;
            if !(100..=599).contains(&entry.status) {
                return Err(self.validation_error(format!(
                    "{} has out-of-range status {}",
                    entry.code, entry.status
                )));
            }
            if !seen.insert(entry.code) {
                return Err(self.validation_error(format!("{} is listed twice", entry.code)));
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "vocabulary"
    }
}

fn default_entries() -> Vec<VocabularyEntry> {
    vec![
        VocabularyEntry::new(ErrorCode::AlreadyAllocated, 400, "이미 발급받은 쿠폰입니다."),
        VocabularyEntry::new(ErrorCode::InsufficientStock, 400, "쿠폰 재고가 부족합니다."),
        VocabularyEntry::new(
            ErrorCode::LockWaitTimeout,
            500,
            "쿠폰 LOCK 획득 대기 시간이 초과되었습니다.",
        ),
    ]
}
