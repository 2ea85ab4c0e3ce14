//! Target service client for stampede
//!
//! One shared connection pool sits behind the [`TargetClient`] trait; the
//! typed coupon and gate APIs are thin wrappers that build requests and pull
//! ids out of the `{code, status, message, result}` envelope.

pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod types;

// Re-export main types for convenience
pub use api::{CouponApi, EnqueueAck, GateApi};
pub use client::{HttpManager, TargetClient, TargetRequest};
pub use config::HttpConfig;
pub use errors::HttpError;
pub use types::HttpMethod;
