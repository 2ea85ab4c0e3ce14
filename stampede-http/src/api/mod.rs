//! Typed calls against the coupon service and the waiting-room gate

pub mod coupon;
pub mod gate;

pub use coupon::CouponApi;
pub use gate::{EnqueueAck, GateApi};

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
