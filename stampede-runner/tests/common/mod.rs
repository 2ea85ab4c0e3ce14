#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};
use stampede_core::TargetResponse;
use stampede_http::{HttpError, HttpMethod, TargetClient, TargetRequest};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;

pub const COUPON_URL: &str = "http://coupon.test";
pub const GATE_URL: &str = "http://gate.test";

pub const ALREADY_ISSUED: &str = "이미 발급받은 쿠폰입니다.";
pub const OUT_OF_STOCK: &str = "쿠폰 재고가 부족합니다.";

fn ok(result: JsonValue) -> TargetResponse {
    TargetResponse::from_json(
        200,
        json!({"code": 200, "status": "OK", "message": "OK", "result": result}),
    )
}

fn fail(status: u16, message: &str) -> TargetResponse {
    TargetResponse::from_json(
        status,
        json!({"code": status, "status": "ERROR", "message": message, "result": null}),
    )
}

#[derive(Default)]
struct Coupon {
    quantity: u64,
    holders: HashSet<String>,
    sequence: u64,
    completions: Vec<(String, u64)>,
}

#[derive(Default)]
struct State {
    next_user: i64,
    next_creator: i64,
    next_coupon: i64,
    coupons: HashMap<String, Coupon>,
    issue_calls: u64,
}

/// Strict single-queue FCFS coupon service
#[derive(Default)]
pub struct FakeCouponService {
    pub(crate) state: Mutex<State>,
    pub latency: Duration,
    pub reject_users: bool,
    pub drop_log_result: bool,
    pub reverse_log: bool,
}

impl FakeCouponService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue_calls(&self) -> u64 {
        self.state.lock().issue_calls
    }

    fn handle(&self, request: &TargetRequest) -> TargetResponse {
        let path = request.url.trim_start_matches(COUPON_URL);
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let body = request.body.clone().unwrap_or(JsonValue::Null);
        let mut state = self.state.lock();

        match (request.method, segments.as_slice()) {
            (HttpMethod::Post, ["api", "users"]) => {
                if self.reject_users {
                    return fail(400, "이름은 필수입니다.");
                }
                state.next_user += 1;
                ok(json!({"userId": state.next_user}))
            }
            (HttpMethod::Post, ["api", "creators"]) => {
                state.next_creator += 1;
                ok(json!({"creatorId": state.next_creator}))
            }
            (HttpMethod::Post, ["api", "coupons"]) => {
                state.next_coupon += 1;
                let id = state.next_coupon;
                let quantity = body["quantity"].as_u64().unwrap_or(0);
                state.coupons.insert(
                    id.to_string(),
                    Coupon {
                        quantity,
                        ..Default::default()
                    },
                );
                ok(json!({"couponId": id}))
            }
            (HttpMethod::Post, ["api", "coupons", coupon_id]) => {
                state.issue_calls += 1;
                let user = body["userId"].to_string();
                let Some(coupon) = state.coupons.get_mut(*coupon_id) else {
                    return fail(404, "쿠폰이 존재하지 않습니다.");
                };
                coupon.sequence += 1;
                if coupon.holders.contains(&user) {
                    return fail(400, ALREADY_ISSUED);
                }
                if coupon.holders.len() as u64 >= coupon.quantity {
                    return fail(400, OUT_OF_STOCK);
                }
                coupon.holders.insert(user.clone());
                let sequence = coupon.sequence;
                coupon.completions.push((user, sequence));
                ok(JsonValue::Null)
            }
            (HttpMethod::Get, ["api", "coupons", coupon_id, "verification-logs"]) => {
                if self.drop_log_result {
                    return ok(JsonValue::Null);
                }
                let Some(coupon) = state.coupons.get(*coupon_id) else {
                    return fail(404, "쿠폰이 존재하지 않습니다.");
                };
                let mut completions: Vec<JsonValue> = coupon
                    .completions
                    .iter()
                    .map(|(user, sequence)| {
                        json!({"userId": user, "timestamp": "2024-01-01T00:00:00", "requestSequence": sequence})
                    })
                    .collect();
                if self.reverse_log {
                    completions.reverse();
                }
                ok(json!({ "completions": completions }))
            }
            _ => fail(404, "not found"),
        }
    }
}

#[async_trait]
impl TargetClient for FakeCouponService {
    async fn send(&self, request: TargetRequest) -> Result<TargetResponse, HttpError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.handle(&request))
    }
}

/// Gate whose rank answers follow a fixed script
pub struct ScriptedGate {
    pub enqueue_status: u16,
    pub script: Vec<&'static str>,
    polls: AtomicU32,
    poll_times: Mutex<Vec<Instant>>,
}

impl ScriptedGate {
    pub fn new(script: Vec<&'static str>) -> Self {
        Self {
            enqueue_status: 200,
            script,
            polls: AtomicU32::new(0),
            poll_times: Mutex::new(Vec::new()),
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn poll_times(&self) -> Vec<Instant> {
        self.poll_times.lock().clone()
    }
}

#[async_trait]
impl TargetClient for ScriptedGate {
    async fn send(&self, request: TargetRequest) -> Result<TargetResponse, HttpError> {
        if request.url.ends_with("/enqueue") {
            return Ok(TargetResponse::from_json(
                self.enqueue_status,
                json!({"status": "ENQUEUED", "rank": 10}),
            ));
        }
        if request.url.ends_with("/rank") {
            let index = self.polls.fetch_add(1, Ordering::SeqCst) as usize;
            self.poll_times.lock().push(Instant::now());
            let status = self
                .script
                .get(index)
                .or(self.script.last())
                .copied()
                .unwrap_or("UNKNOWN");
            let body = if status == "WAITING" {
                json!({"status": status, "rank": 10u64.saturating_sub(index as u64)})
            } else {
                json!({"status": status})
            };
            return Ok(TargetResponse::from_json(200, body));
        }
        Err(HttpError::ConfigError(format!("unexpected url {}", request.url)))
    }
}
