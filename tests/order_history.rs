use anyhow::{anyhow, Result};
use async_trait::async_trait;
use autonomy_trade::core::indexer::client::{FallbackIndexer, IndexerClient, RawRequest};
use autonomy_trade::core::indexer::decode::{decode_request, decode_requests, parse_created_at};
use autonomy_trade::core::indexer::poller::{OrderHistoryPoller, PollerState};
use autonomy_trade::core::request::is_stop_loss;
use autonomy_trade::types::{orders_by_status, OrderStatus, OrderType};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use num_bigint::BigUint;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;

const ACCOUNT: &str = "osmo1user";

#[derive(Clone, Default)]
struct FakeIndexer {
    requests: Vec<RawRequest>,
    failing: Arc<AtomicBool>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeIndexer {
    fn serving(requests: Vec<RawRequest>) -> Self {
        Self {
            requests,
            ..Self::default()
        }
    }

    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexerClient for FakeIndexer {
    async fn requests_by_register(&self, register_id: &str) -> Result<Vec<RawRequest>> {
        self.calls.lock().unwrap().push(register_id.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.requests.clone())
    }
}

fn encode(msg: Value) -> String {
    STANDARD.encode(serde_json::to_vec(&msg).unwrap())
}

fn raw(id: &str, status: &str, msg: String) -> RawRequest {
    RawRequest {
        id: id.to_string(),
        register_id: ACCOUNT.to_string(),
        target: "osmo1wrapper".to_string(),
        msg,
        assets: Value::Null,
        status: status.to_string(),
        created_at: "2023-01-05T10:20:30.123456".to_string(),
        tx_hash: String::new(),
        executed_or_cancelled_at: None,
    }
}

fn swap_msg(min_output: &str, max_output: &str) -> String {
    encode(json!({
        "swap": {
            "user": ACCOUNT,
            "amount_in": "10000000",
            "denom_in": "uosmo",
            "denom_out": "uatom",
            "min_output": min_output,
            "max_output": max_output,
            "route": [
                { "pool_id": "1", "token_out_denom": "uatom" },
                { "pool_id": "7", "token_out_denom": "ujuno" }
            ]
        }
    }))
}

fn sample_requests() -> Vec<RawRequest> {
    vec![
        raw("3", "created", swap_msg("2000000", "18446744073709551615")),
        raw("12", "executed", swap_msg("800", "1000")),
        raw("5", "cancelled", swap_msg("950", "1000")),
    ]
}

#[test_case("800", "1000", true ; "eighty percent floor")]
#[test_case("950", "1000", false ; "limit")]
#[test_case("799", "999", true ; "floor of fractional product")]
#[test_case("800", "abc", false ; "garbage max")]
fn stop_loss_classification(min_output: &str, max_output: &str, stop_loss: bool) {
    assert_eq!(is_stop_loss(min_output, max_output), stop_loss);
}

#[test]
fn decode_current_layout() {
    let order = decode_request(&raw("12", "executed", swap_msg("800", "1000"))).unwrap();

    assert_eq!(order.id, 12);
    assert_eq!(order.order_type, OrderType::StopLoss);
    assert_eq!(order.status, OrderStatus::Executed);
    assert_eq!(order.created_at, 1_672_914_030);
    assert_eq!(order.input_token.denom, "uosmo");
    assert_eq!(order.input_token.amount, BigUint::from(10_000_000u32));
    // last hop, quoted at max_output
    assert_eq!(order.output_token.denom, "ujuno");
    assert_eq!(order.output_token.amount, BigUint::from(1_000u32));
}

#[test]
fn decode_legacy_layout() {
    let msg = encode(json!({
        "swap": {
            "user": ACCOUNT,
            "amount": "500",
            "min_output": "950",
            "max_output": "1000",
            "first": { "pool_id": "1", "denom_in": "uatom", "denom_out": "uosmo" },
            "route": []
        }
    }));
    let order = decode_request(&raw("4", "created", msg)).unwrap();

    assert_eq!(order.order_type, OrderType::Limit);
    assert_eq!(order.input_token.denom, "uatom");
    assert_eq!(order.input_token.amount, BigUint::from(500u32));
    assert_eq!(order.output_token.denom, "uosmo");
    assert_eq!(order.output_token.amount, BigUint::from(950u32));
}

#[test]
fn malformed_records_are_dropped() {
    let mut requests = sample_requests();
    requests.push(raw("20", "created", "not base64!".to_string()));
    requests.push(raw("21", "created", encode(json!({ "swap": {
        "amount_in": "1", "denom_in": "uosmo", "min_output": "1", "max_output": "2"
    } }))));
    requests.push(raw("22", "pending", swap_msg("800", "1000")));
    requests.push(raw("x", "created", swap_msg("800", "1000")));

    let orders = decode_requests(&requests);
    assert_eq!(orders.len(), 3);
    assert_eq!(
        orders.iter().map(|order| order.id).collect::<Vec<_>>(),
        vec![12, 5, 3]
    );
}

#[test]
fn orders_split_into_tabs() {
    let orders = decode_requests(&sample_requests());

    let open = orders_by_status(&orders, OrderType::Limit, OrderStatus::Created);
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, 3);
    assert_eq!(open[0].output_token.amount, BigUint::from(2_000_000u32));

    assert_eq!(orders_by_status(&orders, OrderType::StopLoss, OrderStatus::Executed).len(), 1);
    assert_eq!(orders_by_status(&orders, OrderType::Limit, OrderStatus::Cancelled).len(), 1);
    assert!(orders_by_status(&orders, OrderType::StopLoss, OrderStatus::Created).is_empty());
}

#[test_case("2023-01-05T10:20:30Z", Some(1_672_914_030) ; "rfc3339")]
#[test_case("2023-01-05T12:20:30+02:00", Some(1_672_914_030) ; "offset")]
#[test_case("2023-01-05T10:20:30", Some(1_672_914_030) ; "naive")]
#[test_case("yesterday", None ; "garbage")]
fn created_at_formats(value: &str, expected: Option<i64>) {
    assert_eq!(parse_created_at(value), expected);
}

#[tokio::test]
async fn idle_poller_emits_nothing() {
    let indexer = FakeIndexer::serving(sample_requests());
    let mut poller = OrderHistoryPoller::new(indexer.clone());

    assert_eq!(poller.state(), PollerState::Idle);
    assert!(poller.tick().await.orders.is_empty());
    assert!(indexer.calls().is_empty());
}

#[tokio::test]
async fn backup_is_queried_with_same_account() {
    let primary = FakeIndexer::serving(vec![]);
    primary.fail(true);
    let backup = FakeIndexer::serving(sample_requests());

    let mut poller =
        OrderHistoryPoller::new(FallbackIndexer::new(primary.clone(), backup.clone())).with_account(ACCOUNT);
    assert_eq!(poller.state(), PollerState::Polling);

    let history = poller.tick().await;
    assert_eq!(history.orders.len(), 3);
    assert!(!history.stale);
    assert_eq!(primary.calls(), vec![ACCOUNT.to_string()]);
    assert_eq!(backup.calls(), vec![ACCOUNT.to_string()]);
}

#[tokio::test]
async fn healthy_primary_skips_backup() {
    let primary = FakeIndexer::serving(sample_requests());
    let backup = FakeIndexer::serving(vec![]);

    let mut poller =
        OrderHistoryPoller::new(FallbackIndexer::new(primary.clone(), backup.clone())).with_account(ACCOUNT);
    assert_eq!(poller.tick().await.orders.len(), 3);
    assert!(backup.calls().is_empty());
}

#[tokio::test]
async fn both_failing_keeps_previous_orders() {
    let primary = FakeIndexer::serving(sample_requests());
    let backup = FakeIndexer::serving(sample_requests());

    let mut poller =
        OrderHistoryPoller::new(FallbackIndexer::new(primary.clone(), backup.clone())).with_account(ACCOUNT);
    let before = poller.tick().await.orders.clone();
    assert_eq!(before.len(), 3);

    primary.fail(true);
    backup.fail(true);
    let history = poller.tick().await;
    assert_eq!(history.orders, before);
    assert!(history.stale);

    primary.fail(false);
    let history = poller.tick().await;
    assert!(!history.stale);
}

#[tokio::test]
async fn switching_account_clears_history() {
    let indexer = FakeIndexer::serving(sample_requests());
    let mut poller = OrderHistoryPoller::new(indexer.clone()).with_account(ACCOUNT);
    poller.tick().await;
    assert_eq!(poller.history().orders.len(), 3);

    poller.set_account(Some("osmo1other".to_string()));
    assert!(poller.history().orders.is_empty());
    poller.tick().await;
    assert_eq!(indexer.calls(), vec![ACCOUNT.to_string(), "osmo1other".to_string()]);

    poller.set_account(None);
    assert_eq!(poller.state(), PollerState::Idle);
}

#[tokio::test]
async fn spawned_poller_publishes_history() {
    let indexer = FakeIndexer::serving(sample_requests());
    let handle = OrderHistoryPoller::new(indexer.clone()).spawn(Duration::from_millis(20));

    let mut history = handle.subscribe();
    handle.set_account(Some(ACCOUNT.to_string()));

    let orders = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            history.changed().await.unwrap();
            let latest = history.borrow_and_update().clone();
            if !latest.orders.is_empty() {
                return latest.orders;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(orders.len(), 3);
    assert_eq!(handle.latest().orders.len(), 3);
    assert!(indexer.calls().iter().all(|account| account == ACCOUNT));
    drop(handle);
}
