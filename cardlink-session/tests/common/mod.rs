//! Shared test helpers for interaction tests.

#![allow(dead_code)]

use cardlink_model::{
    action_fn, AcceptConfig, ActionConfig, ActionResult, CardConfig, DragConfig, DropZoneConfig,
};
use cardlink_session::{ActionResolver, CardRegistry, DragSession, InteractionConfig};
use cardlink_types::{DragPayload, GestureId, PayloadData};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Routes `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Wiring {
    pub registry: Arc<CardRegistry>,
    pub resolver: Arc<ActionResolver>,
    pub session: DragSession,
}

pub fn make_wiring() -> Wiring {
    make_wiring_with(&InteractionConfig::default())
}

pub fn make_wiring_with(config: &InteractionConfig) -> Wiring {
    init_tracing();
    let registry = CardRegistry::create(config);
    let resolver = Arc::new(ActionResolver::new(Arc::clone(&registry)));
    let session = DragSession::new(Arc::clone(&resolver));
    Wiring {
        registry,
        resolver,
        session,
    }
}

pub fn customer_payload(source: &str) -> DragPayload {
    DragPayload::new(
        source,
        "customer-list",
        PayloadData::new("cust-42", "customer", json!({"name": "Ada Lovelace", "email": "ada@example.com"})),
    )
}

pub fn job_payload(source: &str) -> DragPayload {
    DragPayload::new(
        source,
        "job-board",
        PayloadData::new("job-7", "job", json!({"title": "Fix roof"})),
    )
}

/// Shared call log written by [`recording_action`] handlers.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// An action whose handler appends `"<id>:<entity id>"` to `log`.
pub fn recording_action(id: &str, log: &CallLog) -> ActionConfig {
    let log = Arc::clone(log);
    let tag = id.to_string();
    ActionConfig::new(
        id,
        id,
        action_fn(move |payload: DragPayload| {
            let log = Arc::clone(&log);
            let tag = tag.clone();
            async move {
                log.lock().unwrap().push(format!("{tag}:{}", payload.data.id));
                Ok(ActionResult::ok().with_message(format!("{tag} done")))
            }
        }),
    )
}

pub fn customer_zone(id: &str) -> DropZoneConfig {
    DropZoneConfig::new(id, AcceptConfig::data_types(["customer"]))
}

/// A calendar card with one customer zone offering `actions`.
pub fn calendar_card(id: &str, actions: Vec<ActionConfig>) -> CardConfig {
    let zone = actions
        .into_iter()
        .fold(customer_zone("main"), |zone, action| zone.with_action(action));
    CardConfig::new(id, "calendar")
        .with_drag_config(DragConfig::new("appointment"))
        .with_drop_zone(zone)
}

/// A card that emits customers and accepts nothing.
pub fn customer_list_card(id: &str) -> CardConfig {
    CardConfig::new(id, "customer-list").with_drag_config(DragConfig::new("customer"))
}

/// A releaser that counts calls per workspace.
pub fn counting_releaser() -> (Arc<AtomicUsize>, impl Fn(GestureId) + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    (count, move |_gesture: GestureId| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}
