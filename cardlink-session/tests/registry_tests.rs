mod common;

use cardlink_model::{
    AcceptConfig, CardConfig, ConfigError, DragConfig, DropZoneConfig, InteractionBinding,
    ValidationResult,
};
use cardlink_session::{
    CardRegistry, DragStatePatch, InteractionConfig, InteractionError, SessionPhase,
};
use cardlink_types::{CardId, DragPayload};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn make_registry() -> Arc<CardRegistry> {
    init_tracing();
    CardRegistry::create(&InteractionConfig::default())
}

fn card_ids(registry: &CardRegistry) -> Vec<String> {
    registry
        .get_all_cards()
        .iter()
        .map(|c| c.id.to_string())
        .collect()
}

// ── Registration ─────────────────────────────────────────────────

#[test]
fn register_and_look_up() {
    let registry = make_registry();
    let log = call_log();
    registry
        .register_card(calendar_card("calendar", vec![recording_action("create", &log)]))
        .unwrap();

    let card = registry.get_card_config("calendar").unwrap();
    assert_eq!(card.card_type, "calendar");
    assert_eq!(registry.card_count(), 1);
    assert_eq!(
        registry.get_drag_config_for_card("calendar"),
        Some(DragConfig::new("appointment"))
    );
    assert_eq!(registry.get_drop_zones_for_card("calendar").len(), 1);
}

#[test]
fn all_cards_are_ordered_by_id() {
    let registry = make_registry();
    for id in ["zeta", "alpha", "mid"] {
        registry.register_card(customer_list_card(id)).unwrap();
    }
    assert_eq!(card_ids(&registry), vec!["alpha", "mid", "zeta"]);
}

#[test]
fn re_registering_replaces_the_card() {
    let registry = make_registry();
    registry.register_card(customer_list_card("c")).unwrap();
    registry
        .register_card(CardConfig::new("c", "renamed"))
        .unwrap();
    assert_eq!(registry.card_count(), 1);
    assert_eq!(registry.get_card_config("c").unwrap().card_type, "renamed");
}

#[test]
fn unregister_unknown_card_is_a_no_op() {
    let registry = make_registry();
    registry.register_card(customer_list_card("c")).unwrap();
    assert!(registry.unregister_card("missing").is_none());
    assert!(registry.unregister_card("c").is_some());
    assert!(registry.get_card_config("c").is_none());
}

#[test]
fn unknown_card_queries_are_empty() {
    let registry = make_registry();
    assert!(registry.get_drop_zones_for_card("ghost").is_empty());
    assert!(registry.get_drag_config_for_card("ghost").is_none());
    assert!(!registry.can_card_accept("ghost", &customer_payload("list")));
    assert!(registry
        .get_available_actions("ghost", &customer_payload("list"))
        .is_empty());
}

#[test]
fn invalid_card_is_rejected() {
    let registry = make_registry();
    let err = registry
        .register_card(CardConfig::new("", "calendar"))
        .unwrap_err();
    assert!(matches!(err, InteractionError::Config(ConfigError::MissingId)));
    assert_eq!(registry.card_count(), 0);
}

#[test]
fn disposed_registry_refuses_registration() {
    let registry = make_registry();
    registry.register_card(customer_list_card("c")).unwrap();
    registry.dispose();
    assert!(registry.is_disposed());
    assert_eq!(registry.card_count(), 0);
    assert!(matches!(
        registry.register_card(customer_list_card("d")),
        Err(InteractionError::Disposed)
    ));
}

// ── Acceptance ───────────────────────────────────────────────────

#[test]
fn wrong_data_type_is_not_accepted() {
    let registry = make_registry();
    let log = call_log();
    registry
        .register_card(calendar_card("a", vec![recording_action("create", &log)]))
        .unwrap();

    let job = job_payload("jobs");
    assert!(!registry.can_card_accept("a", &job));
    assert!(registry.get_available_actions("a", &job).is_empty());
}

#[test]
fn zones_are_disjunctive() {
    let registry = make_registry();
    let card = CardConfig::new("inbox", "inbox")
        .with_drop_zone(DropZoneConfig::new("jobs", AcceptConfig::data_types(["job"])))
        .with_drop_zone(customer_zone("customers"));
    registry.register_card(card).unwrap();

    assert!(registry.can_card_accept("inbox", &customer_payload("list")));
    assert!(registry.can_card_accept("inbox", &job_payload("board")));
}

#[test]
fn max_items_counts_selection() {
    let registry = make_registry();
    let zone = DropZoneConfig::new("z", AcceptConfig::data_types(["customer"]).with_max_items(2));
    registry
        .register_card(CardConfig::new("team", "team").with_drop_zone(zone))
        .unwrap();

    let single = customer_payload("list");
    assert!(registry.can_card_accept("team", &single));

    let mut multi = customer_payload("list");
    multi.data = multi
        .data
        .clone()
        .with_selection(vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})]);
    assert!(!registry.can_card_accept("team", &multi));
}

#[test]
fn required_fields_must_be_present() {
    let registry = make_registry();
    let zone = DropZoneConfig::new(
        "z",
        AcceptConfig::data_types(["customer"]).with_required_field("email"),
    );
    registry
        .register_card(CardConfig::new("mailer", "mailer").with_drop_zone(zone))
        .unwrap();

    assert!(registry.can_card_accept("mailer", &customer_payload("list")));

    let mut no_email = customer_payload("list");
    no_email.data.entity = json!({"name": "Ada"});
    assert!(!registry.can_card_accept("mailer", &no_email));

    let mut null_email = customer_payload("list");
    null_email.data.entity = json!({"name": "Ada", "email": null});
    assert!(registry.can_card_accept("mailer", &null_email));
}

#[test]
fn custom_and_zone_validators_both_apply() {
    let registry = make_registry();
    let zone = DropZoneConfig::new(
        "z",
        AcceptConfig::data_types(["customer"])
            .with_custom_validator(|p: &DragPayload| p.data.id.starts_with("cust-")),
    )
    .with_validator(|p: &DragPayload| {
        if p.user_id.is_some() {
            ValidationResult::valid()
        } else {
            ValidationResult::invalid("anonymous drags are not allowed")
        }
    });
    registry
        .register_card(CardConfig::new("secure", "secure").with_drop_zone(zone))
        .unwrap();

    assert!(!registry.can_card_accept("secure", &customer_payload("list")));
    assert!(registry.can_card_accept("secure", &customer_payload("list").with_user("u-1")));

    let mut wrong_id = customer_payload("list").with_user("u-1");
    wrong_id.data.id = "lead-1".into();
    assert!(!registry.can_card_accept("secure", &wrong_id));
}

#[test]
fn available_actions_are_tagged_and_ordered() {
    let registry = make_registry();
    let log = call_log();
    let card = CardConfig::new("calendar", "calendar")
        .with_drop_zone(
            customer_zone("first")
                .with_action(recording_action("zeta", &log))
                .with_action(recording_action("alpha", &log))
                .with_action(recording_action("off", &log).disabled(true)),
        )
        .with_drop_zone(customer_zone("second").with_action(recording_action("beta", &log)))
        .with_drop_zone(
            DropZoneConfig::new("jobs", AcceptConfig::data_types(["job"]))
                .with_action(recording_action("never", &log)),
        );
    registry.register_card(card).unwrap();

    let actions = registry.get_available_actions("calendar", &customer_payload("list"));
    let keys: Vec<String> = actions.iter().map(|a| a.selection_key()).collect();
    assert_eq!(keys, vec!["calendar-alpha", "calendar-zeta", "calendar-beta"]);

    assert_eq!(actions[0].drop_zone_id, "first");
    assert_eq!(actions[0].target_card_type, "calendar");
    assert_eq!(actions[0].source_data_type, "customer");
    assert_eq!(actions[2].drop_zone_id, "second");
}

#[test]
fn queries_do_not_touch_drag_state() {
    let registry = make_registry();
    let log = call_log();
    registry
        .register_card(calendar_card("calendar", vec![recording_action("create", &log)]))
        .unwrap();

    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    let _sub = registry.subscribe_to_drag_state(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let payload = customer_payload("list");
    let first = registry.can_card_accept("calendar", &payload);
    for _ in 0..5 {
        assert_eq!(registry.can_card_accept("calendar", &payload), first);
        assert_eq!(registry.get_available_actions("calendar", &payload).len(), 1);
    }

    assert!(registry.get_drag_state().is_idle());
    assert_eq!(notified.load(Ordering::SeqCst), 1);
    assert!(calls(&log).is_empty());
}

// ── Drag state & subscriptions ───────────────────────────────────

#[test]
fn subscriber_receives_current_state_immediately() {
    let registry = make_registry();
    registry.set_drag_state(DragStatePatch::new().with_highlight(Some(CardId::new("x"))));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = registry.subscribe_to_drag_state(move |state| {
        sink.lock().unwrap().push(state.drop_zone_highlight.clone());
    });
    assert_eq!(*seen.lock().unwrap(), vec![Some(CardId::new("x"))]);
}

#[test]
fn subscribers_are_notified_in_subscription_order() {
    let registry = make_registry();
    let order = Arc::new(Mutex::new(Vec::new()));
    let subs: Vec<_> = (0..3)
        .map(|i| {
            let order = Arc::clone(&order);
            registry.subscribe_to_drag_state(move |_| order.lock().unwrap().push(i))
        })
        .collect();
    order.lock().unwrap().clear();

    registry.set_drag_state(DragStatePatch::new().with_dragging(true));
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(subs.len(), 3);
}

#[test]
fn patch_merges_and_is_visible_before_return() {
    let registry = make_registry();
    let last = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&last);
    let _sub = registry.subscribe_to_drag_state(move |state| {
        *sink.lock().unwrap() = Some((state.is_dragging, state.drop_target.clone()));
    });

    registry.set_drag_state(DragStatePatch::new().with_drop_target(Some(CardId::new("t"))));
    registry.set_drag_state(DragStatePatch::new().with_dragging(true));

    assert_eq!(
        *last.lock().unwrap(),
        Some((true, Some(CardId::new("t"))))
    );
}

#[test]
fn empty_patch_notifies_nobody() {
    let registry = make_registry();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let _sub = registry.subscribe_to_drag_state(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    registry.set_drag_state(DragStatePatch::new());
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn unsubscribe_stops_delivery() {
    let registry = make_registry();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let sub = registry.subscribe_to_drag_state(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(sub.unsubscribe());
    registry.set_drag_state(DragStatePatch::new().with_dragging(true));
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(registry.subscriber_count(), 0);
}

#[test]
fn panicking_subscriber_does_not_block_others() {
    let registry = make_registry();
    let _bad = registry.subscribe_to_drag_state(|state| {
        if state.is_dragging {
            panic!("listener bug");
        }
    });
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let _good = registry.subscribe_to_drag_state(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    registry.set_drag_state(DragStatePatch::new().with_dragging(true));
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert!(registry.get_drag_state().is_dragging);
}

#[test]
fn reset_returns_to_idle() {
    let registry = make_registry();
    registry.set_drag_state(
        DragStatePatch::new()
            .with_phase(SessionPhase::Dragging)
            .with_dragging(true)
            .with_payload(Some(Arc::new(customer_payload("list")))),
    );
    registry.reset_drag_state();
    assert!(registry.get_drag_state().is_idle());
}

// ── Interactions & global switch ─────────────────────────────────

#[test]
fn config_seeds_interactions_and_switch() {
    init_tracing();
    let binding = InteractionBinding::new("customer", "calendar", "create-appointment");
    let config = InteractionConfig {
        enabled: false,
        interactions: vec![binding.clone(), binding.clone()],
        ..InteractionConfig::default()
    };
    let registry = CardRegistry::create(&config);
    assert!(!registry.is_enabled());
    assert_eq!(registry.interactions(), vec![binding]);
}

#[test]
fn interaction_bindings_lifecycle() {
    let registry = make_registry();
    let a = InteractionBinding::new("customer", "calendar", "create-appointment");
    let b = InteractionBinding::new("customer", "calendar", "send-invite");
    registry.register_interaction(a.clone()).unwrap();
    registry.register_interaction(b.clone()).unwrap();
    registry.register_interaction(a.clone()).unwrap();
    assert_eq!(registry.interactions().len(), 2);

    assert_eq!(registry.find_interaction("customer", "calendar"), Some(a.clone()));
    assert_eq!(registry.find_interaction("job", "calendar"), None);

    assert!(registry.unregister_interaction(&a));
    assert!(!registry.unregister_interaction(&a));
    assert_eq!(registry.find_interaction("customer", "calendar"), Some(b));
}

#[test]
fn enabled_switch_toggles() {
    let registry = make_registry();
    assert!(registry.is_enabled());
    registry.set_enabled(false);
    assert!(!registry.is_enabled());
}
