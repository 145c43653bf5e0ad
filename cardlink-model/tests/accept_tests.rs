use cardlink_model::{AcceptConfig, DropZoneConfig, Rejection, ValidationResult};
use cardlink_types::{DragPayload, PayloadData};
use serde_json::json;

fn payload(data_type: &str, entity: serde_json::Value) -> DragPayload {
    DragPayload::new("source", "list", PayloadData::new("e-1", data_type, entity))
}

fn customer() -> DragPayload {
    payload("customer", json!({"name": "Ada", "email": "ada@example.com"}))
}

// ── Data type ────────────────────────────────────────────────────

#[test]
fn accepts_listed_data_type() {
    let accepts = AcceptConfig::data_types(["customer", "lead"]);
    assert!(accepts.check(&customer()).is_ok());
}

#[test]
fn rejects_unlisted_data_type() {
    let accepts = AcceptConfig::data_types(["customer"]);
    let job = payload("job", json!({}));
    assert_eq!(accepts.check(&job), Err(Rejection::DataType("job".into())));
}

#[test]
fn empty_data_type_list_accepts_nothing() {
    let accepts = AcceptConfig::default();
    assert!(accepts.check(&customer()).is_err());
}

// ── Item count ───────────────────────────────────────────────────

#[test]
fn single_item_within_limit() {
    let accepts = AcceptConfig::data_types(["customer"]).with_max_items(1);
    assert!(accepts.check(&customer()).is_ok());
}

#[test]
fn selection_over_limit_is_rejected() {
    let accepts = AcceptConfig::data_types(["customer"]).with_max_items(2);
    let mut p = customer();
    p.data = p.data.clone().with_selection(vec![json!(1), json!(2), json!(3)]);
    assert_eq!(
        accepts.check(&p),
        Err(Rejection::TooManyItems { count: 3, max: 2 })
    );
}

#[test]
fn selection_at_limit_is_accepted() {
    let accepts = AcceptConfig::data_types(["customer"]).with_max_items(3);
    let mut p = customer();
    p.data = p.data.clone().with_selection(vec![json!(1), json!(2), json!(3)]);
    assert!(accepts.check(&p).is_ok());
}

// ── Required fields ──────────────────────────────────────────────

#[test]
fn required_fields_present() {
    let accepts = AcceptConfig::data_types(["customer"])
        .with_required_field("name")
        .with_required_field("email");
    assert!(accepts.check(&customer()).is_ok());
}

#[test]
fn missing_required_field_is_named() {
    let accepts = AcceptConfig::data_types(["customer"])
        .with_required_field("name")
        .with_required_field("phone");
    assert_eq!(
        accepts.check(&customer()),
        Err(Rejection::MissingField("phone".into()))
    );
}

#[test]
fn null_field_counts_as_present() {
    let accepts = AcceptConfig::data_types(["customer"]).with_required_field("phone");
    let p = payload("customer", json!({"phone": null}));
    assert!(accepts.check(&p).is_ok());
}

// ── Custom predicate ─────────────────────────────────────────────

#[test]
fn custom_validator_can_refuse() {
    let accepts = AcceptConfig::data_types(["customer"])
        .with_custom_validator(|p: &DragPayload| p.entity_field("vip").is_some());
    assert_eq!(accepts.check(&customer()), Err(Rejection::CustomValidator));

    let vip = payload("customer", json!({"vip": true}));
    assert!(accepts.check(&vip).is_ok());
}

#[test]
fn data_type_is_checked_before_custom_validator() {
    let accepts =
        AcceptConfig::data_types(["customer"]).with_custom_validator(|_: &DragPayload| false);
    let job = payload("job", json!({}));
    assert_eq!(accepts.check(&job), Err(Rejection::DataType("job".into())));
}

// ── Zone validator ───────────────────────────────────────────────

#[test]
fn zone_validator_reason_is_reported() {
    let zone = DropZoneConfig::new("z", AcceptConfig::data_types(["customer"]))
        .with_validator(|_: &DragPayload| ValidationResult::invalid("calendar is locked"));
    assert_eq!(
        zone.evaluate(&customer()),
        Err(Rejection::ZoneValidator("calendar is locked".into()))
    );
    assert!(!zone.accepts(&customer()));
}

#[test]
fn zone_validator_runs_after_accept_rules() {
    let zone = DropZoneConfig::new("z", AcceptConfig::data_types(["customer"]))
        .with_validator(|_: &DragPayload| ValidationResult::valid());
    assert!(zone.accepts(&customer()));
    assert!(!zone.accepts(&payload("job", json!({}))));
}

#[test]
fn rejection_messages_are_readable() {
    assert_eq!(
        Rejection::TooManyItems { count: 4, max: 1 }.to_string(),
        "4 items exceed the limit of 1"
    );
    assert_eq!(
        Rejection::MissingField("email".into()).to_string(),
        "required field 'email' is missing"
    );
}
