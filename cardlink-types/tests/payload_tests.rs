use cardlink_types::{CardId, DragPayload, DragPreview, Error, PayloadData};
use pretty_assertions::assert_eq;
use serde_json::json;

fn customer_payload() -> DragPayload {
    DragPayload::new(
        "customers",
        "customer-list",
        PayloadData::new("c-42", "customer", json!({"id": "c-42", "name": "Ada", "phone": null})),
    )
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn new_copies_data_type_into_source_data_type() {
    let payload = customer_payload();
    assert_eq!(payload.source_card_id, CardId::new("customers"));
    assert_eq!(payload.source_card_type, "customer-list");
    assert_eq!(payload.source_data_type, "customer");
    assert!(payload.timestamp > 0);
    assert!(payload.drag_preview.is_none());
    assert!(payload.user_id.is_none());
}

#[test]
fn builders_set_optional_fields() {
    let payload = customer_payload()
        .with_preview(DragPreview::titled("Ada"))
        .with_user("u-1")
        .with_timestamp(1234);
    assert_eq!(payload.drag_preview.unwrap().title, "Ada");
    assert_eq!(payload.user_id.as_deref(), Some("u-1"));
    assert_eq!(payload.timestamp, 1234);
}

// ── Item count ───────────────────────────────────────────────────

#[test]
fn item_count_defaults_to_one() {
    assert_eq!(customer_payload().item_count(), 1);
}

#[test]
fn item_count_uses_selection_length() {
    let mut payload = customer_payload();
    payload.data = payload
        .data
        .clone()
        .with_selection(vec![json!("a"), json!("b"), json!("c")]);
    assert_eq!(payload.item_count(), 3);
}

#[test]
fn item_count_of_empty_selection_is_zero() {
    let mut payload = customer_payload();
    payload.data = payload.data.clone().with_selection(Vec::new());
    assert_eq!(payload.item_count(), 0);
}

// ── Entity access ────────────────────────────────────────────────

#[test]
fn entity_field_lookup() {
    let payload = customer_payload();
    assert_eq!(payload.entity_field("name"), Some(&json!("Ada")));
    assert_eq!(payload.entity_field("phone"), Some(&json!(null)));
    assert_eq!(payload.entity_field("email"), None);
}

#[test]
fn entity_field_on_non_object_entity() {
    let payload = DragPayload::new("a", "t", PayloadData::new("1", "note", json!("just text")));
    assert_eq!(payload.entity_field("anything"), None);
}

#[test]
fn preview_title_falls_back_to_data_id() {
    let payload = customer_payload();
    assert_eq!(payload.preview_title(), "c-42");
    let payload = payload.with_preview(DragPreview::titled("Ada Lovelace"));
    assert_eq!(payload.preview_title(), "Ada Lovelace");
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn validate_accepts_complete_payload() {
    assert!(customer_payload().validate().is_ok());
}

#[test]
fn validate_rejects_blank_source_card() {
    let payload = DragPayload::new("  ", "t", PayloadData::new("1", "customer", json!({})));
    assert!(matches!(payload.validate(), Err(Error::InvalidPayload(_))));
}

#[test]
fn validate_rejects_blank_data_type() {
    let payload = DragPayload::new("a", "t", PayloadData::new("1", "", json!({})));
    assert!(matches!(payload.validate(), Err(Error::InvalidPayload(_))));
}

// ── JSON form ────────────────────────────────────────────────────

#[test]
fn json_uses_camel_case_keys() {
    let payload = customer_payload().with_timestamp(5);
    let value: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
    assert_eq!(value["sourceCardId"], json!("customers"));
    assert_eq!(value["sourceCardType"], json!("customer-list"));
    assert_eq!(value["sourceDataType"], json!("customer"));
    assert_eq!(value["data"]["type"], json!("customer"));
    assert_eq!(value["timestamp"], json!(5));
    assert!(value.get("dragPreview").is_none());
}

#[test]
fn json_roundtrip_preserves_selection_extras() {
    let json = r#"{
        "sourceCardId": "jobs",
        "sourceCardType": "job-board",
        "sourceDataType": "job",
        "data": {
            "id": "j-1",
            "type": "job",
            "entity": {"title": "Fix roof"},
            "metadata": {"selectedItems": [1, 2], "origin": "lasso"}
        },
        "timestamp": 99
    }"#;
    let payload = DragPayload::from_json(json).unwrap();
    assert_eq!(payload.item_count(), 2);
    let meta = payload.data.metadata.as_ref().unwrap();
    assert_eq!(meta.extra.get("origin"), Some(&json!("lasso")));

    let again = DragPayload::from_json(&payload.to_json().unwrap()).unwrap();
    assert_eq!(again, payload);
}

#[test]
fn from_json_rejects_garbage() {
    assert!(matches!(
        DragPayload::from_json("{not json"),
        Err(Error::Serialization(_))
    ));
}
