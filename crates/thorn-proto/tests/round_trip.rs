//! Structural-form round-trip tests.
//!
//! The serde form is the persisted/transport representation: a list of
//! `{type, data, text}` components plus the four metadata fields. It
//! must round-trip without loss of ordering, type, data, or metadata.

use serde_json::json;
use thorn_proto::{Component, ComponentKind, Message};

#[test]
fn structural_form_round_trips_exactly() {
    let msg = Message::new([
        Component::text("Hello, world! "),
        Component::pair(ComponentKind::Emoji, "😃"),
        Component::new(ComponentKind::Tag, "314", "Someone"),
        Component::url("https://example.com", "example.com"),
        Component::pair(ComponentKind::Variable, "%ARGS%"),
    ])
    .with_user("alice")
    .with_role(50)
    .with_action(true)
    .with_target(Some("bob".to_string()));

    let encoded = msg.to_json().unwrap();
    let decoded = Message::from_json(&encoded).unwrap();
    assert_eq!(msg, decoded);
}

#[test]
fn structural_form_field_names() {
    let msg = Message::new([
        Component::text("Hello, world! "),
        Component::pair(ComponentKind::Emoji, "😃"),
    ]);

    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(
        value,
        json!({
            "message": [
                {"type": "text", "data": "Hello, world! ", "text": "Hello, world! "},
                {"type": "emoji", "data": "😃", "text": "😃"},
            ],
            "user": "",
            "role": 1,
            "action": false,
            "target": null,
        })
    );
}

#[test]
fn decodes_from_hand_written_structural_form() {
    let decoded: Message = serde_json::from_value(json!({
        "message": [
            {"type": "text", "data": "hi", "text": "hi"},
        ],
        "user": "carol",
        "role": 1,
        "action": false,
        "target": null,
    }))
    .unwrap();

    assert_eq!(decoded.text(), "hi");
    assert_eq!(decoded.user, "carol");
    assert!(!decoded.action);
}
