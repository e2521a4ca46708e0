use serde_json::{json, Value};

// --- CONSTANTS ---
#[allow(dead_code)]
pub const WABA_ID: &str = "987654321098765";
#[allow(dead_code)]
pub const PHONE_ID: &str = "phone_id_222";
#[allow(dead_code)]
pub const DISPLAY_PHONE: &str = "15550001111";
#[allow(dead_code)]
pub const ACCESS_TOKEN: &str = "EAAD...";
#[allow(dead_code)]
pub const VERIFY_TOKEN: &str = "hub_verify_444";
#[allow(dead_code)]
pub const RECIPIENT_ID: &str = "16505551234";

// --- PAYLOAD BUILDERS ---

/// A message record with the three identifying fields set.
#[allow(dead_code)]
pub fn message(id: &str, kind: &str, content: Value) -> Value {
    let mut message = json!({
        "from": RECIPIENT_ID,
        "id": id,
        "timestamp": "1755291448",
        "type": kind,
    });
    if let (Some(object), Value::Object(content)) = (message.as_object_mut(), content) {
        object.extend(content);
    }
    message
}

/// A `messages` change for the configured phone number.
#[allow(dead_code)]
pub fn change(value: Value) -> Value {
    let mut base = json!({
        "messaging_product": "whatsapp",
        "metadata": {
            "display_phone_number": DISPLAY_PHONE,
            "phone_number_id": PHONE_ID
        },
        "contacts": [{"profile": {"name": "Ana"}, "wa_id": RECIPIENT_ID}],
    });
    if let (Some(object), Value::Object(value)) = (base.as_object_mut(), value) {
        object.extend(value);
    }
    json!({"field": "messages", "value": base})
}

#[allow(dead_code)]
pub fn entry(id: &str, changes: Vec<Value>) -> Value {
    json!({"id": id, "changes": changes})
}

#[allow(dead_code)]
pub fn envelope(entries: Vec<Value>) -> Value {
    json!({"object": "whatsapp_business_account", "entry": entries})
}

/// One entry for the configured account carrying `messages`.
#[allow(dead_code)]
pub fn messages_payload(messages: Vec<Value>) -> Value {
    envelope(vec![entry(
        WABA_ID,
        vec![change(json!({"messages": messages}))],
    )])
}
