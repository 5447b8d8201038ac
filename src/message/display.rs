//! Structured (YAML/JSON) rendering of a message, for logging and the demo
//! binaries. Adapted from the teacher's per-message-type `display.rs`: since
//! this crate's IE tree is generic rather than per-field, the structured form
//! walks [`Ie`] recursively instead of naming each accessor.

use crate::ie::{Ie, IeBody, IeType};
use crate::message::Message;
use serde_json::Value as JsonValue;
use serde_yaml_ng::Value as YamlValue;
use std::collections::BTreeMap;

/// Renders a message as a structured tree for diagnostics.
pub trait MessageDisplay {
    fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error>;
    fn to_json_pretty(&self) -> Result<String, serde_json::Error>;
}

impl MessageDisplay for Message {
    fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(&to_yaml_value(self))
    }

    fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&to_json_value(self))
    }
}

fn to_yaml_value(msg: &Message) -> YamlValue {
    let mut map = BTreeMap::new();
    map.insert("message_type".to_string(), YamlValue::String(msg.msg_name()));
    map.insert("sequence".to_string(), YamlValue::Number((msg.sequence() as u64).into()));
    if let Some(seid) = msg.seid() {
        map.insert("seid".to_string(), YamlValue::String(format!("0x{seid:016x}")));
    }
    map.insert(
        "information_elements".to_string(),
        YamlValue::Sequence(msg.ies.iter().map(ie_to_yaml).collect()),
    );
    YamlValue::Mapping(map.into_iter().map(|(k, v)| (YamlValue::String(k), v)).collect())
}

fn ie_to_yaml(ie: &Ie) -> YamlValue {
    let mut map = BTreeMap::new();
    map.insert("type".to_string(), YamlValue::String(ie_name(ie.ie_type)));
    match &ie.body {
        IeBody::Leaf(bytes) => {
            map.insert("payload_hex".to_string(), YamlValue::String(hex(bytes)));
        }
        IeBody::Group(children) => {
            map.insert(
                "children".to_string(),
                YamlValue::Sequence(children.iter().map(ie_to_yaml).collect()),
            );
        }
    }
    YamlValue::Mapping(map.into_iter().map(|(k, v)| (YamlValue::String(k), v)).collect())
}

fn to_json_value(msg: &Message) -> JsonValue {
    let mut map = serde_json::Map::new();
    map.insert("message_type".to_string(), JsonValue::String(msg.msg_name()));
    map.insert("sequence".to_string(), JsonValue::Number(msg.sequence().into()));
    if let Some(seid) = msg.seid() {
        map.insert("seid".to_string(), JsonValue::String(format!("0x{seid:016x}")));
    }
    map.insert(
        "information_elements".to_string(),
        JsonValue::Array(msg.ies.iter().map(ie_to_json).collect()),
    );
    JsonValue::Object(map)
}

fn ie_to_json(ie: &Ie) -> JsonValue {
    let mut map = serde_json::Map::new();
    map.insert("type".to_string(), JsonValue::String(ie_name(ie.ie_type)));
    match &ie.body {
        IeBody::Leaf(bytes) => {
            map.insert("payload_hex".to_string(), JsonValue::String(hex(bytes)));
        }
        IeBody::Group(children) => {
            map.insert("children".to_string(), JsonValue::Array(children.iter().map(ie_to_json).collect()));
        }
    }
    JsonValue::Object(map)
}

fn ie_name(ie_type: IeType) -> String {
    format!("{ie_type:?}")
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ie::{Ie, IeType};
    use crate::message::MsgType;

    #[test]
    fn yaml_includes_message_type_and_ies() {
        let msg = Message::new(MsgType::HeartbeatRequest, 1, vec![Ie::new(IeType::RecoveryTimeStamp, vec![1, 2, 3, 4])]);
        let yaml = msg.to_yaml().unwrap();
        assert!(yaml.contains("HeartbeatRequest"));
        assert!(yaml.contains("RecoveryTimeStamp"));
    }

    #[test]
    fn json_pretty_round_trips_as_valid_json() {
        let msg = Message::new_with_seid(MsgType::SessionDeletionRequest, 0xabcd, 2, vec![]);
        let json = msg.to_json_pretty().unwrap();
        let value: JsonValue = serde_json::from_str(&json).unwrap();
        assert_eq!(value["message_type"], "SessionDeletionRequest");
    }

    #[test]
    fn group_ies_render_nested_children() {
        let group = Ie::new_grouped(IeType::CreatePdr, vec![Ie::new(IeType::PdrId, vec![0, 1])]);
        let msg = Message::new(MsgType::SessionEstablishmentRequest, 1, vec![group]);
        let json = msg.to_json_pretty().unwrap();
        assert!(json.contains("\"children\""));
    }
}
