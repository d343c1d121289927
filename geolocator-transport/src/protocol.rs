use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use geolocator_logic::{NativeEvent, prelude::*};

/// Event name for a new position pushed by the peer
pub const POSITION_CHANGE_EVENT: &str = "position_change";
/// Event name for an asynchronous failure on the peer
pub const ERROR_EVENT: &str = "error";

/// Frames the bridge sends to the native peer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeFrame {
    Invoke {
        id: u64,
        method: String,
        #[serde(default)]
        args: Value,
    },
}

/// Frames the native peer sends to the bridge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerFrame {
    /// Result of the call with the same id
    Reply { id: u64, result: Value },
    /// The peer could not carry out the call with the same id
    Failed { id: u64, message: String },
    /// Push notification not tied to a call
    Event {
        name: String,
        #[serde(default)]
        data: Value,
    },
}

impl PeerFrame {
    pub fn position_change(data: Value) -> Self {
        Self::Event {
            name: POSITION_CHANGE_EVENT.to_string(),
            data,
        }
    }

    pub fn error(data: Value) -> Self {
        Self::Event {
            name: ERROR_EVENT.to_string(),
            data,
        }
    }
}

/// Map a pushed event to what the bridge understands, `None` for unknown names
pub fn native_event(name: &str, data: Value) -> Option<NativeEvent> {
    match name {
        POSITION_CHANGE_EVENT => Some(NativeEvent::PositionChange(data)),
        ERROR_EVENT => Some(NativeEvent::Error(data)),
        _ => None,
    }
}

/// Encode a frame as a single line of JSON, newline included
pub fn encode_line<T: Serialize>(frame: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(frame).context("Failed to serialize frame")?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T> {
    serde_json::from_str(line.trim_end()).context("Failed to deserialize frame")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invoke_frame_shape() {
        let frame = BridgeFrame::Invoke {
            id: 7,
            method: "get_permission_status".to_string(),
            args: json!({}),
        };
        let bytes = encode_line(&frame).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));
        assert_eq!(
            serde_json::from_slice::<Value>(&bytes).unwrap(),
            json!({
                "type": "invoke",
                "id": 7,
                "method": "get_permission_status",
                "args": {},
            })
        );
    }

    #[test]
    fn peer_frames_decode() {
        let reply: PeerFrame = decode_line(r#"{"type":"reply","id":3,"result":true}"#).unwrap();
        assert_eq!(
            reply,
            PeerFrame::Reply {
                id: 3,
                result: json!(true)
            }
        );

        let failed: PeerFrame =
            decode_line("{\"type\":\"failed\",\"id\":4,\"message\":\"nope\"}\n").unwrap();
        assert!(matches!(failed, PeerFrame::Failed { id: 4, .. }));

        let event: PeerFrame = decode_line(r#"{"type":"event","name":"error"}"#).unwrap();
        assert_eq!(event, PeerFrame::error(Value::Null));
    }

    #[test]
    fn event_names() {
        assert_eq!(
            native_event("position_change", json!({"latitude": 1.0})),
            Some(NativeEvent::PositionChange(json!({"latitude": 1.0})))
        );
        assert_eq!(
            native_event("error", json!("boom")),
            Some(NativeEvent::Error(json!("boom")))
        );
        assert_eq!(native_event("heading_change", Value::Null), None);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_line::<PeerFrame>("not json").is_err());
        assert!(decode_line::<PeerFrame>(r#"{"type":"reply"}"#).is_err());
    }
}
