//! Wire messages exchanged with the detection service.
//!
//! Every frame is one JSON envelope: `{"event": "<name>", "data": {...}}`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::sequence::RequestKind;
use super::ProtocolError;
use crate::pose::{LandmarkSet, MeasurementSet};

// --- Client -> service ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectPoseRequest {
    /// JPEG data URL of the sampled frame.
    pub image: String,
    pub confidence_threshold: f32,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateSizeRequest {
    pub measurements: MeasurementSet,
    pub preferred_fit: String,
    /// Absent when no garment has been selected yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clothing_item_id: Option<u64>,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualTryOnRequest {
    pub clothing_item_id: u64,
    pub measurements: MeasurementSet,
    pub opacity: f32,
    /// Frame captured for this request, when the video had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "detect_pose")]
    DetectPose(DetectPoseRequest),
    #[serde(rename = "estimate_size")]
    EstimateSize(EstimateSizeRequest),
    #[serde(rename = "virtual_tryon")]
    VirtualTryOn(VirtualTryOnRequest),
}

impl ClientMessage {
    pub fn kind(&self) -> RequestKind {
        match self {
            ClientMessage::DetectPose(_) => RequestKind::Detect,
            ClientMessage::EstimateSize(_) => RequestKind::Estimate,
            ClientMessage::VirtualTryOn(_) => RequestKind::TryOn,
        }
    }

    pub fn seq(&self) -> u64 {
        match self {
            ClientMessage::DetectPose(r) => r.seq,
            ClientMessage::EstimateSize(r) => r.seq,
            ClientMessage::VirtualTryOn(r) => r.seq,
        }
    }
}

// --- Service -> client ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseDetection {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<LandmarkSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurements: Option<MeasurementSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

impl PoseDetection {
    /// An unsuccessful result, used for malformed payloads and failed sends.
    pub fn failed(seq: Option<u64>) -> Self {
        Self {
            seq,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeEstimation {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TryOnResult {
    pub success: bool,
    /// Composited image as a base64 data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "pose_detected")]
    PoseDetected(PoseDetection),
    #[serde(rename = "size_estimated")]
    SizeEstimated(SizeEstimation),
    #[serde(rename = "tryon_result")]
    TryOnResult(TryOnResult),
}

/// Envelope parsed before the typed body, so a bad body can still be routed.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Serialize a message into a frame body.
pub fn encode_message<T: Serialize>(message: &T) -> Result<Bytes, ProtocolError> {
    Ok(Bytes::from(serde_json::to_vec(message)?))
}

/// Decode a service event.
///
/// A known event with a malformed body decodes to the unsuccessful form of
/// that event, so the session still sees a response. Only an unreadable
/// envelope or an unknown event name is an error.
pub fn decode_event(bytes: &[u8]) -> Result<ServerEvent, ProtocolError> {
    let envelope: RawEnvelope = serde_json::from_slice(bytes)?;
    let seq = envelope.data.get("seq").and_then(Value::as_u64);

    let event = match envelope.event.as_str() {
        "pose_detected" => ServerEvent::PoseDetected(
            serde_json::from_value(envelope.data).unwrap_or_else(|e| {
                log::warn!("Malformed pose_detected payload: {}", e);
                PoseDetection::failed(seq)
            }),
        ),
        "size_estimated" => ServerEvent::SizeEstimated(
            serde_json::from_value(envelope.data).unwrap_or_else(|e| {
                log::warn!("Malformed size_estimated payload: {}", e);
                SizeEstimation {
                    seq,
                    ..SizeEstimation::default()
                }
            }),
        ),
        "tryon_result" => ServerEvent::TryOnResult(
            serde_json::from_value(envelope.data).unwrap_or_else(|e| {
                log::warn!("Malformed tryon_result payload: {}", e);
                TryOnResult {
                    seq,
                    ..TryOnResult::default()
                }
            }),
        ),
        other => return Err(ProtocolError::UnknownEvent(other.to_string())),
    };

    Ok(event)
}

/// Decode a client message. Used by services and test doubles.
pub fn decode_client_message(bytes: &[u8]) -> Result<ClientMessage, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Dimension;
    use serde_json::json;

    #[test]
    fn test_detect_pose_wire_shape() {
        let msg = ClientMessage::DetectPose(DetectPoseRequest {
            image: "data:image/jpeg;base64,AAAA".to_string(),
            confidence_threshold: 0.5,
            seq: 7,
        });
        let value: Value = serde_json::from_slice(&encode_message(&msg).unwrap()).unwrap();
        assert_eq!(value["event"], "detect_pose");
        assert_eq!(value["data"]["confidence_threshold"], 0.5);
        assert_eq!(value["data"]["seq"], 7);
    }

    #[test]
    fn test_estimate_size_omits_missing_garment() {
        let msg = ClientMessage::EstimateSize(EstimateSizeRequest {
            measurements: MeasurementSet::new().with(Dimension::ShoulderWidth, 120.4),
            preferred_fit: "regular".to_string(),
            clothing_item_id: None,
            seq: 1,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["event"], "estimate_size");
        assert_eq!(value["data"]["measurements"]["shoulder_width"], 120.4);
        assert!(value["data"].get("clothing_item_id").is_none());
    }

    #[test]
    fn test_virtual_tryon_event_name() {
        let msg = ClientMessage::VirtualTryOn(VirtualTryOnRequest {
            clothing_item_id: 4,
            measurements: MeasurementSet::new(),
            opacity: 0.8,
            image: None,
            seq: 2,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["event"], "virtual_tryon");
        assert_eq!(msg.kind(), RequestKind::TryOn);
        assert_eq!(msg.seq(), 2);
    }

    #[test]
    fn test_decode_pose_detected() {
        let bytes = serde_json::to_vec(&json!({
            "event": "pose_detected",
            "data": {
                "success": true,
                "landmarks": [{"x": 0.5, "y": 0.5, "z": 0.0, "visibility": 0.9}],
                "measurements": {"shoulder_width": 120.4}
            }
        }))
        .unwrap();
        match decode_event(&bytes).unwrap() {
            ServerEvent::PoseDetected(p) => {
                assert!(p.success);
                assert_eq!(p.landmarks.unwrap().len(), 1);
                assert_eq!(p.seq, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_malformed_pose_body_decodes_as_failure() {
        let bytes = br#"{"event":"pose_detected","data":{"success":"yes","seq":9}}"#;
        assert_eq!(
            decode_event(bytes).unwrap(),
            ServerEvent::PoseDetected(PoseDetection::failed(Some(9)))
        );
    }

    #[test]
    fn test_missing_body_decodes_as_failure() {
        let bytes = br#"{"event":"tryon_result"}"#;
        assert_eq!(
            decode_event(bytes).unwrap(),
            ServerEvent::TryOnResult(TryOnResult::default())
        );
    }

    #[test]
    fn test_unknown_event_is_error() {
        let bytes = br#"{"event":"hello","data":{}}"#;
        assert!(matches!(
            decode_event(bytes),
            Err(ProtocolError::UnknownEvent(name)) if name == "hello"
        ));
    }

    #[test]
    fn test_garbage_is_json_error() {
        assert!(matches!(decode_event(b"not json"), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_server_event_serializes_to_envelope() {
        let event = ServerEvent::SizeEstimated(SizeEstimation {
            success: true,
            predicted_size: Some("M".to_string()),
            confidence: Some(0.9),
            seq: Some(3),
        });
        let bytes = encode_message(&event).unwrap();
        assert_eq!(decode_event(&bytes).unwrap(), event);
    }
}
