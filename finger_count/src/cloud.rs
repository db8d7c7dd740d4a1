//! Wire types for the cloud-vision counting path.
//!
//! The request carries one JPEG frame as base64; the response is a finger
//! count with a confidence and a short gesture description.  Only the
//! message shapes live here, the transport belongs to the caller.

use serde::{Deserialize, Serialize};

use crate::aggregate::DetectionResult;

const DATA_URL_PREFIXES: [&str; 3] = [
    "data:image/png;base64,",
    "data:image/jpeg;base64,",
    "data:image/jpg;base64,",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudCountRequest {
    pub base64_image: String,
}

impl CloudCountRequest {
    /// Accept either raw base64 or a browser-style data URL.
    pub fn from_data_url(s: &str) -> Self {
        let raw = DATA_URL_PREFIXES.iter()
            .find_map(|p| s.strip_prefix(p))
            .unwrap_or(s);
        CloudCountRequest { base64_image: raw.to_string() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudCountResponse {
    /// Extended fingers; `-1` when no hand was seen.
    pub finger_count: i32,
    pub confidence:   Confidence,
    pub description:  String,
}

impl CloudCountResponse {
    pub fn to_detection_result(&self, now_ms: u64) -> DetectionResult {
        match u32::try_from(self.finger_count) {
            Ok(count) => DetectionResult { finger_count: count, is_hand_detected: true, timestamp_ms: now_ms },
            Err(_)    => DetectionResult::no_hand(now_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_data_url_prefix() {
        assert_eq!(CloudCountRequest::from_data_url("data:image/jpeg;base64,QUJD").base64_image, "QUJD");
        assert_eq!(CloudCountRequest::from_data_url("data:image/png;base64,QUJD").base64_image, "QUJD");
        assert_eq!(CloudCountRequest::from_data_url("QUJD").base64_image, "QUJD");
    }

    #[test]
    fn request_field_name() {
        let json = serde_json::to_string(&CloudCountRequest::from_data_url("AA")).unwrap();
        assert_eq!(json, r#"{"base64Image":"AA"}"#);
    }

    #[test]
    fn parses_response() {
        let r: CloudCountResponse = serde_json::from_str(
            r#"{"fingerCount":2,"confidence":"HIGH","description":"Peace sign"}"#,
        ).unwrap();
        assert_eq!(r.confidence, Confidence::High);
        assert_eq!(r.to_detection_result(9), DetectionResult { finger_count: 2, is_hand_detected: true, timestamp_ms: 9 });
    }

    #[test]
    fn minus_one_means_no_hand() {
        let r = CloudCountResponse { finger_count: -1, confidence: Confidence::Low, description: String::new() };
        assert!(!r.to_detection_result(0).is_hand_detected);
    }

    #[test]
    fn unknown_confidence_rejected() {
        let r = serde_json::from_str::<CloudCountResponse>(
            r#"{"fingerCount":1,"confidence":"MAYBE","description":""}"#,
        );
        assert!(r.is_err());
    }
}
