//! Wire protocol for the worker transport: 4-byte big-endian length
//! header followed by a JSON document, over any byte stream that
//! preserves ordering.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::VisionError;

/// Upper bound on a single frame message; a 4K RGBA frame base64-encoded
/// stays well under this.
const MAX_MESSAGE_BYTES: u32 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisionSport {
    Football,
    Baseball,
    Basketball,
}

impl Default for VisionSport {
    fn default() -> Self {
        VisionSport::Football
    }
}

impl VisionSport {
    /// COCO classes surfaced for this sport.
    pub fn class_whitelist(&self) -> &'static [&'static str] {
        match self {
            VisionSport::Football | VisionSport::Basketball => &["person", "sports ball"],
            VisionSport::Baseball => &["person", "sports ball", "baseball bat"],
        }
    }

    /// Detector confidence floor applied when the request does not set
    /// its own threshold.
    pub fn default_confidence(&self) -> f64 {
        match self {
            VisionSport::Baseball => 0.8,
            VisionSport::Football | VisionSport::Basketball => 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceOptions {
    #[serde(default)]
    pub sport: VisionSport,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    #[serde(default = "default_true")]
    pub championship_level: bool,
}

fn default_true() -> bool {
    true
}

impl Default for InferenceOptions {
    fn default() -> Self {
        InferenceOptions {
            sport: VisionSport::default(),
            confidence_threshold: None,
            championship_level: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    Inference {
        /// Raw image bytes base64-encoded, or a `data:image/...;base64,`
        /// URL.
        frame_data: String,
        #[serde(default)]
        options: InferenceOptions,
    },
    Status,
    Shutdown,
}

/// One detected object. `bbox` is `[x1, y1, x2, y2]` in frame pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    pub confidence: f64,
    pub bbox: [f64; 4],
    pub class_id: u32,
}

/// Sport-specific post-analysis over a frame's detections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportAnalysis {
    pub player_count: usize,
    pub ball_in_play: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bat_detected: Option<bool>,
}

/// Per-frame inference result. Every frame produces one of these, even
/// on failure: a decode error comes back with empty detections, the
/// elapsed latency, and `error` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionFrame {
    pub timestamp_ms: u64,
    pub worker_id: usize,
    pub sport: VisionSport,
    pub detections: Vec<Detection>,
    pub latency_ms: f64,
    pub championship_compliant: bool,
    /// `model` or `fallback`; fallback boxes are heuristics, not ML
    /// predictions, and consumers must not treat them as such.
    pub detector: String,
    pub analysis: SportAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStats {
    pub worker_id: usize,
    pub state: String,
    pub detector: String,
    pub frames_processed: u64,
    pub frame_errors: u64,
    pub average_latency_ms: f64,
    pub peak_latency_ms: f64,
    pub compliant_frames: u64,
    pub compliance_rate: f64,
}

/// Every response carries the worker id, a success flag, and the
/// server-side processing time; the payload field depends on the
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub worker_id: usize,
    pub success: bool,
    pub processing_time_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<DetectionFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<WorkerStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Write one length-prefixed JSON message.
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<(), VisionError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(message).map_err(|e| VisionError::Protocol {
        reason: e.to_string(),
    })?;
    let len = u32::try_from(body.len()).map_err(|_| VisionError::Protocol {
        reason: "message too large".to_string(),
    })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed JSON message. `Ok(None)` on a clean EOF at
/// a message boundary.
pub async fn read_message<R, T>(reader: &mut R) -> Result<Option<T>, VisionError>
where
    R: AsyncRead + Unpin,
    T: serde::de::DeserializeOwned,
{
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(header);
    if len > MAX_MESSAGE_BYTES {
        return Err(VisionError::Protocol {
            reason: format!("frame of {len} bytes exceeds limit"),
        });
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    let message = serde_json::from_slice(&body).map_err(|e| VisionError::Protocol {
        reason: e.to_string(),
    })?;
    Ok(Some(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_message_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(1024 * 1024);

        let request = Request::Inference {
            frame_data: "AAAA".to_string(),
            options: InferenceOptions {
                sport: VisionSport::Baseball,
                confidence_threshold: Some(0.5),
                championship_level: true,
            },
        };
        write_message(&mut client, &request).await.unwrap();

        let received: Request = read_message(&mut server).await.unwrap().unwrap();
        match received {
            Request::Inference { frame_data, options } => {
                assert_eq!(frame_data, "AAAA");
                assert_eq!(options.sport, VisionSport::Baseball);
                assert_eq!(options.confidence_threshold, Some(0.5));
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_header_is_big_endian_length() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        write_message(&mut client, &Request::Status).await.unwrap();

        let mut header = [0u8; 4];
        tokio::io::AsyncReadExt::read_exact(&mut server, &mut header)
            .await
            .unwrap();
        let len = u32::from_be_bytes(header) as usize;
        let mut body = vec![0u8; len];
        tokio::io::AsyncReadExt::read_exact(&mut server, &mut body)
            .await
            .unwrap();
        assert_eq!(serde_json::from_slice::<serde_json::Value>(&body).unwrap()["command"], "status");
    }

    #[tokio::test]
    async fn test_clean_eof_is_none() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        let got: Option<Request> = read_message(&mut server).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_oversized_header_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut client, &u32::MAX.to_be_bytes())
            .await
            .unwrap();
        let result: Result<Option<Request>, _> = read_message(&mut server).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_sport_whitelists() {
        assert!(VisionSport::Baseball.class_whitelist().contains(&"baseball bat"));
        assert!(!VisionSport::Football.class_whitelist().contains(&"baseball bat"));
    }

    #[test]
    fn test_options_default_from_empty_json() {
        let options: InferenceOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.sport, VisionSport::Football);
        assert!(options.championship_level);
        assert!(options.confidence_threshold.is_none());
    }
}
