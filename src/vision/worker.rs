//! Vision worker: per-frame detection with a latency contract.
//!
//! Single-threaded: one connection served at a time, frames answered in
//! submission order. In production each worker runs in its own OS
//! process (`fieldhouse vision --worker-id N`). Model-load failure
//! degrades the worker permanently to the functional fallback (logged
//! once); per-frame failures return a zero-detection frame with the
//! error embedded and the worker stays alive.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::RgbImage;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::error::VisionError;

use super::detector::{load_primary, Detector, FallbackDetector};
use super::protocol::{
    read_message, write_message, Detection, DetectionFrame, InferenceOptions, Request, Response,
    SportAnalysis, VisionSport, WorkerStats,
};
use super::CHAMPIONSHIP_LATENCY_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Initializing,
    Ready,
    Processing,
    Degraded,
    ShuttingDown,
    Terminated,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Initializing => "initializing",
            WorkerState::Ready => "ready",
            WorkerState::Processing => "processing",
            WorkerState::Degraded => "degraded",
            WorkerState::ShuttingDown => "shutting_down",
            WorkerState::Terminated => "terminated",
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    frames_processed: u64,
    frame_errors: u64,
    total_latency_ms: f64,
    peak_latency_ms: f64,
    compliant_frames: u64,
}

pub struct Worker {
    id: usize,
    detector: Box<dyn Detector>,
    state: WorkerState,
    counters: Counters,
}

impl Worker {
    /// Build the worker, degrading to the fallback when the primary
    /// detector cannot be loaded. The degraded transition is logged
    /// exactly once, here.
    pub fn new(id: usize, model_path: Option<PathBuf>) -> Self {
        let detector: Box<dyn Detector> = match load_primary(model_path.as_deref()) {
            Ok(primary) => primary,
            Err(err) => {
                // initializing -> degraded -> ready; logged once, the
                // fallback then owns this worker for its lifetime
                warn!(worker_id = id, error = %err, "primary detector unavailable, running fallback");
                Box::new(FallbackDetector)
            }
        };
        info!(worker_id = id, detector = detector.kind(), "vision worker up");

        Worker {
            id,
            detector,
            state: WorkerState::Ready,
            counters: Counters::default(),
        }
    }

    /// Inject a detector directly (real backends, tests).
    pub fn with_detector(id: usize, detector: Box<dyn Detector>) -> Self {
        Worker {
            id,
            detector,
            state: WorkerState::Ready,
            counters: Counters::default(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Run one frame through decode -> detect -> filter -> analyze.
    /// Always returns a frame: a decode failure yields an empty
    /// detection set with the elapsed latency and `error` set, and the
    /// worker stays alive.
    pub fn infer(&mut self, frame_data: &str, options: &InferenceOptions) -> DetectionFrame {
        let started = std::time::Instant::now();
        let busy_state = self.state;
        self.state = WorkerState::Processing;

        let frame = match decode_frame(frame_data) {
            Ok(image) => {
                let raw = self.detector.detect(&image);
                let threshold = options
                    .confidence_threshold
                    .unwrap_or_else(|| options.sport.default_confidence());
                let whitelist = options.sport.class_whitelist();
                let detections: Vec<Detection> = raw
                    .into_iter()
                    .filter(|d| d.confidence >= threshold)
                    .filter(|d| whitelist.contains(&d.class.as_str()))
                    .collect();

                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                let compliant = latency_ms <= CHAMPIONSHIP_LATENCY_MS;
                self.counters.frames_processed += 1;
                self.counters.total_latency_ms += latency_ms;
                if latency_ms > self.counters.peak_latency_ms {
                    self.counters.peak_latency_ms = latency_ms;
                }
                if compliant {
                    self.counters.compliant_frames += 1;
                } else {
                    debug!(worker_id = self.id, latency_ms, "frame missed championship budget");
                }

                let analysis = analyze(options.sport, &detections);
                DetectionFrame {
                    timestamp_ms: epoch_ms(),
                    worker_id: self.id,
                    sport: options.sport,
                    detections,
                    latency_ms,
                    championship_compliant: compliant,
                    detector: self.detector.kind().to_string(),
                    analysis,
                    error: None,
                }
            }
            Err(err) => {
                self.counters.frame_errors += 1;
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                DetectionFrame {
                    timestamp_ms: epoch_ms(),
                    worker_id: self.id,
                    sport: options.sport,
                    detections: Vec::new(),
                    latency_ms,
                    championship_compliant: latency_ms <= CHAMPIONSHIP_LATENCY_MS,
                    detector: self.detector.kind().to_string(),
                    analysis: analyze(options.sport, &[]),
                    error: Some(err.to_string()),
                }
            }
        };

        self.state = busy_state;
        frame
    }

    pub fn stats(&self) -> WorkerStats {
        let frames = self.counters.frames_processed;
        WorkerStats {
            worker_id: self.id,
            state: self.state.as_str().to_string(),
            detector: self.detector.kind().to_string(),
            frames_processed: frames,
            frame_errors: self.counters.frame_errors,
            average_latency_ms: if frames > 0 {
                self.counters.total_latency_ms / frames as f64
            } else {
                0.0
            },
            peak_latency_ms: self.counters.peak_latency_ms,
            compliant_frames: self.counters.compliant_frames,
            compliance_rate: if frames > 0 {
                self.counters.compliant_frames as f64 / frames as f64
            } else {
                0.0
            },
        }
    }

    /// Serve the request/response loop until a shutdown command. One
    /// client connection at a time; in-flight frames finish before the
    /// socket closes.
    pub async fn serve(mut self, listener: TcpListener) -> Result<(), VisionError> {
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!(worker_id = self.id, %peer, "client connected");
            if self.handle_client(stream).await? {
                self.state = WorkerState::Terminated;
                info!(worker_id = self.id, "vision worker terminated");
                return Ok(());
            }
        }
    }

    /// Returns true when a shutdown command ended the session.
    async fn handle_client(&mut self, mut stream: TcpStream) -> Result<bool, VisionError> {
        loop {
            let request: Option<Request> = read_message(&mut stream).await?;
            let Some(request) = request else {
                return Ok(false); // client went away; accept the next one
            };

            let started = std::time::Instant::now();
            let response = match request {
                Request::Inference { frame_data, options } => {
                    let frame = self.infer(&frame_data, &options);
                    let error = frame.error.clone();
                    Response {
                        worker_id: self.id,
                        success: error.is_none(),
                        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                        frame: Some(frame),
                        stats: None,
                        error,
                    }
                }
                Request::Status => Response {
                    worker_id: self.id,
                    success: true,
                    processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                    frame: None,
                    stats: Some(self.stats()),
                    error: None,
                },
                Request::Shutdown => {
                    self.state = WorkerState::ShuttingDown;
                    let response = Response {
                        worker_id: self.id,
                        success: true,
                        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                        frame: None,
                        stats: None,
                        error: None,
                    };
                    write_message(&mut stream, &response).await?;
                    return Ok(true);
                }
            };

            write_message(&mut stream, &response).await?;
        }
    }
}

/// Decode raw image bytes (base64) or a base64 data-URL into RGB pixels.
fn decode_frame(frame_data: &str) -> Result<RgbImage, VisionError> {
    let trimmed = frame_data.trim();
    if trimmed.is_empty() {
        return Err(VisionError::FrameDecode {
            reason: "empty frame".to_string(),
        });
    }

    let encoded = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| VisionError::FrameDecode {
                reason: "data URL without payload".to_string(),
            })?,
        None => trimmed,
    };

    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| VisionError::FrameDecode {
            reason: format!("base64: {e}"),
        })?;

    let image = image::load_from_memory(&bytes).map_err(|e| VisionError::FrameDecode {
        reason: e.to_string(),
    })?;
    Ok(image.to_rgb8())
}

/// Sport-specific post-analysis (formation heuristics, ball-in-play,
/// player count).
fn analyze(sport: VisionSport, detections: &[Detection]) -> SportAnalysis {
    let player_count = detections.iter().filter(|d| d.class == "person").count();
    let ball_in_play = detections.iter().any(|d| d.class == "sports ball");

    match sport {
        VisionSport::Football => SportAnalysis {
            player_count,
            ball_in_play,
            formation: Some(
                if player_count >= 7 {
                    "i_formation"
                } else if player_count >= 5 {
                    "spread"
                } else {
                    "partial"
                }
                .to_string(),
            ),
            bat_detected: None,
        },
        VisionSport::Baseball => SportAnalysis {
            player_count,
            ball_in_play,
            formation: None,
            bat_detected: Some(detections.iter().any(|d| d.class == "baseball bat")),
        },
        VisionSport::Basketball => SportAnalysis {
            player_count,
            ball_in_play,
            formation: Some(
                if player_count >= 5 { "half_court" } else { "transition" }.to_string(),
            ),
            bat_detected: None,
        },
    }
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::io::Cursor;

    pub(crate) fn png_frame_base64(width: u32, height: u32) -> String {
        let mut img = RgbImage::from_pixel(width, height, Rgb([40, 160, 60]));
        for y in 60..180u32.min(height) {
            for x in 60..140u32.min(width) {
                img.put_pixel(x, y, Rgb([25, 25, 30]));
            }
        }
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        BASE64.encode(&bytes)
    }

    #[test]
    fn test_infer_produces_compliant_flag_and_counters() {
        let mut worker = Worker::with_detector(0, Box::new(FallbackDetector));
        let frame = worker.infer(&png_frame_base64(320, 240), &InferenceOptions::default());

        assert_eq!(frame.worker_id, 0);
        assert!(frame.error.is_none());
        assert_eq!(frame.championship_compliant, frame.latency_ms <= 33.0);
        assert_eq!(frame.detector, "fallback");
        assert!(frame.detections.iter().all(|d| {
            d.class == "person" || d.class == "sports ball"
        }));

        let stats = worker.stats();
        assert_eq!(stats.frames_processed, 1);
        assert!(stats.average_latency_ms > 0.0);
    }

    #[test]
    fn test_decode_accepts_data_url() {
        let data_url = format!("data:image/png;base64,{}", png_frame_base64(96, 96));
        assert!(decode_frame(&data_url).is_ok());
    }

    #[test]
    fn test_decode_failure_yields_empty_frame_with_latency() {
        let mut worker = Worker::with_detector(3, Box::new(FallbackDetector));
        let frame = worker.infer("definitely-not-base64!!!", &InferenceOptions::default());

        // still a frame-shaped result: no detections, elapsed latency,
        // error embedded
        assert!(frame.error.is_some());
        assert!(frame.detections.is_empty());
        assert!(frame.latency_ms >= 0.0);
        assert_eq!(frame.championship_compliant, frame.latency_ms <= 33.0);
        assert_eq!(frame.analysis.player_count, 0);

        assert_eq!(worker.stats().frame_errors, 1);
        assert_eq!(worker.state(), WorkerState::Ready);

        // still serves good frames afterwards
        let good = worker.infer(&png_frame_base64(128, 128), &InferenceOptions::default());
        assert!(good.error.is_none());
    }

    #[test]
    fn test_unloadable_model_degrades_to_fallback() {
        let worker = Worker::new(7, Some(PathBuf::from("/missing/weights.onnx")));
        assert_eq!(worker.state(), WorkerState::Ready);
        assert_eq!(worker.stats().detector, "fallback");
    }

    #[test]
    fn test_baseball_whitelist_admits_bat() {
        let mut worker = Worker::with_detector(1, Box::new(FallbackDetector));
        let options = InferenceOptions {
            sport: VisionSport::Baseball,
            confidence_threshold: Some(0.0),
            championship_level: true,
        };
        let frame = worker.infer(&png_frame_base64(320, 240), &options);
        assert!(frame.analysis.bat_detected.is_some());
        assert!(frame.analysis.formation.is_none());
    }

    #[test]
    fn test_confidence_threshold_filters() {
        let mut worker = Worker::with_detector(2, Box::new(FallbackDetector));
        let strict = InferenceOptions {
            sport: VisionSport::Football,
            confidence_threshold: Some(1.1),
            championship_level: true,
        };
        let frame = worker.infer(&png_frame_base64(320, 240), &strict);
        assert!(frame.detections.is_empty());
        assert_eq!(frame.analysis.player_count, 0);
    }
}
