//! `vision` subcommand: bring up the worker-process pool and serve
//! until interrupted, push synthetic frames through it and report the
//! latency distribution, or (with `--worker-id`) run as one worker
//! process for the dispatcher.

use std::io::{Cursor, Write};
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{Rgb, RgbImage};
use tokio::net::TcpListener;

use crate::error::{Result, VisionError};
use crate::vision::{Dispatcher, InferenceOptions, VisionPoolConfig, Worker, CHAMPIONSHIP_LATENCY_MS};

use super::{shutdown_signal, EXIT_OK, EXIT_STAGE_FAILED};

pub struct VisionParams {
    pub workers: Option<usize>,
    pub port: u16,
    pub model: Option<PathBuf>,
    pub bench_frames: Option<usize>,
    pub worker_id: Option<usize>,
}

pub async fn handle_vision(params: VisionParams) -> Result<i32> {
    if let Some(worker_id) = params.worker_id {
        return serve_worker_process(worker_id, params.port, params.model).await;
    }

    let mut config = VisionPoolConfig {
        base_port: params.port,
        model_path: params.model,
        ..VisionPoolConfig::default()
    };
    if let Some(workers) = params.workers {
        config.workers = workers;
    }

    let dispatcher = Dispatcher::spawn(config).await?;
    println!("Vision pool up: {} worker processes", dispatcher.worker_count());

    if let Some(frames) = params.bench_frames {
        let code = run_bench(&dispatcher, frames).await;
        dispatcher.shutdown().await?;
        return Ok(code);
    }

    println!("Serving; SIGINT or SIGTERM to stop.");
    shutdown_signal().await;

    print_status(&dispatcher).await;
    dispatcher.shutdown().await?;
    println!("Vision pool stopped.");
    Ok(EXIT_OK)
}

/// Worker-process mode: bind the loopback port, report it on stdout
/// (the dispatcher reads this line), then serve until the shutdown
/// command arrives over the socket.
async fn serve_worker_process(
    worker_id: usize,
    port: u16,
    model: Option<PathBuf>,
) -> Result<i32> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .map_err(VisionError::from)?;
    let addr = listener.local_addr().map_err(VisionError::from)?;

    println!(
        "{}",
        serde_json::json!({ "worker_id": worker_id, "port": addr.port() })
    );
    // stdout is piped to the dispatcher, so the ready line must flush
    std::io::stdout().flush().map_err(VisionError::from)?;

    let worker = Worker::new(worker_id, model);
    worker.serve(listener).await?;
    Ok(EXIT_OK)
}

/// Push synthetic frames through the pool and report the per-frame
/// latency histogram plus the championship compliance rate.
async fn run_bench(dispatcher: &Dispatcher, frames: usize) -> i32 {
    let frame = synthetic_frame();
    let mut latencies: Vec<f64> = Vec::with_capacity(frames);
    let mut failures = 0usize;

    for i in 0..frames {
        match dispatcher
            .dispatch(frame.clone(), InferenceOptions::default())
            .await
        {
            // error frames still carry their elapsed latency and count
            // toward the histogram
            Ok(response) => match response.frame {
                Some(frame) => {
                    latencies.push(frame.latency_ms);
                    if frame.error.is_some() {
                        failures += 1;
                    }
                }
                None => failures += 1,
            },
            Err(err) => {
                eprintln!("frame {i}: {err}");
                failures += 1;
            }
        }
    }

    if latencies.is_empty() {
        println!("No frames completed.");
        return EXIT_STAGE_FAILED;
    }

    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let buckets = [
        ("<= 10 ms", 10.0),
        ("<= 20 ms", 20.0),
        ("<= 33 ms", CHAMPIONSHIP_LATENCY_MS),
        ("<= 100 ms", 100.0),
        ("> 100 ms", f64::INFINITY),
    ];
    println!("\nLatency histogram over {} frames:", latencies.len());
    let mut lower = 0.0;
    for (label, upper) in buckets {
        let count = latencies.iter().filter(|l| **l > lower && **l <= upper).count();
        println!("  {:<10} {:>6}", label, count);
        lower = upper;
    }

    let compliant = latencies
        .iter()
        .filter(|l| **l <= CHAMPIONSHIP_LATENCY_MS)
        .count();
    let p50 = latencies[latencies.len() / 2];
    let p99 = latencies[(latencies.len() * 99 / 100).min(latencies.len() - 1)];
    println!(
        "p50 {:.2} ms, p99 {:.2} ms, compliance {:.1}% ({} failures)",
        p50,
        p99,
        100.0 * compliant as f64 / latencies.len() as f64,
        failures
    );

    print_status(dispatcher).await;
    if failures == 0 { EXIT_OK } else { EXIT_STAGE_FAILED }
}

async fn print_status(dispatcher: &Dispatcher) {
    println!("\nWorker status:");
    for stats in dispatcher.status().await {
        println!(
            "  worker {:<2} [{}] {} frames, avg {:.2} ms, peak {:.2} ms, compliance {:.1}%, {} errors ({})",
            stats.worker_id,
            stats.state,
            stats.frames_processed,
            stats.average_latency_ms,
            stats.peak_latency_ms,
            stats.compliance_rate * 100.0,
            stats.frame_errors,
            stats.detector,
        );
    }
}

/// A 640x360 practice-field frame: turf, a few dark figures, a bright
/// ball. Deterministic, so bench runs are comparable.
fn synthetic_frame() -> String {
    let mut img = RgbImage::from_pixel(640, 360, Rgb([52, 148, 66]));
    let figures = [(120u32, 180u32), (280, 140), (420, 210), (540, 120)];
    for (cx, cy) in figures {
        for y in cy.saturating_sub(40)..(cy + 40).min(360) {
            for x in cx.saturating_sub(15)..(cx + 15).min(640) {
                img.put_pixel(x, y, Rgb([30, 28, 35]));
            }
        }
    }
    for y in 60..76u32 {
        for x in 312..328u32 {
            img.put_pixel(x, y, Rgb([240, 235, 220]));
        }
    }

    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("png encode of synthetic frame");
    BASE64.encode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_frame_decodes() {
        let encoded = synthetic_frame();
        let bytes = BASE64.decode(encoded.as_bytes()).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), 640);
        assert_eq!(img.height(), 360);
    }
}
