//! Vision dispatcher: owns the worker pool, balances frames
//! round-robin, aggregates status.
//!
//! Workers are separate OS processes (`fieldhouse vision --worker-id N`)
//! listening on loopback; the dispatcher keeps one connection and one
//! bounded job queue per worker. A worker's queue preserves submission
//! order; when every queue is full the dispatcher rejects with
//! `Backpressure` instead of buffering without bound.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::VisionError;

use super::protocol::{read_message, write_message, InferenceOptions, Request, Response, WorkerStats};
use super::worker::Worker;

/// Frames queued per worker before the dispatcher pushes back.
const QUEUE_DEPTH: usize = 8;

/// Grace period for a worker process to exit after the shutdown
/// handshake before it is killed.
const REAP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct VisionPoolConfig {
    /// Worker count; defaults to the CPU count.
    pub workers: usize,
    /// First loopback port; worker N listens on `base_port + N`.
    /// Zero lets each worker pick an ephemeral port, reported back on
    /// its ready line.
    pub base_port: u16,
    pub model_path: Option<PathBuf>,
    /// Binary to spawn worker processes from; defaults to the current
    /// executable.
    pub worker_command: Option<PathBuf>,
}

impl Default for VisionPoolConfig {
    fn default() -> Self {
        VisionPoolConfig {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            base_port: 0,
            model_path: None,
            worker_command: None,
        }
    }
}

struct Job {
    request: Request,
    reply: oneshot::Sender<Result<Response, VisionError>>,
}

/// What actually runs the worker: its own OS process (production), or
/// an in-runtime task for harnesses that inject a custom detector.
enum WorkerBackend {
    Process { child: Child },
    Task { serve_task: JoinHandle<()> },
}

struct WorkerHandle {
    id: usize,
    queue: mpsc::Sender<Job>,
    io_task: JoinHandle<()>,
    backend: WorkerBackend,
}

pub struct Dispatcher {
    workers: Vec<WorkerHandle>,
    next: AtomicUsize,
}

impl Dispatcher {
    /// Spawn the pool: N worker processes, each with its own listener,
    /// plus an IO task pumping that worker's queue over its connection.
    ///
    /// Each child binds its port, prints a one-line JSON ready report
    /// on stdout, and then serves until the shutdown command.
    pub async fn spawn(config: VisionPoolConfig) -> Result<Self, VisionError> {
        let count = config.workers.max(1);
        let binary = match &config.worker_command {
            Some(path) => path.clone(),
            None => std::env::current_exe()?,
        };

        let mut workers = Vec::with_capacity(count);
        for id in 0..count {
            let port = if config.base_port == 0 {
                0
            } else {
                config.base_port + id as u16
            };

            let mut command = Command::new(&binary);
            command
                .arg("vision")
                .arg("--worker-id")
                .arg(id.to_string())
                .arg("--port")
                .arg(port.to_string())
                .stdout(Stdio::piped())
                .kill_on_drop(true);
            if let Some(model) = &config.model_path {
                command.arg("--model").arg(model);
            }

            let mut child = command.spawn()?;
            let stdout = child.stdout.take().ok_or_else(|| VisionError::Protocol {
                reason: format!("worker {id} spawned without stdout"),
            })?;
            let ready = BufReader::new(stdout)
                .lines()
                .next_line()
                .await?
                .ok_or_else(|| VisionError::Protocol {
                    reason: format!("worker {id} exited before reporting ready"),
                })?;
            let ready: serde_json::Value =
                serde_json::from_str(&ready).map_err(|e| VisionError::Protocol {
                    reason: format!("worker {id} ready line: {e}"),
                })?;
            let port = ready["port"]
                .as_u64()
                .ok_or_else(|| VisionError::Protocol {
                    reason: format!("worker {id} ready line missing port"),
                })? as u16;

            let addr = SocketAddr::from(([127, 0, 0, 1], port));
            info!(worker_id = id, %addr, pid = ?child.id(), "vision worker process attached");
            workers.push(attach_worker(id, addr, WorkerBackend::Process { child }).await?);
        }

        Ok(Dispatcher {
            workers,
            next: AtomicUsize::new(0),
        })
    }

    /// Spawn with a custom worker factory, running each worker as a
    /// task inside this process. The wire protocol is identical; this
    /// exists for injected detector backends and tests, not for the
    /// production pool.
    pub async fn spawn_with<F>(config: VisionPoolConfig, factory: F) -> Result<Self, VisionError>
    where
        F: Fn(usize) -> Worker,
    {
        let count = config.workers.max(1);
        let mut workers = Vec::with_capacity(count);

        for id in 0..count {
            let port = if config.base_port == 0 {
                0
            } else {
                config.base_port + id as u16
            };
            let listener = TcpListener::bind(("127.0.0.1", port)).await?;
            let addr = listener.local_addr()?;

            let worker = factory(id);
            let serve_task = tokio::spawn(async move {
                if let Err(err) = worker.serve(listener).await {
                    error!(worker_id = id, error = %err, "worker serve loop failed");
                }
            });

            info!(worker_id = id, %addr, "vision worker task attached");
            workers.push(attach_worker(id, addr, WorkerBackend::Task { serve_task }).await?);
        }

        Ok(Dispatcher {
            workers,
            next: AtomicUsize::new(0),
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Submit one frame. Round-robin from the cursor; a full queue
    /// falls through to the next worker, and a full pool rejects.
    pub async fn dispatch(
        &self,
        frame_data: String,
        options: InferenceOptions,
    ) -> Result<Response, VisionError> {
        let start = self.next.fetch_add(1, Ordering::Relaxed);
        let n = self.workers.len();

        for offset in 0..n {
            let worker = &self.workers[(start + offset) % n];
            let (reply_tx, reply_rx) = oneshot::channel();
            let job = Job {
                request: Request::Inference {
                    frame_data: frame_data.clone(),
                    options: options.clone(),
                },
                reply: reply_tx,
            };
            match worker.queue.try_send(job) {
                Ok(()) => {
                    return reply_rx.await.map_err(|_| VisionError::WorkerGone {
                        worker_id: worker.id,
                    })?;
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(worker_id = worker.id, "queue full, trying next worker");
                    continue;
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    return Err(VisionError::WorkerGone { worker_id: worker.id });
                }
            }
        }

        Err(VisionError::Backpressure)
    }

    /// Aggregate every worker's counters.
    pub async fn status(&self) -> Vec<WorkerStats> {
        let mut all = Vec::with_capacity(self.workers.len());
        for worker in &self.workers {
            let (reply_tx, reply_rx) = oneshot::channel();
            let job = Job {
                request: Request::Status,
                reply: reply_tx,
            };
            if worker.queue.send(job).await.is_err() {
                continue;
            }
            if let Ok(Ok(response)) = reply_rx.await {
                if let Some(stats) = response.stats {
                    all.push(stats);
                }
            }
        }
        all
    }

    /// Stop every worker: in-flight frames finish, sockets close,
    /// processes exit and are reaped (killed only if the handshake
    /// never got through).
    pub async fn shutdown(self) -> Result<(), VisionError> {
        for worker in &self.workers {
            let (reply_tx, reply_rx) = oneshot::channel();
            let job = Job {
                request: Request::Shutdown,
                reply: reply_tx,
            };
            if worker.queue.send(job).await.is_ok() {
                let _ = reply_rx.await;
            }
        }
        for worker in self.workers {
            drop(worker.queue);
            let _ = worker.io_task.await;
            match worker.backend {
                WorkerBackend::Task { serve_task } => {
                    let _ = serve_task.await;
                }
                WorkerBackend::Process { mut child } => {
                    if tokio::time::timeout(REAP_TIMEOUT, child.wait()).await.is_err() {
                        error!(worker_id = worker.id, "worker ignored shutdown, killing");
                        let _ = child.start_kill();
                        let _ = child.wait().await;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Connect to a worker's listener and start the IO task that pumps its
/// bounded queue over the connection, in order.
async fn attach_worker(
    id: usize,
    addr: SocketAddr,
    backend: WorkerBackend,
) -> Result<WorkerHandle, VisionError> {
    let stream = TcpStream::connect(addr).await?;
    let (tx, rx) = mpsc::channel::<Job>(QUEUE_DEPTH);
    let io_task = tokio::spawn(pump_worker(id, stream, rx));

    Ok(WorkerHandle {
        id,
        queue: tx,
        io_task,
        backend,
    })
}

/// Serialize jobs for one worker over its connection, in order.
async fn pump_worker(worker_id: usize, mut stream: TcpStream, mut jobs: mpsc::Receiver<Job>) {
    while let Some(job) = jobs.recv().await {
        let shutting_down = matches!(job.request, Request::Shutdown);
        let result = async {
            write_message(&mut stream, &job.request).await?;
            match read_message::<_, Response>(&mut stream).await? {
                Some(response) => Ok(response),
                None => Err(VisionError::WorkerGone { worker_id }),
            }
        }
        .await;

        let failed = result.is_err();
        let _ = job.reply.send(result);
        if shutting_down || failed {
            break;
        }
    }
}
