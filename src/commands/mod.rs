//! Command handlers behind the CLI.

pub mod run;
pub mod vision_serve;


/// Process exit codes: 0 all stages ok, 1 a stage
/// failed, 2 fatal configuration error.
pub const EXIT_OK: i32 = 0;
pub const EXIT_STAGE_FAILED: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;

/// Resolve when SIGINT or SIGTERM arrives (Ctrl-C only on platforms
/// without SIGTERM).
pub(crate) async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
