//! Process-wide state for long-running modes.
//!
//! Three pieces of shared state:
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)
//! - `SERVER`: HTTP server reference, so the Ctrl+C handler can unblock
//!   the request loop instead of killing the process mid-write.
//! - `SHUTDOWN_CHANNEL`: wakes the watch loop out of its event wait so
//!   it stops without waiting for the next debounce tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam::channel::{Receiver, Sender};
use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal channel for the watch thread
static SHUTDOWN_CHANNEL: OnceLock<(Sender<()>, Receiver<()>)> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on whether a server has been registered:
/// - Before `register_server()`: exit immediately, nothing to unwind
/// - After `register_server()`: graceful shutdown (unblock server, notify
///   the watch loop)
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        request_shutdown();

        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Flip the shutdown flag and wake any thread blocked on the signal
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::SeqCst);
    if let Some((tx, _)) = SHUTDOWN_CHANNEL.get() {
        let _ = tx.send(());
    }
}

/// Receiver end of the shutdown signal, for select loops
pub fn shutdown_signal() -> Receiver<()> {
    SHUTDOWN_CHANNEL
        .get_or_init(crossbeam::channel::unbounded)
        .1
        .clone()
}

/// Register the HTTP server for graceful shutdown
///
/// Call this after binding the server, before entering the request loop
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Check if shutdown has been requested
///
/// Uses Relaxed ordering for performance - worst case is processing
/// a few more items before stopping, which is acceptable
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
