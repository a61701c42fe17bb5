use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use tracing::{error, warn};

/// Raises `shutdown` on the first SIGINT/SIGTERM so the loop stops after the running task;
/// a second signal exits immediately.
pub fn signal_handler(shutdown: &Arc<AtomicBool>) {
    let shutdown = shutdown.clone();
    thread::spawn(move || {
        let mut signals = match Signals::new([SIGINT, SIGTERM]) {
            Ok(signals) => signals,
            Err(err) => {
                error!("signal handler setup failed: {}", err);
                return;
            }
        };
        for signal in signals.forever() {
            if shutdown.swap(true, Ordering::SeqCst) {
                warn!("received signal {} again; exiting now", signal);
                std::process::exit(1);
            }
            warn!("received signal {}; stopping after the current task", signal);
        }
    });
}
