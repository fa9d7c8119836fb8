use std::time::Instant;

use tracing::debug;

/// Runs store or file work inline on the UI thread and logs how long the
/// window was held up.
pub fn run_blocking<F, T>(label: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let started = Instant::now();
    let out = f();
    debug!(task = label, elapsed_ms = started.elapsed().as_millis() as u64, "blocking task finished");
    out
}
