//! Captures tracing output for assertions in tests.
//!
//! Lines are recorded without timestamps or ANSI colours, so assertions can
//! match event messages and `key=value` fields directly.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::Level;
use tracing::subscriber::with_default;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::MakeWriter;

/// In-memory sink shared between the subscriber and the caller.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn bytes(&self) -> MutexGuard<'_, Vec<u8>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.bytes())
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `action` under a subscriber recording events at `level` and above.
/// Returns the formatted lines alongside the closure result.
///
/// The subscriber is installed for the current thread only, so tests running
/// in parallel do not see each other's events.
///
/// # Examples
/// ```
/// use asset_pack_cache::test_support::capture_logs;
/// use tracing::Level;
///
/// let (logs, value) = capture_logs(Level::DEBUG, || {
///     tracing::debug!(cache_key = "world-tildxt", "archive cache miss");
///     41 + 1
/// });
/// assert!(logs.iter().any(|line| line.contains("archive cache miss")));
/// assert!(logs.iter().any(|line| line.contains("cache_key=\"world-tildxt\"")));
/// assert_eq!(value, 42);
/// ```
#[must_use]
pub fn capture_logs<F, R>(level: Level, action: F) -> (Vec<String>, R)
where
    F: FnOnce() -> R,
{
    let sink = SharedBuffer::default();
    let subscriber = fmt()
        .with_max_level(level)
        .with_ansi(false)
        .without_time()
        .with_writer(sink.clone())
        .finish();

    let result = with_default(subscriber, action);
    (sink.lines(), result)
}
