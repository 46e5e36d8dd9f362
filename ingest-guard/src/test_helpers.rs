//! Test helpers for checks that touch the network, and for asserting on logs.

use crate::cache::UrlFetcher;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A [`UrlFetcher`] that answers from a fixed table and counts calls.
///
/// Clones share the call counter, so a test can keep one clone while the
/// cache owns another.
#[derive(Debug, Clone)]
pub struct RecordingFetcher {
    responses: HashMap<String, Result<u16, String>>,
    fallback: Result<u16, String>,
    calls: Arc<AtomicUsize>,
}

impl RecordingFetcher {
    /// Every URL returns `code`.
    pub fn always(code: u16) -> Self {
        Self {
            responses: HashMap::new(),
            fallback: Ok(code),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every URL fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            fallback: Err(message.to_string()),
            ..Self::always(0)
        }
    }

    /// Answers `url` with `code` instead of the fallback.
    pub fn with_response(mut self, url: &str, code: u16) -> Self {
        self.responses.insert(url.to_string(), Ok(code));
        self
    }

    /// Number of fetches performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UrlFetcher for RecordingFetcher {
    fn fetch_status(&self, url: &str) -> Result<u16, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Runs `f` under a thread-local subscriber at TRACE and returns what it logged.
pub fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}
