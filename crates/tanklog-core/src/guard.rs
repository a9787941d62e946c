//! Best-effort duplicate-request suppression.
//!
//! The OCR upload endpoint is expensive, so mutations through the record
//! client are checked against a small in-memory map of recently sent
//! request signatures. The guard is advisory only: it is per-process, not
//! persisted, and two requests issued close enough together can both pass
//! the check before either timestamp is recorded.

use std::collections::HashMap;

use serde_json::Value;

/// Requests with an identical signature within this window are rejected.
pub const DEDUP_WINDOW_MS: i64 = 2_000;
/// Entries older than this are purged opportunistically on each check.
pub const CLEANUP_WINDOW_MS: i64 = 5_000;

/// Signature for an outgoing mutable request.
///
/// Multipart bodies collapse to a single constant per endpoint: all uploads
/// to the same endpoint are treated as identical regardless of image
/// content. JSON bodies use their serialized form.
pub fn request_signature(endpoint: &str, json_body: Option<&Value>) -> String {
    match json_body {
        Some(body) => format!("{endpoint}:{body}"),
        None => format!("{endpoint}:multipart"),
    }
}

/// Tracks recently sent request signatures with an injected clock.
///
/// `now_ms` is supplied by the caller so the window logic stays a pure map
/// operation that tests can drive with fabricated timestamps.
#[derive(Debug, Default)]
pub struct RequestCoalescer {
    sent: HashMap<String, i64>,
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a request with `signature` may be sent at `now_ms`.
    ///
    /// Records the timestamp when sending is allowed, so at most one
    /// in-flight entry exists per signature within the dedup window.
    pub fn should_send(&mut self, signature: &str, now_ms: i64) -> bool {
        self.sent
            .retain(|_, sent_at| now_ms - *sent_at < CLEANUP_WINDOW_MS);

        if let Some(sent_at) = self.sent.get(signature) {
            if now_ms - sent_at < DEDUP_WINDOW_MS {
                tracing::warn!(signature, "suppressing duplicate request");
                return false;
            }
        }

        self.sent.insert(signature.to_string(), now_ms);
        true
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.sent.len()
    }
}
