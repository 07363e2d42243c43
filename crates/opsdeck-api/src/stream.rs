//! Server-sent event stream with auto-reconnect.
//!
//! Connects to the backend's smart-home SSE endpoint and streams parsed
//! events through a [`tokio::sync::broadcast`] channel. Handles
//! reconnection with exponential backoff + jitter automatically.
//!
//! # Example
//!
//! ```rust,ignore
//! use opsdeck_api::stream::{SseHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let handle = SseHandle::connect(url, http, ReconnectConfig::default(), cancel.clone());
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{event:?}");
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Broadcast channel capacity ───────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

// ── StreamEvent ──────────────────────────────────────────────────────

/// A decoded event from the smart-home SSE stream.
///
/// The only kind the console inspects is `state_changed`; everything else
/// is passed through unchanged so downstream consumers can grow without
/// adapter changes.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// An entity's effective state changed. `attributes` is the opaque
    /// attribute map, carried verbatim.
    StateChanged {
        entity_id: String,
        state: String,
        attributes: Value,
    },
    /// Any event type the console does not recognize.
    Unknown { event_type: String, payload: Value },
}

/// Decode one SSE `data:` payload into an event.
///
/// Returns `None` for payloads that are not JSON objects — the stream
/// occasionally carries keep-alive comments that the parser already drops,
/// but a defective frame should never kill the connection.
pub fn decode_event(payload: &str) -> Option<StreamEvent> {
    let value: Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse SSE payload");
            return None;
        }
    };

    let event_type = value.get("type")?.as_str()?.to_owned();

    if event_type == "state_changed" {
        let entity_id = value.get("entity_id")?.as_str()?.to_owned();
        let state = value
            .get("state")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let attributes = value.get("attributes").cloned().unwrap_or(Value::Null);
        Some(StreamEvent::StateChanged {
            entity_id,
            state,
            attributes,
        })
    } else {
        Some(StreamEvent::Unknown {
            event_type,
            payload: value,
        })
    }
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for stream reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── SseHandle ────────────────────────────────────────────────────────

/// Handle to a running SSE subscription.
///
/// The background task owns the socket; consumers read decoded events
/// from the broadcast channel. Call [`shutdown`](Self::shutdown) to
/// terminate the channel and cancel pending reconnect attempts.
pub struct SseHandle {
    event_rx: broadcast::Receiver<Arc<StreamEvent>>,
    cancel: CancellationToken,
}

impl SseHandle {
    /// Spawn the subscription loop. Returns immediately; the first
    /// connection attempt happens asynchronously.
    pub fn connect(
        url: Url,
        http: reqwest::Client,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            sse_loop(url, http, event_tx, reconnect, task_cancel).await;
        });

        Self { event_rx, cancel }
    }

    /// Get a new broadcast receiver for the event stream.
    ///
    /// If a consumer falls behind, it receives
    /// [`broadcast::error::RecvError::Lagged`] — acceptable, since every
    /// consumer must tolerate missed events anyway (the fallback poll
    /// restores full state).
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<StreamEvent>> {
        self.event_rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn sse_loop(
    url: Url,
    http: reqwest::Client,
    event_tx: broadcast::Sender<Arc<StreamEvent>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = connect_and_read(&url, &http, &event_tx, &cancel) => {
                match result {
                    // Clean end of stream. Reset the counter and reconnect.
                    Ok(()) => {
                        tracing::info!("SSE stream ended cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "SSE stream error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "SSE reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = delay.as_millis() as u64,
                            attempt,
                            "Waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }

    #[allow(unreachable_code)]
    {
        tracing::debug!("SSE loop exiting");
    }
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one SSE response and read frames until the stream drops.
async fn connect_and_read(
    url: &Url,
    http: &reqwest::Client,
    event_tx: &broadcast::Sender<Arc<StreamEvent>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "Connecting to SSE stream");

    let resp = http
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| Error::StreamConnect(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::StreamConnect(format!("HTTP {status}")));
    }

    tracing::info!("SSE stream connected");

    let mut body = resp.bytes_stream();
    let mut parser = SseParser::default();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            chunk = body.next() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        for payload in parser.feed(&bytes) {
                            if let Some(event) = decode_event(&payload) {
                                // Ignore send errors -- just means no active
                                // subscribers right now.
                                let _ = event_tx.send(Arc::new(event));
                            }
                        }
                    }
                    Some(Err(e)) => {
                        return Err(Error::StreamConnect(e.to_string()));
                    }
                    None => {
                        // Server closed the response body.
                        tracing::info!("SSE stream ended");
                        return Ok(());
                    }
                }
            }
        }
    }
}

// ── SSE framing ──────────────────────────────────────────────────────

/// Incremental parser for the SSE wire format.
///
/// Accumulates `data:` lines until a blank line dispatches the message.
/// `event:`/`id:`/`retry:` fields and comment lines are ignored — every
/// payload on this stream is a self-describing JSON object.
#[derive(Debug, Default)]
struct SseParser {
    line_buf: String,
    data_lines: Vec<String>,
}

impl SseParser {
    /// Feed raw bytes; returns the complete `data` payloads they finished.
    fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut completed = Vec::new();

        self.line_buf.push_str(&String::from_utf8_lossy(bytes));

        while let Some(pos) = self.line_buf.find('\n') {
            let line: String = self.line_buf.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data_lines.is_empty() {
                    completed.push(self.data_lines.join("\n"));
                    self.data_lines.clear();
                }
            } else if let Some(data) = line.strip_prefix("data:") {
                self.data_lines.push(data.strip_prefix(' ').unwrap_or(data).to_owned());
            }
            // Other fields and ":" comments are dropped.
        }

        completed
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(attempt as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    // Not cryptographically random, but good enough for backoff spread.
    let jitter_factor = 1.0 + 0.25 * ((attempt as f64 * 7.3).sin());
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);

        // Each step should roughly double (within jitter bounds)
        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d10 = calculate_backoff(10, &config);
        // With jitter factor up to 1.25, max effective is 12.5s
        assert!(
            d10 <= Duration::from_secs(13),
            "delay at attempt 10 ({d10:?}) should be capped near max_delay"
        );
    }

    #[test]
    fn decode_state_changed_event() {
        let payload = r#"{
            "type": "state_changed",
            "entity_id": "sensor.living_room_temp",
            "state": "22.4",
            "attributes": { "unit_of_measurement": "°C" }
        }"#;

        let event = decode_event(payload).unwrap();
        match event {
            StreamEvent::StateChanged {
                entity_id,
                state,
                attributes,
            } => {
                assert_eq!(entity_id, "sensor.living_room_temp");
                assert_eq!(state, "22.4");
                assert_eq!(attributes["unit_of_measurement"], "°C");
            }
            other => panic!("expected StateChanged, got {other:?}"),
        }
    }

    #[test]
    fn decode_unknown_event_passes_through() {
        let payload = r#"{"type": "automation_triggered", "automation_id": "morning"}"#;

        let event = decode_event(payload).unwrap();
        match event {
            StreamEvent::Unknown {
                event_type,
                payload,
            } => {
                assert_eq!(event_type, "automation_triggered");
                assert_eq!(payload["automation_id"], "morning");
            }
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn decode_malformed_payload_is_dropped() {
        assert!(decode_event("not json at all").is_none());
        assert!(decode_event(r#"{"no_type": true}"#).is_none());
    }

    #[test]
    fn parser_dispatches_on_blank_line() {
        let mut parser = SseParser::default();

        let out = parser.feed(b"data: {\"type\":\"state_changed\"}\n");
        assert!(out.is_empty(), "no dispatch before the blank line");

        let out = parser.feed(b"\n");
        assert_eq!(out, vec![r#"{"type":"state_changed"}"#.to_owned()]);
    }

    #[test]
    fn parser_handles_split_chunks() {
        let mut parser = SseParser::default();

        assert!(parser.feed(b"data: {\"ty").is_empty());
        assert!(parser.feed(b"pe\":\"x\"}\n").is_empty());
        let out = parser.feed(b"\n");
        assert_eq!(out, vec![r#"{"type":"x"}"#.to_owned()]);
    }

    #[test]
    fn parser_joins_multi_line_data() {
        let mut parser = SseParser::default();

        let out = parser.feed(b"data: line-one\ndata: line-two\n\n");
        assert_eq!(out, vec!["line-one\nline-two".to_owned()]);
    }

    #[test]
    fn parser_ignores_comments_and_other_fields() {
        let mut parser = SseParser::default();

        let out = parser.feed(b": keep-alive\nevent: ping\nid: 42\n\n");
        assert!(out.is_empty());

        let out = parser.feed(b"data: payload\n\n");
        assert_eq!(out, vec!["payload".to_owned()]);
    }

    #[test]
    fn parser_tolerates_crlf_line_endings() {
        let mut parser = SseParser::default();

        let out = parser.feed(b"data: payload\r\n\r\n");
        assert_eq!(out, vec!["payload".to_owned()]);
    }
}
