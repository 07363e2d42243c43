//! `opsdeck-api` — async client for the opsdeck infrastructure backend.
//!
//! Two surfaces:
//! - [`HubClient`]: typed REST access to `/api/infrastructure/...`
//! - [`stream::SseHandle`]: the smart-home server-sent event subscription
//!   with automatic reconnect.
//!
//! The crate deals in wire shapes only. Policy (error surfacing, retry,
//! snapshot management) belongs to `opsdeck-core`.

pub mod client;
pub mod error;
pub mod stream;
pub mod transport;
pub mod types;

pub use client::HubClient;
pub use error::Error;
pub use stream::{ReconnectConfig, SseHandle, StreamEvent};
pub use transport::TransportConfig;
