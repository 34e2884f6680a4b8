//! # auraprobe-client
//!
//! HTTP transport for probing Aura endpoints.
//!
//! This crate provides the plumbing everything else sits on:
//! - A cookie-persisting transport that never follows redirects
//! - Permissive TLS and optional HTTP proxy routing
//! - A status-0 sentinel response instead of I/O errors
//! - Bounded retry budgets for the protocol layer
//! - Record identifier checksums and sequential candidate generation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Protocol Layer                           │
//! │  (auraprobe-aura, auraprobe-api, auraprobe-records)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    HttpTransport                            │
//! │  - Base URL + shared cookie jar                             │
//! │  - get / post returning HttpResponse (status 0 on failure)  │
//! │  - recreate / with_base_url keep the jar                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    reqwest::Client                          │
//! │  - No redirects, invalid certs accepted, proxy, timeouts    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use auraprobe_client::{ContentType, HttpTransport, TransportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), auraprobe_client::Error> {
//!     let transport = HttpTransport::new("https://target.example.com", TransportConfig::default())?;
//!
//!     let response = transport
//!         .post("/s/sfsites/aura", "", ContentType::Form, &[])
//!         .await;
//!
//!     if response.is_transport_failure() {
//!         eprintln!("target unreachable");
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
pub mod ids;
mod request;
mod response;
mod retry;
pub mod security;

pub use client::HttpTransport;
pub use config::{ProxyConfig, TransportConfig, TransportConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::ContentType;
pub use response::HttpResponse;
pub use retry::RetryBudget;

/// Default User-Agent: a desktop Chrome build, so requests blend in with browser traffic.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";
