//! # auraprobe-api
//!
//! Session-authenticated data channels that complement the Aura endpoint.
//!
//! - REST: object list, record by id, describe, query and recently viewed items
//! - SOAP: `SELECT Id` queries parsed with `quick-xml`
//!
//! Every REST call degrades to "no result" on an unreadable response so
//! that one failing channel never stops the others.
//!
//! ## Example
//!
//! ```rust,ignore
//! use auraprobe_api::ApiClient;
//! use auraprobe_client::TransportConfig;
//!
//! let api = ApiClient::connect("https://target.example.com", TransportConfig::default())?
//!     .with_sid(sid);
//!
//! for record in api.query_records("Contact").await {
//!     println!("{:?}", record.get("Id"));
//! }
//! ```

mod client;
mod error;
pub mod soap;
mod types;

pub use client::ApiClient;
pub use error::{Error, ErrorKind, Result};
pub use types::{textual_record, RestRecord, API_VERSION};
