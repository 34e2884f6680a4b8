//! # auraprobe
//!
//! Reconnaissance client for Salesforce Aura endpoints: finds the endpoint,
//! authenticates, enumerates records the current user (or guest) can read
//! and tests which fields and objects can be written.
//!
//! ## Crates
//!
//! - **auraprobe-client** - HTTP transport, identifier generator, escaping helpers
//! - **auraprobe-aura** - Aura protocol client, action catalog, error classifier
//! - **auraprobe-api** - Session-authenticated REST and SOAP channels
//! - **auraprobe-records** - Record model, reconciliation engine, write testing
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use auraprobe::scan::{self, ScanOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let report = scan::run(&ScanOptions {
//!         target: "https://community.example.com".to_string(),
//!         types: vec!["Account".to_string()],
//!         ..Default::default()
//!     })
//!     .await?;
//!
//!     for record in &report.records {
//!         println!("{} {:?}", record.sobject_type(), record.id());
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(feature = "api")]
pub use auraprobe_api as api;
#[cfg(feature = "aura")]
pub use auraprobe_aura as aura;
#[cfg(feature = "client")]
pub use auraprobe_client as client;
#[cfg(feature = "records")]
pub use auraprobe_records as records;

#[cfg(feature = "aura")]
pub use auraprobe_aura::{AuraClient, AuraConfig, Credentials};
#[cfg(feature = "client")]
pub use auraprobe_client::TransportConfig;
#[cfg(feature = "records")]
pub use auraprobe_records::{DiscoveryOptions, Record, RecordEngine};

#[cfg(feature = "records")]
pub mod scan;
