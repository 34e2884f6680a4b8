//! # auraprobe-aura
//!
//! Client for the Aura RPC protocol served by Salesforce communities and
//! Lightning sites.
//!
//! ## Features
//!
//! - Endpoint detection over a list of candidate paths
//! - Request envelopes built from action templates and the session context
//! - Framework resync and application-name rotation, both bounded
//! - Username/password login with cross-host redirect handling
//! - Pure classifiers for error bodies (unknown field, unsupported type, ...)
//!
//! ## Example
//!
//! ```rust,ignore
//! use auraprobe_aura::{AuraClient, AuraConfig, Operation};
//! use auraprobe_client::TransportConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), auraprobe_aura::Error> {
//!     let mut client = AuraClient::new(
//!         "https://community.example.com",
//!         TransportConfig::default(),
//!         AuraConfig::default(),
//!     )?;
//!
//!     if client.detect(None).await.is_none() {
//!         return Ok(());
//!     }
//!
//!     let mut action = client.catalog().first(Operation::GetRecordInfo).unwrap();
//!     action.fill("objectApiName", "Account");
//!     let response = client.send(&action).await?;
//!     println!("success: {}", response.is_success());
//!     Ok(())
//! }
//! ```

mod catalog;
pub mod classifier;
mod client;
mod config;
mod credentials;
mod envelope;
mod error;
mod response;
mod session;

pub use catalog::{ActionCatalog, ActionTemplate, Operation};
pub use client::AuraClient;
pub use config::{
    AuraConfig, AuraConfigBuilder, DEFAULT_APP_CANDIDATES, DEFAULT_DETECTION_PATTERN,
    DEFAULT_PATHS,
};
pub use credentials::Credentials;
pub use error::{Error, ErrorKind, Result};
pub use response::{
    Action, ActionState, AuraResponse, Context, Event, EventAttributes, GlobalValueProvider,
};
pub use session::{SessionContext, CONTEXT_MODE, INITIAL_FWUID};
