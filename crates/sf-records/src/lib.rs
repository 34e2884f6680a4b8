//! # auraprobe-records
//!
//! Record retrieval, type discovery and write testing against an Aura
//! endpoint, reconciled with the REST and SOAP channels when a session id
//! is available.
//!
//! The same logical record is usually reachable through several
//! descriptors and channels, each returning a partial view. The
//! [`RecordEngine`] collects those views per record id and merges them into
//! one [`Record`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use auraprobe_records::{DiscoveryOptions, JsonDumpWriter, DumpWriter, RecordEngine};
//!
//! let mut engine = RecordEngine::builder(aura)
//!     .with_options(DiscoveryOptions { api: true, custom_only: true, ..Default::default() })
//!     .build();
//!
//! let records = engine.fetch_many(&[]).await?;
//! JsonDumpWriter::new("./output").write_all(&records)?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod cache;
mod dump;
mod engine;
mod error;
pub mod fake;
mod item;
mod record;
mod sources;

pub use cache::{FieldCache, UnsupportedRegistry};
pub use dump::{DumpWriter, JsonDumpWriter};
pub use engine::{
    CreatedRecord, DiscoveryOptions, FieldWriteReport, RecordEngine, RecordEngineBuilder,
    WriteOutcome, LIST_VIEW_TYPE,
};
pub use error::{Error, ErrorKind, Result};
pub use item::{ItemBag, ItemKey, QUERY_REST_SOURCE, SOAP_SOURCE, SOBJECTS_REST_SOURCE};
pub use record::{Field, FieldKind, FieldValue, Record, ID_FIELD, TYPE_FIELD};
pub use sources::{
    FieldShape, SchemaField, SchemaIntrospection, StaticSchema, StaticWordlist, WordlistProvider,
};
