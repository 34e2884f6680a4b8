//! Offline sources of object types and fields.
//!
//! [`SchemaIntrospection`] supplies default field sets and known types from a
//! precomputed table; [`WordlistProvider`] supplies type names seen in the
//! wild. Both are read-only.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;

/// Shape of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldShape {
    Scalar,
    /// Lookup to another object; selected as `{field}.Id`.
    Reference,
    /// Child relationship; never selected.
    Array,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldShape,
}

/// Known object types and their fields.
pub trait SchemaIntrospection: std::fmt::Debug + Send + Sync {
    fn known_types(&self) -> BTreeSet<String>;

    /// Fields of `sobject` (case-insensitive), `None` when unknown.
    fn describe(&self, sobject: &str) -> Option<Vec<SchemaField>>;
}

/// Type names to try when none are given.
pub trait WordlistProvider: std::fmt::Debug + Send + Sync {
    fn known_type_names(&self) -> Vec<String>;
}

use FieldShape::{Array, Reference, Scalar};

type TableEntry = (&'static str, &'static [(&'static str, FieldShape)]);

const BUILTIN_SCHEMA: &[TableEntry] = &[
    (
        "Account",
        &[
            ("Id", Scalar),
            ("Name", Scalar),
            ("Type", Scalar),
            ("Industry", Scalar),
            ("Phone", Scalar),
            ("Website", Scalar),
            ("BillingCity", Scalar),
            ("BillingCountry", Scalar),
            ("AnnualRevenue", Scalar),
            ("NumberOfEmployees", Scalar),
            ("Description", Scalar),
            ("Owner", Reference),
            ("Parent", Reference),
            ("CreatedBy", Reference),
            ("Contacts", Array),
            ("Opportunities", Array),
        ],
    ),
    (
        "Contact",
        &[
            ("Id", Scalar),
            ("FirstName", Scalar),
            ("LastName", Scalar),
            ("Email", Scalar),
            ("Phone", Scalar),
            ("MobilePhone", Scalar),
            ("Title", Scalar),
            ("MailingCity", Scalar),
            ("Birthdate", Scalar),
            ("Account", Reference),
            ("Owner", Reference),
            ("ReportsTo", Reference),
            ("Cases", Array),
        ],
    ),
    (
        "Lead",
        &[
            ("Id", Scalar),
            ("FirstName", Scalar),
            ("LastName", Scalar),
            ("Company", Scalar),
            ("Email", Scalar),
            ("Phone", Scalar),
            ("Status", Scalar),
            ("LeadSource", Scalar),
            ("IsConverted", Scalar),
            ("Owner", Reference),
        ],
    ),
    (
        "Opportunity",
        &[
            ("Id", Scalar),
            ("Name", Scalar),
            ("StageName", Scalar),
            ("Amount", Scalar),
            ("CloseDate", Scalar),
            ("Probability", Scalar),
            ("IsClosed", Scalar),
            ("IsWon", Scalar),
            ("Account", Reference),
            ("Owner", Reference),
            ("OpportunityLineItems", Array),
        ],
    ),
    (
        "Case",
        &[
            ("Id", Scalar),
            ("CaseNumber", Scalar),
            ("Subject", Scalar),
            ("Description", Scalar),
            ("Status", Scalar),
            ("Priority", Scalar),
            ("Origin", Scalar),
            ("SuppliedEmail", Scalar),
            ("IsClosed", Scalar),
            ("Account", Reference),
            ("Contact", Reference),
            ("Owner", Reference),
            ("CaseComments", Array),
        ],
    ),
    (
        "User",
        &[
            ("Id", Scalar),
            ("Username", Scalar),
            ("FirstName", Scalar),
            ("LastName", Scalar),
            ("Name", Scalar),
            ("Email", Scalar),
            ("Phone", Scalar),
            ("Title", Scalar),
            ("CommunityNickname", Scalar),
            ("IsActive", Scalar),
            ("UserType", Scalar),
            ("Profile", Reference),
            ("UserRole", Reference),
            ("Manager", Reference),
            ("Contact", Reference),
        ],
    ),
    (
        "Task",
        &[
            ("Id", Scalar),
            ("Subject", Scalar),
            ("Status", Scalar),
            ("Priority", Scalar),
            ("ActivityDate", Scalar),
            ("Description", Scalar),
            ("Owner", Reference),
            ("Who", Reference),
            ("What", Reference),
        ],
    ),
    (
        "Event",
        &[
            ("Id", Scalar),
            ("Subject", Scalar),
            ("Location", Scalar),
            ("StartDateTime", Scalar),
            ("EndDateTime", Scalar),
            ("Description", Scalar),
            ("Owner", Reference),
            ("Who", Reference),
            ("What", Reference),
        ],
    ),
    (
        "Campaign",
        &[
            ("Id", Scalar),
            ("Name", Scalar),
            ("Type", Scalar),
            ("Status", Scalar),
            ("StartDate", Scalar),
            ("EndDate", Scalar),
            ("IsActive", Scalar),
            ("Owner", Reference),
            ("CampaignMembers", Array),
        ],
    ),
    (
        "Contract",
        &[
            ("Id", Scalar),
            ("ContractNumber", Scalar),
            ("Status", Scalar),
            ("StartDate", Scalar),
            ("ContractTerm", Scalar),
            ("Account", Reference),
            ("Owner", Reference),
        ],
    ),
    (
        "Order",
        &[
            ("Id", Scalar),
            ("OrderNumber", Scalar),
            ("Status", Scalar),
            ("EffectiveDate", Scalar),
            ("TotalAmount", Scalar),
            ("Account", Reference),
            ("Contract", Reference),
            ("OrderItems", Array),
        ],
    ),
    (
        "Product2",
        &[
            ("Id", Scalar),
            ("Name", Scalar),
            ("ProductCode", Scalar),
            ("Family", Scalar),
            ("Description", Scalar),
            ("IsActive", Scalar),
        ],
    ),
    (
        "Document",
        &[
            ("Id", Scalar),
            ("Name", Scalar),
            ("Type", Scalar),
            ("Url", Scalar),
            ("IsPublic", Scalar),
            ("Folder", Reference),
            ("Author", Reference),
        ],
    ),
    (
        "Attachment",
        &[
            ("Id", Scalar),
            ("Name", Scalar),
            ("ContentType", Scalar),
            ("BodyLength", Scalar),
            ("IsPrivate", Scalar),
            ("Parent", Reference),
            ("Owner", Reference),
        ],
    ),
    (
        "ContentDocument",
        &[
            ("Id", Scalar),
            ("Title", Scalar),
            ("FileType", Scalar),
            ("FileExtension", Scalar),
            ("ContentSize", Scalar),
            ("Owner", Reference),
            ("LatestPublishedVersion", Reference),
        ],
    ),
    (
        "ContentVersion",
        &[
            ("Id", Scalar),
            ("Title", Scalar),
            ("PathOnClient", Scalar),
            ("VersionNumber", Scalar),
            ("FileType", Scalar),
            ("ContentDocument", Reference),
            ("Owner", Reference),
        ],
    ),
    (
        "Note",
        &[
            ("Id", Scalar),
            ("Title", Scalar),
            ("Body", Scalar),
            ("IsPrivate", Scalar),
            ("Parent", Reference),
            ("Owner", Reference),
        ],
    ),
    (
        "ListView",
        &[
            ("Id", Scalar),
            ("Name", Scalar),
            ("DeveloperName", Scalar),
            ("SobjectType", Scalar),
            ("CreatedBy", Reference),
        ],
    ),
    (
        "Profile",
        &[
            ("Id", Scalar),
            ("Name", Scalar),
            ("UserType", Scalar),
            ("Description", Scalar),
        ],
    ),
    (
        "Group",
        &[
            ("Id", Scalar),
            ("Name", Scalar),
            ("DeveloperName", Scalar),
            ("Type", Scalar),
            ("Owner", Reference),
        ],
    ),
];

/// Precomputed schema table.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    types: BTreeMap<String, Vec<SchemaField>>,
}

impl StaticSchema {
    /// Empty schema: every type is unknown.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Common standard objects and their usual fields.
    pub fn builtin() -> Self {
        let types = BUILTIN_SCHEMA
            .iter()
            .map(|(sobject, fields)| {
                let fields = fields
                    .iter()
                    .map(|(name, kind)| SchemaField {
                        name: (*name).to_string(),
                        kind: *kind,
                    })
                    .collect();
                ((*sobject).to_string(), fields)
            })
            .collect();
        Self { types }
    }

    /// Load `{"Type": [{"name": "Field", "kind": "scalar|reference|array"}]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let types: BTreeMap<String, Vec<SchemaField>> = serde_json::from_str(json)?;
        debug!(types = types.len(), "Loaded schema table");
        Ok(Self { types })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl SchemaIntrospection for StaticSchema {
    fn known_types(&self) -> BTreeSet<String> {
        self.types.keys().cloned().collect()
    }

    fn describe(&self, sobject: &str) -> Option<Vec<SchemaField>> {
        self.types
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(sobject))
            .map(|(_, fields)| fields.clone())
    }
}

const BUILTIN_WORDLIST: &[&str] = &[
    "Account",
    "AccountContactRelation",
    "Asset",
    "Attachment",
    "Campaign",
    "CampaignMember",
    "Case",
    "CaseComment",
    "CollaborationGroup",
    "Contact",
    "ContentDocument",
    "ContentDocumentLink",
    "ContentVersion",
    "Contract",
    "Dashboard",
    "Document",
    "EmailMessage",
    "Event",
    "FeedItem",
    "Group",
    "Idea",
    "Knowledge__kav",
    "Lead",
    "ListView",
    "Note",
    "Opportunity",
    "OpportunityLineItem",
    "Order",
    "OrderItem",
    "Pricebook2",
    "Product2",
    "Profile",
    "Quote",
    "Report",
    "Solution",
    "Task",
    "Topic",
    "User",
    "UserRole",
    "WorkOrder",
];

/// Fixed list of type names.
#[derive(Debug, Clone, Default)]
pub struct StaticWordlist {
    names: Vec<String>,
}

impl StaticWordlist {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Object names frequently exposed to guest users.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_WORDLIST.iter().copied())
    }

    /// One name per line; blank lines and `#` comments are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let names: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        info!(count = names.len(), "Loaded type wordlist");
        Self { names }
    }
}

impl WordlistProvider for StaticWordlist {
    fn known_type_names(&self) -> Vec<String> {
        self.names.clone()
    }
}
