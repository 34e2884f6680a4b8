//! End-to-end scan: detect, authenticate, read, then optionally dump and
//! test writes.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use auraprobe_aura::{ActionCatalog, AuraClient, AuraConfig, Credentials, DEFAULT_PATHS};
use auraprobe_client::{ids, ProxyConfig, TransportConfig};
use auraprobe_records::{
    CreatedRecord, DiscoveryOptions, DumpWriter, FieldWriteReport, JsonDumpWriter, Record,
    RecordEngine, StaticSchema, StaticWordlist,
};
use tracing::{debug, error, info, warn};

/// Everything a scan needs, usually built from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub target: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sid: Option<String>,
    pub token: Option<String>,
    /// Endpoint path to try instead of the default candidates.
    pub path: Option<String>,
    pub record_id: Option<String>,
    /// Number of sequential ids tried after `record_id`.
    pub bruteforce: Option<i64>,
    pub types: Vec<String>,
    pub update: bool,
    pub create: bool,
    pub user_agent: Option<String>,
    /// `host:port`
    pub proxy: Option<String>,
    /// Directory records are dumped to.
    pub dump: Option<PathBuf>,
    pub discovery: DiscoveryOptions,
    pub app: Option<String>,
    /// Keep going when no endpoint is detected.
    pub force: bool,
    /// Action catalog JSON replacing the built-in one.
    pub catalog: Option<PathBuf>,
    /// Schema table JSON replacing the built-in one.
    pub schema: Option<PathBuf>,
    /// Newline-separated type names replacing the built-in wordlist.
    pub wordlist: Option<PathBuf>,
}

/// What a scan found.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub aura_path: Option<String>,
    pub authenticated: bool,
    pub records: Vec<Record>,
    pub writes: Vec<FieldWriteReport>,
    pub created: Vec<CreatedRecord>,
    pub dumped: Vec<PathBuf>,
}

/// Run a full scan.
///
/// Fails on an invalid target or proxy, on a missing endpoint (unless
/// forced) and on fatal protocol errors.
pub async fn run(options: &ScanOptions) -> Result<ScanReport> {
    let mut report = ScanReport::default();
    let mut aura = connect(options)?;

    info!(target = %options.target, "Searching for an Aura endpoint");
    report.aura_path = aura.detect(options.path.as_deref()).await;
    match &report.aura_path {
        Some(path) => warn!(path = %path, "Found Aura endpoint"),
        None if options.force => {
            error!("Aura endpoint not found");
            warn!("Continuing anyway (forced)");
            let path = options.path.as_deref().unwrap_or(DEFAULT_PATHS[0]);
            aura.set_aura_path(path);
        }
        None => bail!("Aura endpoint not found on {}", options.target),
    }

    report.authenticated = authenticate(&mut aura, options).await;

    let mut engine = build_engine(aura, options)?;
    let types: Vec<&str> = options.types.iter().map(String::as_str).collect();

    if options.create {
        report.created = engine
            .try_create(&types)
            .await
            .context("record creation testing failed")?;
        info!(count = report.created.len(), "Creatable records");
        let created: Vec<Record> = report.created.iter().map(|c| c.record.clone()).collect();
        report.dumped = dump(options, &created);
        return Ok(report);
    }

    report.records = read_records(&mut engine, options, &types).await?;
    info!(count = report.records.len(), "Records retrieved");
    report.dumped = dump(options, &report.records);

    if options.update {
        report.writes = test_updates(&mut engine, options, &types, &report.records).await?;
    }

    info!(target = %options.target, "End of scan");
    Ok(report)
}

fn connect(options: &ScanOptions) -> Result<AuraClient> {
    let mut transport = TransportConfig::builder();
    if let Some(user_agent) = &options.user_agent {
        transport = transport.with_user_agent(user_agent.clone());
    }
    if let Some(proxy) = &options.proxy {
        let proxy = ProxyConfig::parse(proxy).context("invalid proxy")?;
        transport = transport.with_proxy(proxy);
    }

    let mut config = AuraConfig::builder();
    if let Some(app) = &options.app {
        config = config.with_app(app.clone());
    }
    if let Some(path) = &options.catalog {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read catalog {}", path.display()))?;
        config = config.with_catalog(ActionCatalog::from_json(&json).context("invalid catalog")?);
    }

    AuraClient::new(&options.target, transport.build(), config.build())
        .context("invalid target")
}

/// Log in, or apply explicit credentials. Returns true when a session is
/// expected to be authenticated.
async fn authenticate(aura: &mut AuraClient, options: &ScanOptions) -> bool {
    if let Some(username) = options.username.as_deref().filter(|u| !u.trim().is_empty()) {
        info!("Logging in");
        let password = options.password.as_deref().unwrap_or_default();
        return match aura.login(username, password).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Unable to authenticate with the provided credentials");
                false
            }
        };
    }

    let sid = options.sid.clone().unwrap_or_default();
    let token = options.token.clone().unwrap_or_default();
    if sid.trim().is_empty() && token.trim().is_empty() {
        warn!("Scanning as guest");
        return false;
    }
    let credentials = Credentials::default().with_sid(sid).with_token(token);
    warn!(credentials = ?credentials, "Using explicit credentials");
    aura.update_credentials(credentials);
    true
}

fn build_engine(aura: AuraClient, options: &ScanOptions) -> Result<RecordEngine> {
    let mut builder = RecordEngine::builder(aura).with_options(options.discovery);
    if let Some(path) = &options.schema {
        builder = builder.with_schema(StaticSchema::from_file(path).context("invalid schema")?);
    }
    if let Some(path) = &options.wordlist {
        builder =
            builder.with_wordlist(StaticWordlist::from_file(path).context("invalid wordlist")?);
    }
    Ok(builder.build())
}

async fn read_records(
    engine: &mut RecordEngine,
    options: &ScanOptions,
    types: &[&str],
) -> Result<Vec<Record>> {
    let Some(record_id) = options.record_id.as_deref() else {
        return engine
            .fetch_many(types)
            .await
            .context("record enumeration failed");
    };

    let mut record_ids = vec![record_id.to_string()];
    if let Some(count) = options.bruteforce {
        let generated =
            ids::generate_sequential(record_id, count).context("invalid record id for brute force")?;
        debug!(count = generated.len(), "Generated identifiers");
        record_ids.extend(generated.into_iter().filter(|id| id != record_id));
    }

    let mut records = Vec::new();
    for id in &record_ids {
        if let Some(record) = engine
            .fetch_one(id, types)
            .await
            .with_context(|| format!("cannot retrieve record {id}"))?
        {
            records.push(record);
        }
    }
    Ok(records)
}

async fn test_updates(
    engine: &mut RecordEngine,
    options: &ScanOptions,
    types: &[&str],
    records: &[Record],
) -> Result<Vec<FieldWriteReport>> {
    let mut writes = Vec::new();
    if records.is_empty() {
        match options.record_id.as_deref() {
            Some(record_id) if !types.is_empty() => {
                warn!(record_id, ?types, "Testing fields on an arbitrary record");
                match engine.write_fields_by_type(record_id, types).await {
                    Ok(found) => writes.extend(found),
                    Err(e) if e.is_fatal() => {
                        return Err(e).context("field update testing failed")
                    }
                    Err(e) => error!(error = %e, "Field update testing abandoned"),
                }
            }
            _ => error!("Field update testing needs a record id and types"),
        }
        return Ok(writes);
    }

    warn!("Testing fields on retrieved records");
    for record in records {
        match engine.write_record_fields(record).await {
            Ok(found) => writes.extend(found),
            Err(e) if e.is_fatal() => return Err(e).context("field update testing failed"),
            Err(e) => error!(error = %e, "Field update testing abandoned for a record"),
        }
    }
    Ok(writes)
}

fn dump(options: &ScanOptions, records: &[Record]) -> Vec<PathBuf> {
    let Some(root) = &options.dump else {
        return Vec::new();
    };
    let writer = JsonDumpWriter::new(root);
    records
        .iter()
        .filter_map(|record| match writer.write(record) {
            Ok(path) => Some(path),
            Err(e) => {
                error!(record_id = ?record.id(), error = %e, "Cannot dump record");
                None
            }
        })
        .collect()
}
