//! Command-line scanner.
//!
//! ```sh
//! auraprobe -t https://community.example.com --types-api --custom --dump
//! auraprobe -t https://community.example.com -u user@example.com -p secret --id 001R00000thl8FIIAY --bruteforce
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use auraprobe::records::DiscoveryOptions;
use auraprobe::scan::{self, ScanOptions};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Enumeration of misconfigurations on Salesforce Aura endpoints.
#[derive(Parser, Debug)]
#[command(name = "auraprobe", author, version, about, long_about = None)]
struct Args {
    /// Target URL
    #[arg(short, long)]
    target: String,

    /// Username (authenticated mode)
    #[arg(short, long)]
    username: Option<String>,

    /// Password (authenticated mode)
    #[arg(short, long)]
    password: Option<String>,

    /// Session id cookie value (instead of username/password)
    #[arg(long)]
    sid: Option<String>,

    /// Aura token (instead of username/password)
    #[arg(long)]
    token: Option<String>,

    /// Probe this endpoint path only
    #[arg(long)]
    path: Option<String>,

    /// Retrieve a specific record by id
    #[arg(long)]
    id: Option<String>,

    /// Also try identifiers following --id
    #[arg(long, requires = "id")]
    bruteforce: bool,

    /// Number of identifiers to try with --bruteforce
    #[arg(long, default_value_t = 10, allow_hyphen_values = true)]
    bruteforce_size: i64,

    /// Only target these object types
    #[arg(long, value_delimiter = ',')]
    types: Vec<String>,

    /// Test field update permissions (writes data to the target)
    #[arg(long)]
    update: bool,

    /// Test record creation permissions (writes data to the target)
    #[arg(long)]
    create: bool,

    /// User-Agent header
    #[arg(long)]
    ua: Option<String>,

    /// HTTP proxy as host:port
    #[arg(long)]
    proxy: Option<String>,

    /// Dump records as JSON files
    #[arg(long)]
    dump: bool,

    /// Dump directory [default: ./output<timestamp>]
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    output: Option<PathBuf>,

    /// Object types from the built-in schema
    #[arg(long)]
    types_introspection: bool,

    /// Object types from the wordlist
    #[arg(long)]
    types_wordlist: bool,

    /// Object types announced by the target
    #[arg(long)]
    types_api: bool,

    /// Only custom object types (*__c)
    #[arg(long)]
    custom: bool,

    /// Aura application name
    #[arg(long)]
    app: Option<String>,

    /// Keep scanning when no endpoint is detected
    #[arg(long)]
    force: bool,

    /// Action catalog JSON file
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    catalog: Option<PathBuf>,

    /// Schema table JSON file
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    schema: Option<PathBuf>,

    /// Object type wordlist file
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    wordlist: Option<PathBuf>,

    /// Debug logging
    #[arg(long)]
    debug: bool,

    /// Trace logging
    #[arg(long)]
    trace: bool,
}

impl Args {
    fn into_options(self) -> ScanOptions {
        let dump = self.dump.then(|| {
            self.output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "./output{}",
                    chrono::Local::now().format("%Y.%m.%d.%H.%M.%S")
                ))
            })
        });
        ScanOptions {
            target: self.target,
            username: self.username,
            password: self.password,
            sid: self.sid,
            token: self.token,
            path: self.path,
            record_id: self.id,
            bruteforce: self.bruteforce.then_some(self.bruteforce_size),
            types: self
                .types
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            update: self.update,
            create: self.create,
            user_agent: self.ua,
            proxy: self.proxy,
            dump,
            discovery: DiscoveryOptions {
                introspection: self.types_introspection,
                wordlist: self.types_wordlist,
                api: self.types_api,
                custom_only: self.custom,
            },
            app: self.app,
            force: self.force,
            catalog: self.catalog,
            schema: self.schema,
            wordlist: self.wordlist,
        }
    }
}

fn init_tracing(debug: bool, trace: bool) {
    let level = if trace {
        "trace"
    } else if debug {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,auraprobe={level},auraprobe_client={level},auraprobe_aura={level},auraprobe_api={level},auraprobe_records={level}"
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.debug, args.trace);

    let options = args.into_options();
    match scan::run(&options).await {
        Ok(report) => {
            info!(
                records = report.records.len(),
                writable = report
                    .writes
                    .iter()
                    .filter(|w| w.outcome == auraprobe::records::WriteOutcome::Writable)
                    .count(),
                created = report.created.len(),
                dumped = report.dumped.len(),
                "Scan summary"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
