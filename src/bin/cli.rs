//! kvport CLI
//!
//! Export a store prefix to a JSON snapshot, import a snapshot back, or show
//! cluster status.

use clap::{Args, Parser, Subcommand};
use kvport::config::resolve_snapshot_path;
use kvport::export::normalize_limit;
use kvport::network::TcpStoreClient;
use kvport::{status, Config, Exporter, Importer, StoreClient};
use tracing_subscriber::{fmt, EnvFilter};

/// kvport CLI
#[derive(Parser, Debug)]
#[command(name = "kvport")]
#[command(about = "Export, import and inspect a key-value store using JSON snapshots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every subcommand
#[derive(Args, Debug)]
struct Common {
    /// Store endpoints: ip:port,ip:port,ip:port
    #[arg(short = 'i', long)]
    endpoint: String,

    /// Snapshot file; {time} is replaced with the current time
    #[arg(short, long, default_value = "load.json")]
    file: String,

    /// Dial timeout in milliseconds
    #[arg(long, default_value = "5000")]
    dial_timeout_ms: u64,

    /// Request timeout in milliseconds
    #[arg(long, default_value = "5000")]
    request_timeout_ms: u64,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export data from the store and save it as a JSON file
    Export {
        #[command(flatten)]
        common: Common,

        /// Export key prefix, must start with /
        #[arg(short, long, default_value = "/")]
        prefix: String,

        /// Max records to export, 0 or negative for all
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        limit: i64,

        /// Records requested per range read
        #[arg(long, default_value = "1000")]
        page_size: u64,
    },

    /// Import a JSON file into the store
    Import {
        #[command(flatten)]
        common: Common,
    },

    /// Show store cluster status
    Status {
        #[command(flatten)]
        common: Common,
    },
}

impl Commands {
    fn common(&self) -> &Common {
        match self {
            Commands::Export { common, .. } | Commands::Import { common } | Commands::Status { common } => common,
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> kvport::Result<()> {
    let common = command.common();
    let config = Config::builder()
        .endpoints(&common.endpoint)?
        .dial_timeout_ms(common.dial_timeout_ms)
        .request_timeout_ms(common.request_timeout_ms)
        .snapshot_path(&common.file)
        .build();

    tracing::info!("Endpoints: {:?}", config.endpoints);
    let client = TcpStoreClient::connect(&config)?;

    let result = match &command {
        Commands::Export {
            prefix,
            limit,
            page_size,
            ..
        } => {
            let path = resolve_snapshot_path(&common.file, chrono::Local::now());
            Exporter::new(*page_size)
                .export(&client, prefix, normalize_limit(*limit), &path)
                .map(|_| ())
        }
        Commands::Import { .. } => Importer::new()
            .import(&client, &config.snapshot_path)
            .map(|_| ()),
        Commands::Status { .. } => show_status(&client),
    };

    client.close();
    result
}

fn show_status(client: &TcpStoreClient) -> kvport::Result<()> {
    let summary = status::report(client, client.endpoints());

    for report in summary.reports() {
        println!("{:#?}", report);
    }
    for failed in summary.failures() {
        if let Err(e) = &failed.result {
            tracing::error!("{}", e);
        }
    }

    summary.check()
}
