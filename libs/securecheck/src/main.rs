use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use securecheck::config::SourceConfig;
use securecheck::{Catalog, Config, Dashboard, Dialect, Error, store, web};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    #[command(about = "Serve the police logs dashboard over HTTP")]
    Serve(ServeArgs),
    #[command(about = "Run one preset query and print the result")]
    Query(QueryArgs),
    #[command(about = "List the preset queries and their SQL")]
    Catalog(CatalogArgs),
}

#[derive(clap::Args, Clone, Debug)]
struct SourceArgs {
    #[clap(long, help = "Path to the configuration file")]
    config: Option<PathBuf>,
    #[clap(long, conflicts_with = "parquet", help = "Read stop records from a CSV file")]
    csv: Option<PathBuf>,
    #[clap(long, help = "Read stop records from a parquet file")]
    parquet: Option<PathBuf>,
    #[clap(
        long,
        value_enum,
        default_value = "info",
        help = "Log level (error, warn, info, debug, trace)"
    )]
    log_level: LogLevel,
}

#[derive(clap::Args, Clone, Debug)]
struct ServeArgs {
    #[clap(long, help = "Address to bind the HTTP server to")]
    addr: Option<SocketAddr>,
    #[clap(flatten)]
    source: SourceArgs,
}

#[derive(clap::Args, Clone, Debug)]
struct QueryArgs {
    #[clap(help = "Label of the preset query, e.g. \"Top 10 Drug-Related Vehicle Numbers\"")]
    label: String,
    #[clap(flatten)]
    source: SourceArgs,
}

#[derive(clap::Args, Clone, Debug)]
struct CatalogArgs {
    #[clap(
        long,
        value_enum,
        default_value = "postgres",
        help = "SQL dialect to render"
    )]
    dialect: DialectArg,
    #[clap(long, default_value = securecheck::DEFAULT_TABLE, help = "Table name to render")]
    table: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DialectArg {
    Postgres,
    Datafusion,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl SourceArgs {
    fn load(&self) -> Result<Config, Error> {
        let mut config = Config::new(self.config.as_deref())?;
        if let Some(path) = &self.csv {
            config.source = Some(SourceConfig::Csv { path: path.clone() });
        } else if let Some(path) = &self.parquet {
            config.source = Some(SourceConfig::Parquet { path: path.clone() });
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let args = Cli::parse();
    let log_level = match &args.command {
        Commands::Serve(args) => args.source.log_level,
        Commands::Query(args) => args.source.log_level,
        Commands::Catalog(_) => LogLevel::Warn,
    };
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::builder().from_env_lossy()
    } else {
        EnvFilter::builder().parse_lossy(format!("securecheck={}", log_level.as_str()))
    };

    let _ = tracing_subscriber::fmt::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(
            "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        ))
        .try_init();

    run(args.command).await.into_diagnostic()
}

async fn run(command: Commands) -> Result<(), Error> {
    match command {
        Commands::Serve(ServeArgs { addr, source }) => {
            let mut config = source.load()?;
            if let Some(addr) = addr {
                config.http.address = addr;
            }
            info!(?config, "config");
            let store = store::open(&config).await?;
            let dashboard = Arc::new(Dashboard::new(store));
            web::serve(config.http.address, dashboard).await
        }
        Commands::Query(QueryArgs { label, source }) => {
            let config = source.load()?;
            info!(?config, "config");
            let store = store::open(&config).await?;
            let dashboard = Dashboard::new(store);
            let table = dashboard.on_run(Some(&label)).await?;
            println!("{}", table.to_tabled());
            Ok(())
        }
        Commands::Catalog(CatalogArgs { dialect, table }) => {
            let dialect = match dialect {
                DialectArg::Postgres => Dialect::Postgres,
                DialectArg::Datafusion => Dialect::DataFusion,
            };
            for (group, definitions) in Catalog::global().groups() {
                println!("## {}\n", group.title());
                for definition in definitions {
                    println!("{}\n{}\n", definition.label, definition.sql(&table, dialect));
                }
            }
            Ok(())
        }
    }
}
