//! Argument and setup plumbing shared by the subcommands.

use camino::Utf8PathBuf;
use clap::Args;
use clap::ValueEnum;
use ohno::bail;
use pkgtally::config::Config;
use pkgtally::sources::SourceClients;
use pkgtally::store::postgrest::PostgrestStore;

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments shared by every subcommand.
///
/// Credentials are environment-first and required at startup; a missing store
/// credential aborts before any fetch begins.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Base URL of the snapshot store
    #[arg(long, value_name = "URL", env = "STORE_URL")]
    pub store_url: String,

    /// Access token for the snapshot store
    #[arg(long, value_name = "KEY", env = "STORE_KEY", hide_env_values = true)]
    pub store_key: String,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Path to the configuration file
    #[arg(long, short = 'c', value_name = "PATH", default_value = "pkgtally.toml")]
    pub config: Utf8PathBuf,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    pub log_level: LogLevel,
}

/// Everything a subcommand needs after startup validation.
#[derive(Debug)]
pub struct Common {
    pub config: Config,
    pub clients: SourceClients,
    pub store: PostgrestStore,
}

impl Common {
    pub fn new(args: &CommonArgs) -> pkgtally::Result<Self> {
        init_logging(args.log_level);

        let config = Config::load(&args.config)?;

        if !config.github.is_empty() && args.github_token.is_none() {
            bail!("GITHUB_TOKEN must be set when github repositories are configured");
        }

        let timeout = config.fetch.request_timeout();
        let clients = SourceClients::new(timeout, args.github_token.as_deref())?;
        let store = PostgrestStore::new(&args.store_url, &args.store_key, config.store.table.clone(), timeout)?;

        Ok(Self { config, clients, store })
    }
}

/// Initialize logger based on log level
fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .init();
}
