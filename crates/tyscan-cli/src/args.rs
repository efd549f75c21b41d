use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the tyscan binary.
#[derive(Parser, Debug)]
#[command(
    name = "tyscan",
    version,
    about = "Static type scanner - catalogs every reachable declaration of the scanned packages"
)]
pub struct CliArgs {
    /// Package patterns to scan (`./x`, `./x/...`, `host/mod/pkg/**`).
    #[arg(required = true)]
    pub patterns: Vec<String>,

    /// Path to the frontend export (JSON) produced by the upstream
    /// type-checker.
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Comma-separated scan-mode flags
    /// (types,methods,fields,docs,comments,consts,variables,functions,enums,default).
    #[arg(long = "scanMode", alias = "scan-mode", default_value = "default")]
    pub scan_mode: String,

    /// Emit unexported methods and fields as well.
    #[arg(long = "includeUnexported", alias = "include-unexported")]
    pub include_unexported: bool,

    /// Log verbosity used when TYSCAN_LOG/RUST_LOG is not set.
    #[arg(long = "logLevel", alias = "log-level", value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Output file; stdout when omitted.
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

/// Log verbosity levels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The corresponding `EnvFilter` directive.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
