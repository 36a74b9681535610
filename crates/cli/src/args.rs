//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use wxcache_core::{ForecastSource, Location};

#[derive(Debug, Parser)]
#[command(name = "wxcache", version, about = "Request forecasts and cache them when they are new")]
pub struct Cli {
    /// Log level, overridden by RUST_LOG when set.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Cache root, overriding WXCACHE_CACHE_DIR and the config file.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Which forecast to act on.
#[derive(Debug, Args)]
pub struct Target {
    /// Forecast source, e.g. MORA_REC_FCST.
    #[arg(long = "src")]
    pub source: ForecastSource,

    /// Forecast location, e.g. MORA.
    #[arg(long = "loc")]
    pub location: Location,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Request a forecast and cache it if it's new.
    Fetch {
        #[command(flatten)]
        target: Target,

        /// Serve a fresh cached copy instead of fetching when one exists.
        #[arg(long)]
        use_cache: bool,

        /// Freshness window in seconds (-1 for unbounded).
        #[arg(long, allow_negative_numbers = true)]
        timeout: Option<i64>,

        /// Fetch without writing anything to the cache.
        #[arg(long)]
        no_save: bool,

        /// Print the forecast text to stdout.
        #[arg(long)]
        print: bool,
    },

    /// Print today's freshest cached forecast without fetching.
    Show {
        #[command(flatten)]
        target: Target,

        /// Freshness window in seconds (-1 for unbounded).
        #[arg(long, allow_negative_numbers = true)]
        timeout: Option<i64>,
    },

    /// Parse a forecast, fetching only when nothing fresh is cached.
    Parse {
        #[command(flatten)]
        target: Target,

        /// Freshness window in seconds (-1 for unbounded).
        #[arg(long, allow_negative_numbers = true)]
        timeout: Option<i64>,

        /// Emit JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },

    /// List cache entries for a day.
    Ls {
        #[command(flatten)]
        target: Target,

        /// Day to list as YYYYMMDD (default: today in the cache timezone).
        #[arg(long)]
        date: Option<String>,
    },

    /// Count the mail requests already answered.
    Requests {
        /// Registry file, overriding WXCACHE_REGISTRY_PATH.
        #[arg(long)]
        registry: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from(["wxcache", "fetch", "--src", "MORA_REC_FCST", "--loc", "MORA", "--timeout", "-1"])
            .unwrap();
        let Command::Fetch { target, use_cache, timeout, no_save, print } = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(target.source, ForecastSource::MoraRecFcst);
        assert_eq!(target.location, Location::Mora);
        assert_eq!(timeout, Some(-1));
        assert!(!use_cache && !no_save && !print);
    }

    #[test]
    fn test_reject_unknown_source() {
        let result = Cli::try_parse_from(["wxcache", "show", "--src", "NOPE", "--loc", "MORA"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wxcache", "ls", "--src", "mora_rec_fcst", "--loc", "mora", "--log-level", "debug", "--cache-dir", "/tmp/wx",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_str(), "debug");
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/wx")));
    }

    #[test]
    fn test_parse_requests() {
        let cli = Cli::try_parse_from(["wxcache", "requests", "--registry", "/tmp/wx/registry.txt"]).unwrap();
        let Command::Requests { registry } = cli.command else {
            panic!("expected requests");
        };
        assert_eq!(registry, Some(PathBuf::from("/tmp/wx/registry.txt")));
    }
}
