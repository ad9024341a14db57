use clap::{Parser, builder::BoolishValueParser};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use pathways_core::store::SnapshotFormat;
use thiserror::Error;

const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4030";
const DEFAULT_REFRESH_ADDR: &str = "127.0.0.1:4031";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 0;
const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 60;
const DEFAULT_REFRESH_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;
const DEFAULT_RESPONSE_CHAR_LIMIT: usize = 150_000;
const DEFAULT_TOTAL_TOLERANCE: f64 = 0.5;
const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_SSE_KEEP_ALIVE_SECS: u64 = 15;

#[derive(Parser, Debug)]
#[command(name = "pathways-mcpd", version, about = "Pathways segmentation MCP daemon.")]
#[allow(clippy::struct_excessive_bools)]
struct CliArgs {
    /// Snapshot bundle (.json or .toml) loaded at startup and on refresh.
    #[arg(long, env = "PATHWAYS_SNAPSHOT_PATH")]
    snapshot_path: Option<PathBuf>,

    /// Reload the snapshot file every N seconds; 0 disables.
    #[arg(
        long,
        env = "PATHWAYS_REFRESH_INTERVAL_SECS",
        default_value_t = DEFAULT_REFRESH_INTERVAL_SECS
    )]
    refresh_interval_secs: u64,

    #[arg(
        long = "stdio",
        env = "PATHWAYS_ENABLE_STDIO",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(
        long,
        env = "PATHWAYS_MCP_SERVE",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    mcp_serve: bool,

    #[arg(long, env = "PATHWAYS_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    mcp_http_addr: SocketAddr,

    /// Serve MCP HTTP without sessions.
    #[arg(
        long,
        env = "PATHWAYS_MCP_STATELESS",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    mcp_stateless: bool,

    /// SSE keep-alive interval; 0 disables.
    #[arg(
        long,
        env = "PATHWAYS_SSE_KEEP_ALIVE_SECS",
        default_value_t = DEFAULT_SSE_KEEP_ALIVE_SECS
    )]
    sse_keep_alive_secs: u64,

    #[arg(
        long,
        env = "PATHWAYS_REFRESH_SERVE",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    refresh_serve: bool,

    #[arg(long, env = "PATHWAYS_REFRESH_ADDR", default_value = DEFAULT_REFRESH_ADDR)]
    refresh_addr: SocketAddr,

    #[arg(
        long,
        env = "PATHWAYS_REFRESH_TIMEOUT_SECS",
        default_value_t = DEFAULT_REFRESH_TIMEOUT_SECS
    )]
    refresh_timeout_secs: u64,

    #[arg(
        long,
        env = "PATHWAYS_REFRESH_MAX_BODY_BYTES",
        default_value_t = DEFAULT_REFRESH_MAX_BODY_BYTES
    )]
    refresh_max_body_bytes: usize,

    #[arg(
        long,
        env = "PATHWAYS_RESPONSE_CHAR_LIMIT",
        default_value_t = DEFAULT_RESPONSE_CHAR_LIMIT
    )]
    response_char_limit: usize,

    /// Allowed overshoot above 100% for prevalence and weight totals.
    #[arg(
        long,
        env = "PATHWAYS_TOTAL_TOLERANCE",
        default_value_t = DEFAULT_TOTAL_TOLERANCE
    )]
    total_tolerance: f64,

    /// Log total violations instead of rejecting the snapshot.
    #[arg(
        long,
        env = "PATHWAYS_LENIENT_TOTALS",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    lenient_totals: bool,

    /// Tracing filter used when `RUST_LOG` is unset.
    #[arg(long = "log", env = "PATHWAYS_LOG", default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct PathwaysConfig {
    pub snapshot_path: Option<PathBuf>,
    pub refresh_interval: Option<Duration>,
    pub enable_stdio: bool,
    pub mcp_serve: bool,
    pub mcp_http_addr: SocketAddr,
    pub mcp_stateful: bool,
    pub sse_keep_alive: Option<Duration>,
    pub refresh_serve: bool,
    pub refresh_addr: SocketAddr,
    pub refresh_timeout: Duration,
    pub refresh_max_body_bytes: usize,
    pub response_char_limit: usize,
    pub total_tolerance: f64,
    pub strict_totals: bool,
    pub log_filter: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),
    #[error("invalid {name} value: {value}")]
    InvalidSetting { name: &'static str, value: String },
    #[error("no serving surface enabled (stdio, MCP HTTP, or refresh HTTP)")]
    NoSurface,
}

impl PathwaysConfig {
    /// Parses CLI arguments and environment variables.
    ///
    /// # Errors
    /// Returns `ConfigError` if a setting is missing or invalid.
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

impl TryFrom<CliArgs> for PathwaysConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if !args.enable_stdio && !args.mcp_serve && !args.refresh_serve {
            return Err(ConfigError::NoSurface);
        }

        let snapshot_path = args
            .snapshot_path
            .filter(|path| !path.as_os_str().is_empty());
        if let Some(path) = snapshot_path.as_ref() {
            if SnapshotFormat::from_path(path).is_err() {
                return Err(ConfigError::InvalidSetting {
                    name: "PATHWAYS_SNAPSHOT_PATH",
                    value: path.display().to_string(),
                });
            }
        }

        let refresh_interval = if args.refresh_interval_secs == 0 {
            None
        } else {
            if snapshot_path.is_none() {
                return Err(ConfigError::MissingSetting("PATHWAYS_SNAPSHOT_PATH"));
            }
            Some(Duration::from_secs(args.refresh_interval_secs))
        };

        if !args.total_tolerance.is_finite() || args.total_tolerance < 0.0 {
            return Err(ConfigError::InvalidSetting {
                name: "PATHWAYS_TOTAL_TOLERANCE",
                value: args.total_tolerance.to_string(),
            });
        }
        if args.response_char_limit == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "PATHWAYS_RESPONSE_CHAR_LIMIT",
                value: args.response_char_limit.to_string(),
            });
        }
        if args.refresh_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "PATHWAYS_REFRESH_TIMEOUT_SECS",
                value: args.refresh_timeout_secs.to_string(),
            });
        }

        let log_filter = if args.log_filter.trim().is_empty() {
            DEFAULT_LOG_FILTER.to_string()
        } else {
            args.log_filter
        };

        Ok(Self {
            snapshot_path,
            refresh_interval,
            enable_stdio: args.enable_stdio,
            mcp_serve: args.mcp_serve,
            mcp_http_addr: args.mcp_http_addr,
            mcp_stateful: !args.mcp_stateless,
            sse_keep_alive: (args.sse_keep_alive_secs > 0)
                .then_some(Duration::from_secs(args.sse_keep_alive_secs)),
            refresh_serve: args.refresh_serve,
            refresh_addr: args.refresh_addr,
            refresh_timeout: Duration::from_secs(args.refresh_timeout_secs),
            refresh_max_body_bytes: args.refresh_max_body_bytes,
            response_char_limit: args.response_char_limit,
            total_tolerance: args.total_tolerance,
            strict_totals: !args.lenient_totals,
            log_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            snapshot_path: Some(PathBuf::from("data/pathways.json")),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            enable_stdio: false,
            mcp_serve: true,
            mcp_http_addr: DEFAULT_MCP_HTTP_ADDR.parse().expect("valid MCP addr"),
            mcp_stateless: false,
            sse_keep_alive_secs: DEFAULT_SSE_KEEP_ALIVE_SECS,
            refresh_serve: true,
            refresh_addr: DEFAULT_REFRESH_ADDR.parse().expect("valid refresh addr"),
            refresh_timeout_secs: DEFAULT_REFRESH_TIMEOUT_SECS,
            refresh_max_body_bytes: DEFAULT_REFRESH_MAX_BODY_BYTES,
            response_char_limit: DEFAULT_RESPONSE_CHAR_LIMIT,
            total_tolerance: DEFAULT_TOTAL_TOLERANCE,
            lenient_totals: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    #[test]
    fn defaults_parse() {
        let config = PathwaysConfig::try_from(base_args()).expect("config should parse");
        assert!(config.refresh_interval.is_none());
        assert!(config.strict_totals);
        assert_eq!(config.response_char_limit, DEFAULT_RESPONSE_CHAR_LIMIT);
        assert!(config.mcp_stateful);
        assert_eq!(config.sse_keep_alive, Some(Duration::from_secs(15)));
    }

    #[test]
    fn zero_keep_alive_disables_sse_pings() {
        let mut args = base_args();
        args.sse_keep_alive_secs = 0;
        args.mcp_stateless = true;
        let config = PathwaysConfig::try_from(args).expect("config should parse");
        assert!(config.sse_keep_alive.is_none());
        assert!(!config.mcp_stateful);
    }

    #[test]
    fn interval_requires_snapshot_path() {
        let mut args = base_args();
        args.snapshot_path = None;
        args.refresh_interval_secs = 300;
        assert!(matches!(
            PathwaysConfig::try_from(args),
            Err(ConfigError::MissingSetting("PATHWAYS_SNAPSHOT_PATH"))
        ));
    }

    #[test]
    fn rejects_unsupported_snapshot_extension() {
        let mut args = base_args();
        args.snapshot_path = Some(PathBuf::from("pathways.csv"));
        assert!(matches!(
            PathwaysConfig::try_from(args),
            Err(ConfigError::InvalidSetting { name: "PATHWAYS_SNAPSHOT_PATH", .. })
        ));
    }

    #[test]
    fn rejects_negative_tolerance_and_zero_limit() {
        let mut args = base_args();
        args.total_tolerance = -1.0;
        assert!(PathwaysConfig::try_from(args).is_err());

        let mut args = base_args();
        args.response_char_limit = 0;
        assert!(PathwaysConfig::try_from(args).is_err());
    }

    #[test]
    fn requires_a_surface() {
        let mut args = base_args();
        args.mcp_serve = false;
        args.refresh_serve = false;
        assert!(matches!(PathwaysConfig::try_from(args), Err(ConfigError::NoSurface)));
    }

    #[test]
    fn lenient_totals_disable_strict_mode() {
        let mut args = base_args();
        args.lenient_totals = true;
        args.log_filter = "  ".to_string();
        let config = PathwaysConfig::try_from(args).expect("config should parse");
        assert!(!config.strict_totals);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }
}
