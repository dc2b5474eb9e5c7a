use crate::application::dispatcher::DEFAULT_EVENT_BUFFER;
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ORDER_SERVICE_URL: &str = "http://localhost:8081/api/orders";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Runtime configuration. Every flag can also be set through its
/// `PAYMENTS_*` environment variable.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Payment orchestration service", long_about = None)]
pub struct Config {
    /// Address the HTTP API listens on
    #[arg(long, env = "PAYMENTS_BIND", default_value = "0.0.0.0:8082")]
    pub bind: SocketAddr,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "PAYMENTS_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Deadline for a single gateway call, in milliseconds
    #[arg(long, env = "PAYMENTS_GATEWAY_TIMEOUT_MS", default_value_t = 5_000)]
    pub gateway_timeout_ms: u64,

    /// Probability that the simulated gateway authorizes a charge
    #[arg(
        long,
        env = "PAYMENTS_AUTHORIZE_SUCCESS_RATE",
        default_value_t = 0.9,
        value_parser = parse_rate
    )]
    pub authorize_success_rate: f64,

    /// Probability that the simulated gateway accepts a refund
    #[arg(
        long,
        env = "PAYMENTS_REFUND_SUCCESS_RATE",
        default_value_t = 0.95,
        value_parser = parse_rate
    )]
    pub refund_success_rate: f64,

    /// Simulated authorization latency, in milliseconds
    #[arg(long, env = "PAYMENTS_AUTHORIZE_LATENCY_MS", default_value_t = 1_000)]
    pub authorize_latency_ms: u64,

    /// Simulated refund latency, in milliseconds
    #[arg(long, env = "PAYMENTS_REFUND_LATENCY_MS", default_value_t = 800)]
    pub refund_latency_ms: u64,

    /// Lifecycle events queued for delivery before new ones are dropped
    #[arg(long, env = "PAYMENTS_EVENT_BUFFER", default_value_t = DEFAULT_EVENT_BUFFER)]
    pub event_buffer: usize,

    /// Base URL of the order service's order resource
    #[arg(long, env = "PAYMENTS_ORDER_SERVICE_URL", default_value = DEFAULT_ORDER_SERVICE_URL)]
    pub order_service_url: String,

    #[arg(long, env = "PAYMENTS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    pub fn authorize_latency(&self) -> Duration {
        Duration::from_millis(self.authorize_latency_ms)
    }

    pub fn refund_latency(&self) -> Duration {
        Duration::from_millis(self.refund_latency_ms)
    }
}

fn parse_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("success rate must be between 0 and 1, got {rate}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["payment-orchestrator"]).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8082".parse::<SocketAddr>().unwrap());
        assert_eq!(config.gateway_timeout(), Duration::from_secs(5));
        assert_eq!(config.authorize_success_rate, 0.9);
        assert_eq!(config.refund_success_rate, 0.95);
        assert_eq!(config.refund_latency(), Duration::from_millis(800));
        assert_eq!(config.order_service_url, DEFAULT_ORDER_SERVICE_URL);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_rate_out_of_range_is_rejected() {
        let args = ["payment-orchestrator", "--authorize-success-rate", "1.5"];
        assert!(Config::try_parse_from(args).is_err());
        let args = ["payment-orchestrator", "--refund-success-rate", "-0.1"];
        assert!(Config::try_parse_from(args).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "payment-orchestrator",
            "--bind",
            "127.0.0.1:9000",
            "--authorize-success-rate",
            "1",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.authorize_success_rate, 1.0);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
