use clap::ValueEnum;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Process-wide observability bootstrap. Tracing comes up first so the
/// metrics exporter can log its own listen address.
pub fn init(
    default_level: &str,
    format: LogFormat,
    metrics_addr: Option<SocketAddr>,
) -> Result<(), String> {
    let directive = std::env::var("MARLIN_LOG").unwrap_or_else(|_| default_level.to_string());
    let filter = parse_filter(&directive)?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }

    start_metrics_exporter(metrics_addr)
}

fn parse_filter(directive: &str) -> Result<EnvFilter, String> {
    EnvFilter::try_new(directive)
        .map_err(|err| format!("invalid log filter {directive:?}: {err}"))
}

#[cfg(feature = "prometheus")]
fn start_metrics_exporter(addr: Option<SocketAddr>) -> Result<(), String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(addr) = addr else {
        return Ok(());
    };
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to start metrics exporter on {addr}: {err}"))?;
    tracing::info!(%addr, "metrics exporter listening");
    Ok(())
}

#[cfg(not(feature = "prometheus"))]
fn start_metrics_exporter(addr: Option<SocketAddr>) -> Result<(), String> {
    match addr {
        Some(_) => Err("--metrics-addr needs the `prometheus` build feature".to_string()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_filter, LogFormat};
    use clap::ValueEnum;

    #[test]
    fn filter_directives_parse_and_bad_levels_do_not() {
        assert!(parse_filter("info").is_ok());
        assert!(parse_filter("marlin_application=debug,warn").is_ok());
        assert!(parse_filter("marlin=notalevel").is_err());
    }

    #[test]
    fn log_format_parses_from_cli_values() {
        assert_eq!(
            LogFormat::from_str("json", true).expect("known value"),
            LogFormat::Json
        );
        assert_eq!(
            LogFormat::from_str("text", true).expect("known value"),
            LogFormat::Text
        );
        assert!(LogFormat::from_str("yaml", true).is_err());
    }
}
