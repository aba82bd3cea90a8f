use std::str::FromStr;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber: one line per event on stderr.
///
/// A bare level (`info`, `debug`) keeps the HTTP stack at `info`; a full
/// directive string (`debug,ssh2=trace`) is used as-is.
pub fn setup_logging(log_level: &str, json_format: bool) {
    let filter_spec = filter_spec(log_level);
    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_current_span(true);
        subscriber.with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact();
        subscriber.with(fmt_layer).try_init()
    };

    if installed.is_ok() {
        tracing::debug!(filter = %filter_spec, json = json_format, "logging initialized");
    }
}

fn filter_spec(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.is_empty() {
        "info".to_string()
    } else if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!("{normalized},hyper=info,hyper_util=info,reqwest=info,rustls=info")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_quiets_http_stack() {
        assert_eq!(
            filter_spec("debug"),
            "debug,hyper=info,hyper_util=info,reqwest=info,rustls=info"
        );
    }

    #[test]
    fn directives_pass_through() {
        assert_eq!(filter_spec(" warn,mallfeed_cli=debug "), "warn,mallfeed_cli=debug");
    }

    #[test]
    fn empty_defaults_to_info() {
        assert_eq!(filter_spec(""), "info");
    }
}
