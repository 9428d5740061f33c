use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, Response},
};
use tracing::{field, Span};

/// Output format of the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
}

impl LogSettings {
    /// Reads `RUST_LOG` and `LOG_FORMAT`, falling back to `default_filter` and plain text.
    pub fn from_lookup<F>(lookup: F, default_filter: &str) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Plain,
        };
        Self {
            filter: lookup("RUST_LOG").unwrap_or_else(|| default_filter.to_string()),
            format,
        }
    }

    pub fn from_env(default_filter: &str) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), default_filter)
    }
}

/// Installs the global subscriber. Logs go to stderr so the CLI's stdout stays clean.
pub fn init(settings: &LogSettings) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter.as_str())
        .with_writer(std::io::stderr);
    match settings.format {
        LogFormat::Json => builder.with_target(false).json().init(),
        LogFormat::Plain => builder.init(),
    }
}

pub fn make_request_span(req: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %req.method(),
        path = req.uri().path(),
        status = field::Empty,
    )
}

/// 5xx log at error, 4xx at warn, everything else at info.
pub fn log_response(res: &Response<Body>, latency: Duration, span: &Span) {
    let status = res.status();
    span.record("status", status.as_u16());
    let elapsed_ms = latency.as_millis() as u64;
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), elapsed_ms, "request failed");
    } else if status.is_client_error() {
        tracing::warn!(status = status.as_u16(), elapsed_ms, "request rejected");
    } else {
        tracing::info!(status = status.as_u16(), elapsed_ms, "request served");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> LogSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LogSettings::from_lookup(|k| vars.get(k).cloned(), "communityboard=info")
    }

    #[test]
    fn defaults_to_plain_text_and_given_filter() {
        let s = settings(&[]);
        assert_eq!(s.format, LogFormat::Plain);
        assert_eq!(s.filter, "communityboard=info");
    }

    #[test]
    fn json_format_and_filter_from_env() {
        let s = settings(&[("LOG_FORMAT", " JSON "), ("RUST_LOG", "debug")]);
        assert_eq!(s.format, LogFormat::Json);
        assert_eq!(s.filter, "debug");
    }

    #[test]
    fn unknown_format_falls_back_to_plain() {
        assert_eq!(settings(&[("LOG_FORMAT", "yaml")]).format, LogFormat::Plain);
    }

    #[test]
    fn span_and_response_hooks_run_without_subscriber() {
        let req = Request::builder().uri("/leaderboard?x=1").body(Body::empty()).unwrap();
        let span = make_request_span(&req);
        let res = Response::builder().status(503).body(Body::empty()).unwrap();
        log_response(&res, Duration::from_millis(3), &span);
    }
}
