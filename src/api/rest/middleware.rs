use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

/// Rejects requests addressed to a host outside the allowed list.
pub async fn check_host(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let host = match request.headers().get(header::HOST) {
        Some(value) => match value.to_str() {
            Ok(host) => Some(host.to_string()),
            Err(_) => {
                warn!("request with non-ASCII host header");
                return Err(AppError::BadRequest(
                    "Invalid HTTP_HOST header.".to_string(),
                ));
            }
        },
        None => request.uri().host().map(str::to_string),
    };

    if let Some(host) = host {
        if !host_allowed(&state.config.effective_allowed_hosts(), &host) {
            warn!(%host, "request for disallowed host");
            return Err(AppError::BadRequest(format!(
                "Invalid HTTP_HOST header: '{host}'."
            )));
        }
    }

    Ok(next.run(request).await)
}

pub async fn track_metrics(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().as_str().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    state
        .metrics
        .http_request_duration_seconds
        .with_label_values(&[method.as_str()])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .http_requests_total
        .with_label_values(&[method.as_str(), response.status().as_str()])
        .inc();

    response
}

/// Matches a `Host` value against host patterns. `*` matches anything, a
/// leading dot matches the domain and all of its subdomains, anything else
/// must match exactly. Ports are ignored.
pub fn host_allowed(patterns: &[String], host: &str) -> bool {
    let host = strip_port(host).trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return false;
    }

    patterns.iter().any(|pattern| {
        let pattern = pattern.to_ascii_lowercase();
        if pattern == "*" {
            return true;
        }
        match pattern.strip_prefix('.') {
            Some(domain) => host == domain || host.ends_with(&pattern),
            None => host == pattern,
        }
    })
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }

    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::host_allowed;

    fn patterns(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn exact_hosts_match_with_or_without_port() {
        let allowed = patterns(&["localhost", "citylogistiikka.fvh.io"]);

        assert!(host_allowed(&allowed, "localhost"));
        assert!(host_allowed(&allowed, "localhost:8000"));
        assert!(host_allowed(&allowed, "CityLogistiikka.fvh.io"));
        assert!(!host_allowed(&allowed, "evil.example"));
        assert!(!host_allowed(&allowed, "fvh.io"));
    }

    #[test]
    fn leading_dot_matches_subdomains() {
        let allowed = patterns(&[".fvh.io"]);

        assert!(host_allowed(&allowed, "fvh.io"));
        assert!(host_allowed(&allowed, "api.fvh.io:443"));
        assert!(!host_allowed(&allowed, "notfvh.io"));
    }

    #[test]
    fn wildcard_and_ipv6() {
        assert!(host_allowed(&patterns(&["*"]), "anything.at.all"));
        assert!(host_allowed(&patterns(&["[::1]"]), "[::1]:8000"));
        assert!(!host_allowed(&patterns(&[]), "localhost"));
    }
}
