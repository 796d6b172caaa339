//! Header allowlists for both directions of the proxy.
//!
//! # Responsibilities
//! - Forward only a known-safe subset of inbound request headers
//! - Relay only a known-safe subset of Grafana response headers
//! - Map Grafana redirects back under the proxy prefix
//!
//! # Design Decisions
//! - Allowlist, not denylist: unknown headers are dropped
//! - Inbound `Authorization` and `Cookie` never reach Grafana; the proxy
//!   injects its own credentials
//! - Hop-by-hop headers never cross the proxy in either direction
//! - `Location` is never relayed as-is: it names the internal Grafana host

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use url::Url;

/// Request headers copied from the dashboard client to Grafana.
pub const FORWARDED_REQUEST_HEADERS: &[HeaderName] = &[
    header::ACCEPT,
    header::ACCEPT_LANGUAGE,
    header::CONTENT_TYPE,
];

/// Custom request headers copied to Grafana.
pub const FORWARDED_CUSTOM_HEADERS: &[&str] = &["x-grafana-org-id", "x-request-id"];

/// Response headers relayed from Grafana to the dashboard client.
pub const RELAYED_RESPONSE_HEADERS: &[HeaderName] = &[
    header::CONTENT_TYPE,
    header::CONTENT_ENCODING,
    header::CONTENT_DISPOSITION,
    header::CACHE_CONTROL,
    header::ETAG,
    header::LAST_MODIFIED,
    header::EXPIRES,
];

/// Build the header set sent upstream from the inbound request headers.
pub fn outbound_request_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for name in FORWARDED_REQUEST_HEADERS {
        for value in incoming.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    for name in FORWARDED_CUSTOM_HEADERS {
        if let Some(value) = incoming.get(*name) {
            headers.insert(HeaderName::from_static(*name), value.clone());
        }
    }

    headers
}

/// Keep only the relayable subset of Grafana's response headers.
pub fn relayed_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for name in RELAYED_RESPONSE_HEADERS {
        for value in upstream.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    headers
}

/// Rewrite a Grafana `Location` so the browser stays behind the proxy.
///
/// `value` is resolved against `request_url` (the URL the proxy called). A
/// target on the same origin and under `base_url` becomes `{prefix}/{rest}`,
/// query included. Anything else yields `None` and the header is dropped.
pub fn rewrite_location(
    value: &HeaderValue,
    request_url: &Url,
    base_url: &Url,
    prefix: &str,
) -> Option<HeaderValue> {
    let target = request_url.join(value.to_str().ok()?).ok()?;
    if target.origin() != base_url.origin() {
        return None;
    }

    let base_path = base_url.path().trim_end_matches('/');
    let rest = target.path().strip_prefix(base_path)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        // "/grafana-old" shares a prefix with "/grafana" but is outside it.
        return None;
    }

    let mut location = format!("{}/{}", prefix, rest.trim_start_matches('/'));
    if let Some(query) = target.query() {
        location.push('?');
        location.push_str(query);
    }
    HeaderValue::from_str(&location).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_inbound_credentials_dropped() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer browser-jwt"));
        incoming.insert(header::COOKIE, HeaderValue::from_static("session=abc"));
        incoming.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        incoming.insert("x-grafana-org-id", HeaderValue::from_static("2"));
        incoming.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

        let out = outbound_request_headers(&incoming);
        assert!(out.get(header::AUTHORIZATION).is_none());
        assert!(out.get(header::COOKIE).is_none());
        assert!(out.get(header::CONNECTION).is_none());
        assert_eq!(out.get(header::ACCEPT).unwrap(), "application/json");
        assert_eq!(out.get("x-grafana-org-id").unwrap(), "2");
    }

    #[test]
    fn test_response_allowlist() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        upstream.insert("foo", HeaderValue::from_static("bar"));
        upstream.insert(header::SET_COOKIE, HeaderValue::from_static("grafana_session=xyz"));
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::ETAG, HeaderValue::from_static("\"v1\""));
        upstream.insert(
            header::LOCATION,
            HeaderValue::from_static("http://grafana.internal:3000/grafana/login"),
        );

        let out = relayed_response_headers(&upstream);
        assert_eq!(out.len(), 2);
        assert_eq!(out.get(header::CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(out.get(header::ETAG).unwrap(), "\"v1\"");
        assert!(out.get("foo").is_none());
        assert!(out.get(header::SET_COOKIE).is_none());
        assert!(out.get(header::LOCATION).is_none());
    }

    fn rewrite(location: &'static str) -> Option<String> {
        let base = Url::parse("http://grafana.internal:3000/grafana/").unwrap();
        let request = Url::parse("http://grafana.internal:3000/grafana/d/abc").unwrap();
        rewrite_location(&HeaderValue::from_static(location), &request, &base, "/proxy")
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_location_under_base_rewritten() {
        assert_eq!(
            rewrite("http://grafana.internal:3000/grafana/login").as_deref(),
            Some("/proxy/login")
        );
        assert_eq!(
            rewrite("/grafana/d/abc/cpu?orgId=1&from=now-1h").as_deref(),
            Some("/proxy/d/abc/cpu?orgId=1&from=now-1h")
        );
        assert_eq!(rewrite("cpu").as_deref(), Some("/proxy/d/cpu"));
        assert_eq!(rewrite("/grafana").as_deref(), Some("/proxy/"));
    }

    #[test]
    fn test_location_outside_base_dropped() {
        assert_eq!(rewrite("https://grafana.internal:3000/grafana/login"), None);
        assert_eq!(rewrite("http://grafana.internal:3001/grafana/login"), None);
        assert_eq!(rewrite("http://evil.example.com/grafana/login"), None);
        assert_eq!(rewrite("/admin"), None);
        assert_eq!(rewrite("/grafana-old/login"), None);
        assert_eq!(rewrite("//evil.example.com/"), None);
    }

    #[test]
    fn test_location_with_root_base() {
        let base = Url::parse("http://grafana.internal:3000/").unwrap();
        let out = rewrite_location(
            &HeaderValue::from_static("/login?redirect=%2Fd%2Fabc"),
            &base,
            &base,
            "/proxy",
        )
        .unwrap();
        assert_eq!(out, "/proxy/login?redirect=%2Fd%2Fabc");
    }
}
