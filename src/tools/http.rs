//! Outbound HTTP/1.1 and HTTP/2 requests.
//!
//! One request per call; the response is summarized as pretty JSON with the
//! body cut at [`BODY_LIMIT`] characters.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response};
use serde_json::json;
use tracing::info;
use url::Url;

use super::requests::{Http1Request, Http2Request};
use super::{ToolError, ToolErrorKind, Toolbox, require, to_pretty_json};

pub const BODY_LIMIT: usize = 5000;
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// First [`BODY_LIMIT`] characters of `body`, marked when anything was cut.
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(BODY_LIMIT) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &body[..cut]),
        None => body.to_string(),
    }
}

/// Preconfigured clients, one per wire protocol.
#[derive(Debug, Clone)]
pub struct HttpClients {
    http1: Client,
    /// Cleartext HTTP/2 with prior knowledge.
    h2c: Client,
    /// TLS, protocol picked by ALPN.
    h2: Client,
}

impl HttpClients {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let builder = || Client::builder().timeout(timeout);
        Ok(Self {
            http1: builder()
                .http1_only()
                .build()
                .context("failed to build HTTP/1.1 client")?,
            h2c: builder()
                .http2_prior_knowledge()
                .build()
                .context("failed to build h2c client")?,
            h2: builder().build().context("failed to build HTTP/2 client")?,
        })
    }

    fn for_http2(&self, url: &Url) -> &Client {
        if url.scheme() == "https" { &self.h2 } else { &self.h2c }
    }
}

fn parse_method(method: &str) -> Result<Method, ToolError> {
    Method::from_bytes(method.trim().to_uppercase().as_bytes())
        .map_err(|_| ToolError::invalid(format!("Invalid HTTP method: {method}")))
}

fn parse_url(raw: &str) -> Result<Url, ToolError> {
    let url = Url::parse(raw.trim()).map_err(|e| ToolError::invalid(format!("Invalid URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ToolError::invalid(format!(
            "Unsupported URL scheme '{other}' (expected http or https)"
        ))),
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ToolError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| ToolError::invalid(format!("Invalid header name: {name}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| ToolError::invalid(format!("Invalid value for header {name}")))?;
        map.append(name, value);
    }
    Ok(map)
}

/// Apply HTTP/2 pseudo-headers to method and URL, and fold the remaining
/// keys into `headers` without overriding explicit request headers.
///
/// Header names are lowercased first (HTTP/2 names are lowercase on the
/// wire), so `X-Token` and `x-token` are the same header.
fn merge_pseudo_headers(
    method: &str,
    url: &str,
    pseudo: &BTreeMap<String, String>,
    headers: &BTreeMap<String, String>,
) -> Result<(String, String, BTreeMap<String, String>), ToolError> {
    let parsed = parse_url(url)?;
    let mut method = method.to_string();
    let mut scheme = parsed.scheme().to_string();
    let mut authority = match parsed.port() {
        Some(port) => format!("{}:{port}", parsed.host_str().unwrap_or_default()),
        None => parsed.host_str().unwrap_or_default().to_string(),
    };
    let mut path = match parsed.query() {
        Some(q) => format!("{}?{q}", parsed.path()),
        None => parsed.path().to_string(),
    };
    let mut merged = BTreeMap::new();

    for (key, value) in pseudo {
        match key.as_str() {
            ":method" => method = value.clone(),
            ":scheme" => scheme = value.clone(),
            ":authority" => authority = value.clone(),
            ":path" => path = value.clone(),
            k if k.starts_with(':') => {}
            _ => {
                merged.insert(key.to_ascii_lowercase(), value.clone());
            }
        }
    }
    merged.extend(
        headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone())),
    );

    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    Ok((method, format!("{scheme}://{authority}{path}"), merged))
}

fn send_error(err: reqwest::Error) -> ToolError {
    let kind = if err.is_timeout() {
        ToolErrorKind::DeadlineExceeded
    } else {
        ToolErrorKind::Network
    };
    ToolError::new(kind, format!("Error sending HTTP request: {err}"))
}

/// Repeated headers collapse to one `", "`-joined entry.
fn response_headers(resp: &Response) -> BTreeMap<String, String> {
    let headers = resp.headers();
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), joined)
        })
        .collect()
}

impl Toolbox {
    async fn send(
        &self,
        client: &Client,
        method: &str,
        url: Url,
        headers: &BTreeMap<String, String>,
        body: String,
    ) -> Result<(u16, BTreeMap<String, String>, String), ToolError> {
        let method = parse_method(method)?;
        let headers = header_map(headers)?;
        let target = url.to_string();

        let mut request = client.request(method.clone(), url).headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }
        let resp = request.send().await.map_err(send_error)?;
        let status = resp.status().as_u16();
        let version = resp.version();
        let headers = response_headers(&resp);
        let body = resp.text().await.map_err(send_error)?;

        info!(%method, url = %target, status, ?version, "HTTP request completed");
        Ok((status, headers, truncate_body(&body)))
    }

    pub async fn send_http1_request(&self, req: Http1Request) -> Result<String, ToolError> {
        let url = parse_url(require(&req.url, "url")?)?;
        let headers = req.headers.unwrap_or_default();
        let (status, headers, body) = self
            .send(&self.http.http1, &req.method, url, &headers, req.body)
            .await?;
        Ok(to_pretty_json(&json!({
            "status": status,
            "headers": headers,
            "body": body,
        })))
    }

    pub async fn send_http2_request(&self, req: Http2Request) -> Result<String, ToolError> {
        let url = require(&req.url, "url")?;
        let pseudo = req.pseudo_headers.unwrap_or_default();
        let (method, url, headers) = merge_pseudo_headers(
            &req.method,
            url,
            &pseudo,
            &req.headers.unwrap_or_default(),
        )?;
        let url = parse_url(&url)?;
        let client = self.http.for_http2(&url);
        let (status, headers, body) = self.send(client, &method, url, &headers, req.body).await?;

        // The caller's pseudo-headers, plus the response `:status`.
        let mut pseudo_out = pseudo;
        pseudo_out.insert(":status".to_string(), status.to_string());
        Ok(to_pretty_json(&json!({
            "status": status,
            "pseudo_headers": pseudo_out,
            "headers": headers,
            "body": body,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::toolbox_with;
    use axum::Router;
    use axum::extract::Request;
    use axum::http::HeaderMap as AxumHeaders;
    use axum::routing::{any, get};
    use serde_json::Value;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn test_router() -> Router {
        Router::new()
            .route(
                "/echo",
                any(|req: Request| async move {
                    let method = req.method().to_string();
                    let version = format!("{:?}", req.version());
                    let token = req
                        .headers()
                        .get("x-token")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    let query = req.uri().query().unwrap_or("").to_string();
                    format!("{method} {version} {token} {query}")
                }),
            )
            .route("/big", get(|| async { "x".repeat(BODY_LIMIT + 10) }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .route(
                "/multi",
                get(|| async {
                    let mut headers = AxumHeaders::new();
                    headers.append("x-multi", "a".parse().unwrap());
                    headers.append("x-multi", "b".parse().unwrap());
                    (headers, "ok")
                }),
            )
    }

    fn parse(out: &str) -> Value {
        serde_json::from_str(out).unwrap()
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_body("short"), "short");
        let exact = "é".repeat(BODY_LIMIT);
        assert_eq!(truncate_body(&exact), exact);
        let long = "é".repeat(BODY_LIMIT + 1);
        let cut = truncate_body(&long);
        assert_eq!(
            cut.chars().count(),
            BODY_LIMIT + TRUNCATION_MARKER.chars().count()
        );
        assert!(cut.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn pseudo_headers_override_url_and_method() {
        let pseudo = BTreeMap::from([
            (":method".to_string(), "POST".to_string()),
            (":path".to_string(), "/api?x=1".to_string()),
            (":authority".to_string(), "other.test:8443".to_string()),
            ("x-a".to_string(), "from-pseudo".to_string()),
            ("x-b".to_string(), "from-pseudo".to_string()),
        ]);
        let headers = BTreeMap::from([("x-b".to_string(), "explicit".to_string())]);
        let (method, url, merged) =
            merge_pseudo_headers("GET", "https://example.com/old", &pseudo, &headers).unwrap();
        assert_eq!(method, "POST");
        assert_eq!(url, "https://other.test:8443/api?x=1");
        assert_eq!(merged["x-a"], "from-pseudo");
        assert_eq!(merged["x-b"], "explicit");
    }

    #[test]
    fn header_merge_ignores_name_case() {
        let pseudo = BTreeMap::from([("X-Token".to_string(), "from-pseudo".to_string())]);
        let headers = BTreeMap::from([("x-token".to_string(), "explicit".to_string())]);
        let (_, _, merged) =
            merge_pseudo_headers("GET", "http://example.com/", &pseudo, &headers).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged["x-token"], "explicit");
    }

    #[test]
    fn bad_inputs_are_invalid_arguments() {
        assert_eq!(
            parse_url("ftp://example.com").unwrap_err().kind,
            ToolErrorKind::InvalidArgument
        );
        assert_eq!(
            parse_method("GE T").unwrap_err().kind,
            ToolErrorKind::InvalidArgument
        );
        assert_eq!(parse_method("delete").unwrap(), Method::DELETE);
    }

    #[tokio::test]
    async fn http1_round_trip() {
        let base = serve(test_router()).await;
        let tb = toolbox_with(&[], "true");
        let out = tb
            .send_http1_request(Http1Request {
                method: "put".into(),
                url: Some(format!("{base}/echo?q=1")),
                headers: Some(BTreeMap::from([("X-Token".into(), "abc".into())])),
                body: "payload".into(),
            })
            .await
            .unwrap();
        let v = parse(&out);
        assert_eq!(v["status"], 200);
        assert_eq!(v["body"], "PUT HTTP/1.1 abc q=1");
        assert!(v["headers"]["content-type"].is_string());
    }

    #[tokio::test]
    async fn long_body_is_truncated() {
        let base = serve(test_router()).await;
        let tb = toolbox_with(&[], "true");
        let out = tb
            .send_http1_request(Http1Request {
                url: Some(format!("{base}/big")),
                ..Default::default()
            })
            .await
            .unwrap();
        let body = parse(&out)["body"].as_str().unwrap().to_string();
        assert_eq!(body.len(), BODY_LIMIT + TRUNCATION_MARKER.len());
        assert!(body.ends_with(TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn repeated_headers_are_joined() {
        let base = serve(test_router()).await;
        let tb = toolbox_with(&[], "true");
        let out = tb
            .send_http1_request(Http1Request {
                url: Some(format!("{base}/multi")),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(parse(&out)["headers"]["x-multi"], "a, b");
    }

    #[tokio::test]
    async fn http2_uses_prior_knowledge_and_pseudo_path() {
        let base = serve(test_router()).await;
        let tb = toolbox_with(&[], "true");
        let out = tb
            .send_http2_request(Http2Request {
                url: Some(format!("{base}/ignored")),
                pseudo_headers: Some(BTreeMap::from([
                    (":path".into(), "/echo?h=2".into()),
                    (":method".into(), "DELETE".into()),
                ])),
                ..Default::default()
            })
            .await
            .unwrap();
        let v = parse(&out);
        assert_eq!(v["status"], 200);
        assert_eq!(v["pseudo_headers"][":status"], "200");
        assert_eq!(v["pseudo_headers"][":path"], "/echo?h=2");
        assert_eq!(v["body"], "DELETE HTTP/2.0  h=2");
    }

    #[tokio::test]
    async fn http2_explicit_header_beats_pseudo_header() {
        let base = serve(test_router()).await;
        let tb = toolbox_with(&[], "true");
        let out = tb
            .send_http2_request(Http2Request {
                url: Some(format!("{base}/echo")),
                pseudo_headers: Some(BTreeMap::from([(
                    "X-Token".into(),
                    "from-pseudo".into(),
                )])),
                headers: Some(BTreeMap::from([("x-token".into(), "explicit".into())])),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(parse(&out)["body"], "GET HTTP/2.0 explicit ");
    }

    #[tokio::test]
    async fn slow_response_is_deadline_exceeded() {
        let base = serve(test_router()).await;
        let mut tb = toolbox_with(&[], "true");
        tb.http = HttpClients::new(Duration::from_millis(200)).unwrap();
        let err = tb
            .send_http1_request(Http1Request {
                url: Some(format!("{base}/slow")),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::DeadlineExceeded);
        assert!(err.message.starts_with("Error sending HTTP request: "));
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let tb = toolbox_with(&[], "true");
        let err = tb
            .send_http1_request(Http1Request {
                url: Some(format!("http://{addr}/")),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Network);
        assert!(err.message.starts_with("Error sending HTTP request: "));
    }
}
