use std::time::{Duration, Instant};
use tokio::time::sleep;
use url::Url;

use super::types::{Check, Outcome};

/// Checker trait for probing a check's target
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Perform a single probe. Never fails: transport errors and timeouts are
    /// reported as part of the [`Outcome`].
    async fn check(&self, check: &Check) -> Outcome;
}

/// HTTP/HTTPS checker
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new() -> anyhow::Result<Self> {
        // The per-check timeout is enforced in `check`, not on the client.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, check: &Check) -> Outcome {
        let target = match Url::parse(&check.target()) {
            Ok(url) => url,
            Err(e) => return Outcome::transport(format!("invalid url: {e}")),
        };

        let start = Instant::now();
        let request = self.client.request(check.method.as_reqwest(), target).send();
        let deadline = sleep(Duration::from_millis(check.timeout_seconds * 1000));

        // First of response, transport error or timeout wins; the losing
        // branches are dropped with the select.
        tokio::select! {
            result = request => match result {
                Ok(response) => {
                    let latency = start.elapsed().as_millis() as u64;
                    Outcome::response(response.status().as_u16(), latency)
                }
                Err(e) => Outcome::transport(e.to_string()),
            },
            _ = deadline => Outcome::timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::types::{CheckState, ErrorKind, Method, Protocol};
    use std::collections::BTreeSet;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn check_for(server: &MockServer, route: &str, probe_method: Method) -> Check {
        let host = server.uri().trim_start_matches("http://").to_string();
        Check {
            id: "12345678901234567890".to_string(),
            owner_phone: "5551234567".to_string(),
            protocol: Protocol::Http,
            url: format!("{host}{route}"),
            method: probe_method,
            success_codes: BTreeSet::from([200]),
            timeout_seconds: 1,
            state: CheckState::Down,
            last_checked: None,
        }
    }

    #[tokio::test]
    async fn test_response_code_is_captured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let checker = HttpChecker::new().unwrap();
        let outcome = checker.check(&check_for(&server, "/health", Method::Get)).await;

        assert_eq!(outcome.response_code(), Some(503));
        assert_eq!(outcome.error_kind(), None);
    }

    #[tokio::test]
    async fn test_check_method_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/items"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let checker = HttpChecker::new().unwrap();
        let outcome = checker.check(&check_for(&server, "/items", Method::Delete)).await;

        assert_eq!(outcome.response_code(), Some(204));
    }

    #[tokio::test]
    async fn test_redirects_are_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
            .mount(&server)
            .await;

        let checker = HttpChecker::new().unwrap();
        let outcome = checker.check(&check_for(&server, "/old", Method::Get)).await;

        assert_eq!(outcome.response_code(), Some(301));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let checker = HttpChecker::new().unwrap();
        let started = Instant::now();
        let outcome = checker.check(&check_for(&server, "/", Method::Get)).await;

        assert_eq!(outcome.error_kind(), Some(ErrorKind::Timeout));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop a listener to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let server = MockServer::start().await;
        let mut check = check_for(&server, "/", Method::Get);
        check.url = format!("127.0.0.1:{port}/");

        let outcome = HttpChecker::new().unwrap().check(&check).await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Transport));
    }

    #[tokio::test]
    async fn test_unparseable_url_is_transport_error() {
        let server = MockServer::start().await;
        let mut check = check_for(&server, "/", Method::Get);
        check.url = "exa mple.com:notaport".to_string();

        let outcome = HttpChecker::new().unwrap().check(&check).await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Transport));
    }
}
