use log::{debug, warn};
use std::time::Duration;
use ureq::Agent;

use super::MessApi;
use crate::error::{MessError, Result};
use crate::report::{BillingPeriod, ReportQuery};

/// Blocking REST client for the mess backend.
///
/// A 401 from any endpoint invokes the injected authentication-failure
/// callback before the error is returned to the caller.
pub struct HttpClient {
    agent: Agent,
    base_url: String,
    token: Option<String>,
    on_unauthorized: Option<Box<dyn Fn()>>,
}

impl HttpClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            on_unauthorized: None,
        }
    }

    /// Register the callback run when the backend rejects our credentials
    pub fn on_unauthorized(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_unauthorized = Some(Box::new(callback));
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    fn post_period(&self, path: &str, period: BillingPeriod) -> Result<()> {
        let url = self.url(path);
        let body = serde_json::json!({ "month": period.month, "year": period.year }).to_string();
        debug!("POST {} {}", url, body);

        let mut request = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(auth) = self.bearer() {
            request = request.header("Authorization", auth);
        }

        self.finish(&url, request.send(body))?;
        Ok(())
    }

    fn finish(
        &self,
        url: &str,
        outcome: std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    ) -> Result<String> {
        let mut response = outcome.map_err(|e| MessError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| MessError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if status == 401 {
            warn!("Backend rejected credentials for {}", url);
            if let Some(callback) = &self.on_unauthorized {
                callback();
            }
            return Err(MessError::Unauthorized);
        }
        if !(200..300).contains(&status) {
            return Err(MessError::Server {
                url: url.to_string(),
                status,
                message: error_message(&body),
            });
        }
        Ok(body)
    }
}

impl MessApi for HttpClient {
    fn fetch_report(&self, query: &ReportQuery) -> Result<serde_json::Value> {
        let url = self.url(query.endpoint());
        debug!("GET {} {:?}", url, query.params);

        let mut request = self.agent.get(&url);
        for (key, value) in &query.params {
            request = request.query(*key, value);
        }
        if let Some(auth) = self.bearer() {
            request = request.header("Authorization", auth);
        }

        let body = self.finish(&url, request.call())?;
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).map_err(|source| MessError::Payload {
            kind: query.report_type,
            source,
        })
    }

    fn generate_bills(&self, period: BillingPeriod) -> Result<()> {
        self.post_period("/mess/bills/generate", period)
    }

    fn allocate_fees(&self, period: BillingPeriod) -> Result<()> {
        self.post_period("/mess/fees/allocate", period)
    }
}

/// Pull a human-readable message out of an error response body
fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(msg) = json[key].as_str() {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportFilter, ReportType};
    use std::cell::Cell;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::rc::Rc;
    use std::sync::mpsc;
    use std::thread;

    /// Serve a single canned response and hand back the raw request head
    fn one_shot_server(response: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let head = String::from_utf8_lossy(&buf).to_string();
            // Drain the request body so closing the socket does not reset it
            let header_end = head.find("\r\n\r\n").map_or(head.len(), |i| i + 4);
            let body_len = head
                .lines()
                .find_map(|l| l.to_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            let mut received = buf.len() - header_end;
            while received < body_len {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                received += n;
            }
            stream.write_all(response.as_bytes()).unwrap();
            let _ = tx.send(head);
        });
        (format!("http://{addr}/api"), rx)
    }

    fn inventory_query() -> ReportQuery {
        ReportFilter {
            low_stock_only: true,
            ..ReportFilter::new(ReportType::Inventory)
        }
        .to_query()
        .unwrap()
    }

    #[test]
    fn test_fetch_sends_query_and_token() {
        let (base, rx) = one_shot_server(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 17\r\nConnection: close\r\n\r\n{\"itemStocks\":[]}",
        );
        let client = HttpClient::new(&base, Some("abc".to_string()), Duration::from_secs(5));

        let payload = client.fetch_report(&inventory_query()).unwrap();
        assert_eq!(payload, serde_json::json!({"itemStocks": []}));

        let request = rx.recv().unwrap();
        assert!(request.starts_with("GET /api/mess/reports/inventory?low_stock=true "));
        assert!(request.to_lowercase().contains("authorization: bearer abc"));
    }

    #[test]
    fn test_unauthorized_invokes_callback() {
        let (base, _rx) = one_shot_server(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&called);
        let client = HttpClient::new(&base, None, Duration::from_secs(5))
            .on_unauthorized(move || flag.set(true));

        let err = client.fetch_report(&inventory_query()).unwrap_err();
        assert!(matches!(err, MessError::Unauthorized));
        assert!(called.get());
    }

    #[test]
    fn test_server_error_carries_message() {
        let (base, _rx) = one_shot_server(
            "HTTP/1.1 400 Bad Request\r\nContent-Type: application/json\r\nContent-Length: 36\r\nConnection: close\r\n\r\n{\"error\":\"Bills already generated\"}\n",
        );
        let client = HttpClient::new(&base, None, Duration::from_secs(5));
        let err = client
            .generate_bills(BillingPeriod::new(3, 2024).unwrap())
            .unwrap_err();
        match err {
            MessError::Server { status, message, .. } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Bills already generated");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(r#"{"detail":"nope"}"#), "nope");
        assert_eq!(error_message("  "), "no details");
        assert_eq!(error_message("Gateway Timeout"), "Gateway Timeout");
    }
}
