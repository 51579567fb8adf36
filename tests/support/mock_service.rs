//! A wiremock stand-in for the lookup service.
//!
//! Sandboxed hosts sometimes forbid binding loopback sockets. Tests that need
//! the mock then skip with a note on stderr, unless
//! `PHONECHECK_REQUIRE_SOCKET_TESTS` is set, in which case they fail.

use std::net::{Ipv4Addr, TcpListener};

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock serves lookups on.
pub const CSV_PATH: &str = "/csv/";

pub struct MockService {
    server: MockServer,
}

impl MockService {
    /// Starts the mock, or returns `None` when this host has no usable loopback.
    pub async fn start() -> Option<Self> {
        if !loopback_available() {
            return None;
        }
        Some(Self {
            server: MockServer::start().await,
        })
    }

    /// Base URL to configure the lookup client with.
    pub fn csv_url(&self) -> String {
        format!("{}{CSV_PATH}", self.server.uri())
    }

    /// The underlying server, for tests that need custom matchers.
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Answers lookups of `number` with `200` and a CSV body.
    pub async fn answer(&self, number: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(CSV_PATH))
            .and(query_param("number", number))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Answers lookups of `number` with a bare non-200 `status`.
    pub async fn fail(&self, number: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(CSV_PATH))
            .and(query_param("number", number))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}

fn loopback_available() -> bool {
    let Err(error) = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)) else {
        return true;
    };

    let test = std::thread::current()
        .name()
        .unwrap_or("<unnamed>")
        .to_string();
    let strict = std::env::var("PHONECHECK_REQUIRE_SOCKET_TESTS")
        .is_ok_and(|value| matches!(value.trim(), "1" | "true" | "yes"));
    assert!(
        !strict,
        "{test}: loopback bind failed ({error}) and PHONECHECK_REQUIRE_SOCKET_TESTS is set"
    );
    eprintln!("{test}: skipped, no mock lookup service (loopback bind failed: {error})");
    false
}
