//! Mock CDN startup for sandboxes that forbid loopback sockets.
//!
//! Compiled into the unit tests and, by path, into `tests/support`.
//! Tests return early on `None`. `HARVESTER_REQUIRE_SOCKET_TESTS=1` turns
//! the skip into a panic.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "HARVESTER_REQUIRE_SOCKET_TESTS";

fn flag_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| ["1", "true", "yes"].iter().any(|on| v.eq_ignore_ascii_case(on)))
}

/// Starts a wiremock server, or returns `None` when no loopback port can be
/// bound.
///
/// # Panics
///
/// Panics instead of skipping when `HARVESTER_REQUIRE_SOCKET_TESTS` is set.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind(("127.0.0.1", 0)).is_ok() {
        return Some(MockServer::start().await);
    }

    // libtest names each test thread after its test.
    let test = std::thread::current()
        .name()
        .unwrap_or("<unnamed test>")
        .to_string();
    let required = flag_enabled(std::env::var(REQUIRE_ENV).ok().as_deref());
    assert!(
        !required,
        "{test}: no loopback socket available and {REQUIRE_ENV} is set"
    );
    eprintln!("{test}: skipped, no loopback socket available (set {REQUIRE_ENV}=1 to fail)");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_flag_values() {
        for on in ["1", "true", "TRUE", "yes"] {
            assert!(flag_enabled(Some(on)), "{on}");
        }
        for off in ["0", "false", "", "maybe"] {
            assert!(!flag_enabled(Some(off)), "{off}");
        }
        assert!(!flag_enabled(None));
    }
}
