//! Mock-server startup for sandboxes without loopback networking.
//!
//! Wiremock needs a localhost listener. Where none can be bound the calling
//! test returns early, unless `SHELVER_REQUIRE_SOCKET_TESTS` is set, in which
//! case it fails.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_VAR: &str = "SHELVER_REQUIRE_SOCKET_TESTS";

fn loopback_required() -> bool {
    std::env::var(REQUIRE_VAR).is_ok_and(|v| matches!(v.trim(), "1" | "true" | "yes"))
}

/// Starts a mock server, or returns `None` when loopback sockets are unavailable.
#[track_caller]
pub fn start_mock_server_or_skip() -> impl Future<Output = Option<MockServer>> {
    let caller = Location::caller();
    let available = TcpListener::bind("127.0.0.1:0").is_ok();

    if !available {
        assert!(
            !loopback_required(),
            "{caller}: no loopback socket and {REQUIRE_VAR} is set"
        );
        eprintln!("{caller}: no loopback socket, skipping mock-server test");
    }

    async move {
        if available {
            Some(MockServer::start().await)
        } else {
            None
        }
    }
}
