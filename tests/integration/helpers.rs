//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use proctor_api::AppState;
use proctor_core::config::AppConfig;
use proctor_realtime::RelayClient;
use proctor_realtime::message::OutboundMessage;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);
const SILENCE_WINDOW: Duration = Duration::from_millis(200);

/// A relay server running on an ephemeral local port.
pub struct TestApp {
    /// Bound address
    pub addr: SocketAddr,
    /// Shared state, for inspecting the registry directly
    pub state: AppState,
}

impl TestApp {
    /// Start a relay with default configuration
    pub async fn spawn() -> Self {
        Self::spawn_with(AppConfig::default()).await
    }

    /// Start a relay with the given configuration
    pub async fn spawn_with(config: AppConfig) -> Self {
        let state = AppState::new(config);
        let app = proctor_api::build_app(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server error");
        });

        Self { addr, state }
    }

    /// WebSocket URL of the relay
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Open a raw client connection
    pub async fn connect(&self) -> RelayClient {
        RelayClient::connect(&self.ws_url())
            .await
            .expect("Failed to connect")
    }

    /// Connect and register as admin, consuming the initial student list
    pub async fn admin(&self) -> (RelayClient, OutboundMessage) {
        let mut client = self.connect().await;
        client.register_admin().await.expect("register admin");
        let list = next_event(&mut client).await;
        (client, list)
    }

    /// Connect and register as student, waiting until the relay has it
    pub async fn student(&self, id: &str, name: &str) -> RelayClient {
        let mut client = self.connect().await;
        client.register_student(id, name).await.expect("register student");
        self.wait_for_student(id, true).await;
        client
    }

    /// Poll the registry until `id` is (or is no longer) registered
    pub async fn wait_for_student(&self, id: &str, registered: bool) {
        let deadline = tokio::time::Instant::now() + EVENT_TIMEOUT;
        while self.state.relay.registry.lookup_student(id).await.is_some() != registered {
            assert!(
                tokio::time::Instant::now() < deadline,
                "registration of {id} did not settle in time"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Next relay event, failing the test if none arrives in time
pub async fn next_event(client: &mut RelayClient) -> OutboundMessage {
    tokio::time::timeout(EVENT_TIMEOUT, client.next_event())
        .await
        .expect("timed out waiting for event")
        .expect("receive failed")
        .expect("connection closed")
}

/// Assert that no event arrives within a short window
pub async fn assert_silent(client: &mut RelayClient) {
    if let Ok(event) = tokio::time::timeout(SILENCE_WINDOW, client.next_event()).await {
        panic!("expected no event, got {event:?}");
    }
}
