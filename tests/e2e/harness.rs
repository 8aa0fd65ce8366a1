//! In-process client/service stack for E2E tests

use super::handlers::ArithmeticPromptHandler;
use ascp_client::{AscpClient, AscpClientConfig, ChannelTransport};
use ascp_server_core::{AscpService, AscpServiceBuilder};
use std::sync::Arc;

/// A connected client plus the service behind it
pub struct TestStack {
    pub client: AscpClient,
    pub service: Arc<AscpService>,
}

impl TestStack {
    /// Start a service with the deterministic arithmetic handler and wire a
    /// client to it over the in-process channel transport
    pub fn start() -> Self {
        let service = AscpServiceBuilder::new()
            .with_prompt_handler(Arc::new(ArithmeticPromptHandler))
            .build();
        let (req_tx, frame_rx) = service.clone().attach_channel();
        let transport = ChannelTransport::new(req_tx, frame_rx);
        let client = AscpClient::new(Arc::new(transport), AscpClientConfig::default());
        Self { client, service }
    }
}

/// Initialize test logging once per process
pub fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .ok();
}
