//! Common test utilities for client integration tests

#![allow(dead_code)]

use ascp_client::{AscpClient, AscpClientConfig, ChannelTransport};
use ascp_server_core::{AscpService, AscpServiceBuilder};
use std::sync::Arc;

/// Initialize test logging once per process
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .ok();
}

/// Wire a client to an in-process session service over the channel transport
pub fn test_stack() -> (AscpClient, Arc<AscpService>) {
    let service = AscpServiceBuilder::new().build();
    let (req_tx, frame_rx) = service.clone().attach_channel();
    let transport = ChannelTransport::new(req_tx, frame_rx);
    let client = AscpClient::new(Arc::new(transport), AscpClientConfig::default());
    (client, service)
}
