//! # A2S-ASCP Rust SDK
//!
//! A Rust implementation of the A2S-ASCP protocol, providing the session
//! lifecycle client and the backend session service for agent systems with
//! MCP server and custom agent configuration.
//!
//! ## Features
//!
//! - **client** - Session lifecycle client for driving a session backend
//! - **server** - Session service implementation with stdio frame transport
//! - **full** - Enables all features (default when using `--all-features`)
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! a2s-ascp = { version = "0.1.0", features = ["client"] }
//! ```
//!
//! ## Example
//!
//! ```rust,no_run,ignore
//! // Add features to your Cargo.toml:
//! // a2s-ascp = { version = "0.1.0", features = ["client"] }
//!
//! #[cfg(feature = "client")]
//! use a2s_ascp::ascp_client::{AscpClient, AscpClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Your ASCP application code here
//!     Ok(())
//! }
//! ```

// Re-export core protocol types (always available)
pub use ascp::*;

// Re-export optional components based on features
#[cfg(feature = "client")]
pub use ascp_client;

#[cfg(feature = "server")]
pub use ascp_server_core;

#[cfg(feature = "server")]
pub use ascp_server_stdio;

// Re-export commonly used dependencies for convenience
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tokio;
pub use tracing;

#[cfg(test)]
mod tests {
    #[test]
    fn protocol_reexports_resolve() {
        let req_id = crate::ReqId::new();
        assert!(!req_id.as_str().is_empty());
    }
}
