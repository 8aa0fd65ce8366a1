//! ASCP 会话服务核心库 / ASCP session service core library
//!
//! 提供基于 Tokio 的会话生命周期后端：会话存储与增量配置合并、
//! 按会话的轮次工作器、MCP 服务器进程监督与帧分发
//! Provides the Tokio-based session lifecycle backend: session store with
//! additive config merge, per-session turn workers, MCP server process
//! supervision and frame dispatch

pub mod handler;
pub mod server;
pub mod session;
pub mod supervisor;

// 重新导出主要类型
pub use handler::{AscpService, EchoPromptHandler, PromptHandler};
pub use server::AscpServiceBuilder;
pub use session::{SessionError, SessionRecord, SessionState, SessionStore, StoreStats};
pub use supervisor::McpSupervisor;

/// ASCP 服务端预lude
/// ASCP server prelude
pub mod prelude {
    pub use crate::handler::*;
    pub use crate::server::*;
    pub use crate::session::*;
    pub use crate::supervisor::*;
}
