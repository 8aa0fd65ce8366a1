//! ASCP 协议核心库 / ASCP protocol core library
//!
//! 定义会话配置模式、线协议帧与会话事件
//! Defines the session configuration schema, wire frames and session events

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod config;
pub mod events;
pub mod types;

// 重新导出主要类型
pub use config::{
    ConfigError, CustomAgentConfig, HttpServerConfig, LocalServerConfig, McpServerConfig,
    SessionConfig,
};
pub use types::{
    codes, AssistantMessage, CreateSessionReq, CreateSessionResp, DestroySessionReq, Frame,
    MessageData, PromptMessage, RequestFrame, ResponseFrame, ResumeSessionReq, ResumeSessionResp,
    SendMessageReq, SendMessageResp, SessionEvent, WireError,
};

/// 协议版本 / Protocol version
pub const PROTOCOL_VERSION: u32 = 1;

/// 请求ID / Request ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReqId(pub String);

impl ReqId {
    /// 生成新的请求ID / Generate a new request ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// 从字符串创建 / Create from string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// 获取字符串形式 / Get string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ReqId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReqId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
