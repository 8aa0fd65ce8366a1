/*!
* 文件名: types.rs
* 作者: JQQ
* 创建日期: 2026/03/02
* 最后修改日期: 2026/03/02
* 版权: 2023 JQQ. All rights reserved.
* 依赖: serde
* 描述: ASCP线协议帧与会话事件定义 / ASCP wire frame and session event definitions
*/

use crate::config::SessionConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 线协议错误码 / Wire protocol error codes
pub mod codes {
    pub const CONFIGURATION: &str = "CONFIGURATION";
    pub const SESSION_NOT_FOUND: &str = "SESSION_NOT_FOUND";
    pub const SESSION_DESTROYED: &str = "SESSION_DESTROYED";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const INTERNAL: &str = "INTERNAL";
}

/// 请求帧 / Request frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestFrame {
    /// 请求ID，响应中原样回显 / Request ID, echoed back in the response
    pub req_id: String,
    /// 操作名 / Operation name
    pub op: String,
    /// 操作负载 / Operation payload
    pub payload: Value,
}

/// 线协议错误 / Wire protocol error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireError {
    /// 机器可读错误码 / Machine-readable error code
    pub code: String,
    /// 人类可读错误信息 / Human-readable error message
    pub message: String,
}

/// 响应帧 / Response frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFrame {
    /// 回显的请求ID / Echoed request ID
    pub req_id: String,
    /// 成功时的负载 / Payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// 失败时的错误信息 / Error information on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

impl ResponseFrame {
    /// 构造成功响应 / Build a success response
    pub fn ok(req_id: String, payload: Value) -> Self {
        Self {
            req_id,
            payload: Some(payload),
            error: None,
        }
    }

    /// 构造错误响应 / Build an error response
    pub fn err(req_id: String, code: &str, message: impl Into<String>) -> Self {
        Self {
            req_id,
            payload: None,
            error: Some(WireError {
                code: code.to_string(),
                message: message.into(),
            }),
        }
    }

    /// 是否成功 / Whether the response indicates success
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 线协议帧 / Wire protocol frame
///
/// 换行分隔JSON，每行一帧 / Newline-delimited JSON, one frame per line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    /// 请求 / Request
    Request(RequestFrame),
    /// 响应 / Response
    Response(ResponseFrame),
    /// 通知 / Notification
    Notify { event: SessionEvent },
}

/// 创建会话请求 / Create session request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionReq {
    /// 初始会话配置 / Initial session configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SessionConfig>,
}

/// 创建会话响应 / Create session response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResp {
    /// 新分配的会话ID / Freshly issued session ID
    pub session_id: String,
}

/// 恢复会话请求 / Resume session request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeSessionReq {
    /// 目标会话ID / Target session ID
    pub session_id: String,
    /// 增量合并的会话配置 / Session configuration merged additively
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SessionConfig>,
}

/// 恢复会话响应 / Resume session response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeSessionResp {
    /// 回显的会话ID，与请求逐字节相等 / Echoed session ID, byte-for-byte equal to the request
    pub session_id: String,
}

/// 销毁会话请求 / Destroy session request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroySessionReq {
    pub session_id: String,
}

/// 用户提示消息 / User prompt message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    /// 提示文本 / Prompt text
    pub prompt: String,
}

impl PromptMessage {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// 发送消息请求 / Send message request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageReq {
    pub session_id: String,
    pub prompt: String,
}

/// 发送消息响应（入队确认） / Send message response (enqueue acknowledgment)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResp {
    /// 本轮对话ID / Turn ID for this exchange
    pub turn_id: String,
}

/// 消息数据 / Message data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageData {
    /// 输出文本 / Output text
    pub content: String,
}

/// 助手终端消息 / Terminal assistant message
///
/// 一轮对话的结论性回复 / The conclusive reply of one exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub turn_id: String,
    pub data: MessageData,
}

/// 会话事件 / Session event
///
/// `assistant_message` 是可区分的终端标记，其余为中间事件
/// `assistant_message` is the distinguishable terminal marker, the rest are intermediate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// 部分输出文本 / Partial output text
    MessageDelta {
        session_id: String,
        turn_id: String,
        content: String,
    },
    /// MCP工具调用 / MCP tool invocation
    ToolCall {
        session_id: String,
        turn_id: String,
        server: String,
        tool: String,
    },
    /// 终端助手消息 / Terminal assistant message
    AssistantMessage {
        session_id: String,
        turn_id: String,
        data: MessageData,
    },
    /// 会话已销毁 / Session destroyed
    SessionDestroyed { session_id: String },
}

impl SessionEvent {
    /// 获取所属会话ID / Get the owning session ID
    pub fn session_id(&self) -> &str {
        match self {
            SessionEvent::MessageDelta { session_id, .. } => session_id,
            SessionEvent::ToolCall { session_id, .. } => session_id,
            SessionEvent::AssistantMessage { session_id, .. } => session_id,
            SessionEvent::SessionDestroyed { session_id } => session_id,
        }
    }

    /// 是否为一轮对话的终端事件 / Whether this terminates an exchange
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::AssistantMessage { .. })
    }
}
