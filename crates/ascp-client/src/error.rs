/*!
* 文件名: error
* 作者: JQQ
* 创建日期: 2026/03/02
* 最后修改日期: 2026/03/02
* 版权: 2023 JQQ. All rights reserved.
* 依赖: thiserror
* 描述: ASCP客户端错误类型定义 / ASCP client error type definitions
*/

use ascp::{codes, WireError};
use thiserror::Error;

/// ASCP客户端错误类型
#[derive(Error, Debug)]
pub enum AscpClientError {
    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("会话不存在: {0}")]
    SessionNotFound(String),

    #[error("会话已销毁: {0}")]
    SessionDestroyed(String),

    #[error("后端不可用: {0}")]
    BackendUnavailable(String),

    #[error("超时错误")]
    Timeout,

    #[error("协议错误: session_id不匹配 (期望: {expected}, 实际: {actual})")]
    SessionIdMismatch { expected: String, actual: String },

    #[error("后端错误: {code}: {message}")]
    Backend { code: String, message: String },

    #[error("序列化错误: {0}")]
    Serialization(#[from] Box<serde_json::Error>),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl AscpClientError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 将后端报告的线协议错误逐字映射为客户端错误
    /// Map a backend-reported wire error verbatim to a client error
    pub fn from_wire(err: WireError) -> Self {
        match err.code.as_str() {
            codes::CONFIGURATION => Self::Configuration(err.message),
            codes::SESSION_NOT_FOUND => Self::SessionNotFound(err.message),
            codes::SESSION_DESTROYED => Self::SessionDestroyed(err.message),
            _ => Self::Backend {
                code: err.code,
                message: err.message,
            },
        }
    }
}

// 手动实现From trait以保持兼容性 / Manual From implementations for compatibility
impl From<serde_json::Error> for AscpClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(Box::new(err))
    }
}

impl From<ascp::ConfigError> for AscpClientError {
    fn from(err: ascp::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AscpClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_error_mapping() {
        let err = AscpClientError::from_wire(WireError {
            code: "SESSION_NOT_FOUND".to_string(),
            message: "no such session".to_string(),
        });
        assert!(matches!(err, AscpClientError::SessionNotFound(_)));

        let err = AscpClientError::from_wire(WireError {
            code: "SOMETHING_ELSE".to_string(),
            message: "m".to_string(),
        });
        match err {
            AscpClientError::Backend { code, .. } => assert_eq!(code, "SOMETHING_ELSE"),
            _ => panic!("unknown codes must surface verbatim"),
        }
    }

    #[test]
    fn test_config_error_conversion() {
        let err: AscpClientError = ascp::ConfigError::DuplicateAgent("a".to_string()).into();
        assert!(matches!(err, AscpClientError::Configuration(_)));
    }
}
