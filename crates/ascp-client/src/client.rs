/*!
* 文件名: client
* 作者: JQQ
* 创建日期: 2026/03/02
* 最后修改日期: 2026/03/02
* 版权: 2023 JQQ. All rights reserved.
* 依赖: tokio
* 描述: ASCP会话生命周期客户端实现 / ASCP session lifecycle client implementation
*/

use crate::config::AscpClientConfig;
use crate::error::{AscpClientError, Result};
use crate::session::Session;
use crate::transport::{StdioTransport, Transport};
use ascp::events::{SERVER_CREATE_SESSION, SERVER_RESUME_SESSION};
use ascp::{
    CreateSessionReq, CreateSessionResp, ResumeSessionReq, ResumeSessionResp, SessionConfig,
};
use std::sync::Arc;
use tracing::info;

/// ASCP会话生命周期客户端
pub struct AscpClient {
    transport: Arc<dyn Transport>,
    config: AscpClientConfig,
}

impl AscpClient {
    /// 基于现有传输创建客户端 / Create a client over an existing transport
    pub fn new(transport: Arc<dyn Transport>, config: AscpClientConfig) -> Self {
        Self { transport, config }
    }

    /// 启动后端进程并创建客户端 / Spawn the backend process and create a client
    pub async fn connect_stdio(
        command: &str,
        args: &[String],
        config: AscpClientConfig,
    ) -> Result<Self> {
        let transport = StdioTransport::spawn(command, args).await?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// 创建新会话 / Create a new session
    ///
    /// 配置先在本地做结构校验，不合法时在任何I/O之前报错；
    /// 失败时绝不返回可用的会话句柄。
    /// The configuration is validated locally before any I/O; a failed call
    /// never yields a usable session handle.
    pub async fn create_session(&self, config: Option<SessionConfig>) -> Result<Session> {
        if let Some(cfg) = &config {
            cfg.validate()?;
        }

        let req = CreateSessionReq { config };
        let resp = self
            .transport
            .call(
                SERVER_CREATE_SESSION,
                serde_json::to_value(req)?,
                self.config.default_timeout,
            )
            .await?;
        let resp: CreateSessionResp = serde_json::from_value(resp)?;

        info!("Created session: {}", resp.session_id);
        Ok(Session::new(
            resp.session_id,
            self.transport.clone(),
            self.config.clone(),
        ))
    }

    /// 恢复既有会话 / Resume an existing session
    ///
    /// 配置增量合并进会话既有配置；返回句柄的session_id与入参逐字节相等
    /// The configuration merges additively into the session's existing one;
    /// the returned handle's session_id equals the input byte-for-byte
    pub async fn resume_session(
        &self,
        session_id: &str,
        config: Option<SessionConfig>,
    ) -> Result<Session> {
        if let Some(cfg) = &config {
            cfg.validate()?;
        }

        let req = ResumeSessionReq {
            session_id: session_id.to_string(),
            config,
        };
        let resp = self
            .transport
            .call(
                SERVER_RESUME_SESSION,
                serde_json::to_value(req)?,
                self.config.default_timeout,
            )
            .await?;
        let resp: ResumeSessionResp = serde_json::from_value(resp)?;

        // 校验回显的会话ID / Verify the echoed session ID
        if resp.session_id != session_id {
            return Err(AscpClientError::SessionIdMismatch {
                expected: session_id.to_string(),
                actual: resp.session_id,
            });
        }

        info!("Resumed session: {}", session_id);
        Ok(Session::new(
            resp.session_id,
            self.transport.clone(),
            self.config.clone(),
        ))
    }

    /// 关闭底层传输 / Shut the underlying transport down
    pub async fn shutdown(&self) -> Result<()> {
        self.transport.shutdown().await
    }
}

impl Clone for AscpClient {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            config: self.config.clone(),
        }
    }
}
