/*!
* 文件名: session
* 作者: JQQ
* 创建日期: 2026/03/02
* 最后修改日期: 2026/03/02
* 版权: 2023 JQQ. All rights reserved.
* 依赖: tokio
* 描述: ASCP会话句柄实现 / ASCP session handle implementation
*/

use crate::config::AscpClientConfig;
use crate::error::{AscpClientError, Result};
use crate::events::SessionEvents;
use crate::transport::Transport;
use ascp::events::{SERVER_DESTROY_SESSION, SERVER_SEND_MESSAGE};
use ascp::{AssistantMessage, DestroySessionReq, PromptMessage, SendMessageReq, SendMessageResp};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// ASCP会话句柄 / ASCP session handle
///
/// 生命周期：创建 -> 活跃（消息交换、可经恢复扩展配置）-> 销毁（终态）
/// Lifecycle: created -> active (message exchange, config extendable via
/// resume) -> destroyed (terminal)
pub struct Session {
    session_id: String,
    transport: Arc<dyn Transport>,
    config: AscpClientConfig,
    destroyed: Arc<AtomicBool>,
}

impl Session {
    pub(crate) fn new(
        session_id: String,
        transport: Arc<dyn Transport>,
        config: AscpClientConfig,
    ) -> Self {
        Self {
            session_id,
            transport,
            config,
            destroyed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 稳定的会话ID，恢复后逐字节不变 / Stable session ID, byte-for-byte across resumes
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// 本句柄是否已销毁 / Whether this handle has been destroyed
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_destroyed() {
            return Err(AscpClientError::SessionDestroyed(self.session_id.clone()));
        }
        Ok(())
    }

    /// 订阅本会话的事件流 / Subscribe to this session's event stream
    pub fn subscribe(&self) -> SessionEvents {
        SessionEvents::new(self.session_id.clone(), self.transport.subscribe())
    }

    /// 发送提示消息，仅入队即返回 / Enqueue a prompt, return without waiting for the reply
    ///
    /// 返回本轮对话ID，可用于在事件流中定位终端回复
    /// Returns the turn ID, usable to locate the terminal reply in the event stream
    pub async fn send(&self, message: PromptMessage) -> Result<String> {
        self.ensure_active()?;

        let req = SendMessageReq {
            session_id: self.session_id.clone(),
            prompt: message.prompt,
        };
        let resp = self
            .transport
            .call(
                SERVER_SEND_MESSAGE,
                serde_json::to_value(req)?,
                self.config.default_timeout,
            )
            .await?;
        let resp: SendMessageResp = serde_json::from_value(resp)?;

        debug!(
            "Enqueued prompt on session {}: turn {}",
            self.session_id, resp.turn_id
        );
        Ok(resp.turn_id)
    }

    /// 发送提示消息并挂起等待终端回复 / Enqueue a prompt and suspend until the terminal reply
    ///
    /// 同一会话上的回复按提示发送顺序到达
    /// Replies on one session arrive in the order the prompts were sent
    pub async fn send_and_wait(&self, message: PromptMessage) -> Result<AssistantMessage> {
        self.ensure_active()?;

        // 先订阅再发送，避免错过回复 / Subscribe before sending so the reply cannot be missed
        let mut events = self.subscribe();
        let turn_id = self.send(message).await?;
        events
            .final_message_for(&turn_id, self.config.turn_timeout)
            .await
    }

    /// 销毁会话，释放后端状态与其MCP服务器进程
    /// Destroy the session, releasing backend state and its MCP server processes
    ///
    /// 终态：销毁后本句柄上的任何操作都以SessionDestroyed失败
    /// Terminal: after destroy every operation on this handle fails with SessionDestroyed
    pub async fn destroy(&self) -> Result<()> {
        self.ensure_active()?;

        let req = DestroySessionReq {
            session_id: self.session_id.clone(),
        };
        self.transport
            .call(
                SERVER_DESTROY_SESSION,
                serde_json::to_value(req)?,
                self.config.default_timeout,
            )
            .await?;

        self.destroyed.store(true, Ordering::SeqCst);
        info!("Destroyed session: {}", self.session_id);
        Ok(())
    }
}

// 实现Clone以便多处驱动同一会话 / Clone so several callers can drive one session
impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            session_id: self.session_id.clone(),
            transport: self.transport.clone(),
            config: self.config.clone(),
            destroyed: self.destroyed.clone(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
