/*!
* 文件名: events
* 作者: JQQ
* 创建日期: 2026/03/02
* 最后修改日期: 2026/03/02
* 版权: 2023 JQQ. All rights reserved.
* 依赖: tokio
* 描述: 会话事件流 / Session event stream
*/

use crate::error::{AscpClientError, Result};
use ascp::{AssistantMessage, SessionEvent};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// 单个会话的事件流 / Event stream of a single session
///
/// 在传输层广播上按会话ID过滤 / Filters the transport broadcast by session ID
pub struct SessionEvents {
    session_id: String,
    rx: broadcast::Receiver<SessionEvent>,
}

impl SessionEvents {
    pub(crate) fn new(session_id: String, rx: broadcast::Receiver<SessionEvent>) -> Self {
        Self { session_id, rx }
    }

    /// 下一个属于本会话的事件 / The next event belonging to this session
    pub async fn next(&mut self) -> Result<SessionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.session_id() == self.session_id => return Ok(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event subscriber lagged by {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(AscpClientError::backend_unavailable("Event stream closed"))
                }
            }
        }
    }

    /// 排空中间事件直到任意一轮的终端助手消息
    /// Drain intermediate events until any turn's terminal assistant message
    pub async fn final_message(&mut self, timeout_secs: u64) -> Result<AssistantMessage> {
        self.wait_terminal(None, timeout_secs).await
    }

    /// 排空中间事件直到指定一轮的终端助手消息
    /// Drain intermediate events until the given turn's terminal assistant message
    pub async fn final_message_for(
        &mut self,
        turn_id: &str,
        timeout_secs: u64,
    ) -> Result<AssistantMessage> {
        self.wait_terminal(Some(turn_id), timeout_secs).await
    }

    async fn wait_terminal(
        &mut self,
        turn: Option<&str>,
        timeout_secs: u64,
    ) -> Result<AssistantMessage> {
        let drain = async {
            loop {
                match self.next().await? {
                    SessionEvent::AssistantMessage {
                        turn_id, data, ..
                    } if turn.map_or(true, |t| t == turn_id) => {
                        return Ok(AssistantMessage { turn_id, data });
                    }
                    SessionEvent::SessionDestroyed { session_id } => {
                        return Err(AscpClientError::SessionDestroyed(session_id));
                    }
                    event => {
                        debug!("Draining intermediate event: {:?}", event);
                    }
                }
            }
        };

        match tokio::time::timeout(Duration::from_secs(timeout_secs), drain).await {
            Ok(result) => result,
            Err(_) => Err(AscpClientError::Timeout),
        }
    }
}
