//! ASCP 服务构建器与通道接入 / ASCP service builder and channel attachment

use crate::handler::{AscpService, EchoPromptHandler, PromptHandler};
use crate::session::SessionStore;
use crate::supervisor::McpSupervisor;
use ascp::{Frame, RequestFrame};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

/// ASCP 服务构建器
/// ASCP service builder
pub struct AscpServiceBuilder {
    /// 会话存储
    store: Option<Arc<SessionStore>>,
    /// 进程监督器
    supervisor: Option<Arc<McpSupervisor>>,
    /// 提示处理器
    prompt_handler: Option<Arc<dyn PromptHandler>>,
}

impl Default for AscpServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AscpServiceBuilder {
    /// 创建新的服务构建器
    /// Create new service builder
    pub fn new() -> Self {
        Self {
            store: None,
            supervisor: None,
            prompt_handler: None,
        }
    }

    /// 设置会话存储
    /// Set session store
    pub fn with_store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 设置进程监督器
    /// Set process supervisor
    pub fn with_supervisor(mut self, supervisor: Arc<McpSupervisor>) -> Self {
        self.supervisor = Some(supervisor);
        self
    }

    /// 设置提示处理器
    /// Set prompt handler
    pub fn with_prompt_handler(mut self, handler: Arc<dyn PromptHandler>) -> Self {
        self.prompt_handler = Some(handler);
        self
    }

    /// 构建服务
    /// Build the service
    pub fn build(self) -> Arc<AscpService> {
        // 使用默认值
        let store = self.store.unwrap_or_else(|| Arc::new(SessionStore::new()));
        let supervisor = self
            .supervisor
            .unwrap_or_else(|| Arc::new(McpSupervisor::new()));
        let prompt_handler = self
            .prompt_handler
            .unwrap_or_else(|| Arc::new(EchoPromptHandler::new()));

        let service = Arc::new(AscpService::new(store, supervisor, prompt_handler));
        info!("ASCP service built successfully");
        service
    }
}

impl AscpService {
    /// 以进程内帧通道对外提供服务
    /// Serve the frame protocol over an in-process channel pair
    ///
    /// 返回请求发送端与帧接收端，供 `ChannelTransport` 配对使用。
    /// 请求按到达顺序处理；通知事件独立转发。
    /// Returns the request sender and frame receiver for a `ChannelTransport`
    /// to pair with. Requests are handled in arrival order; notify events are
    /// forwarded independently.
    pub fn attach_channel(
        self: Arc<Self>,
    ) -> (
        mpsc::UnboundedSender<RequestFrame>,
        mpsc::UnboundedReceiver<Frame>,
    ) {
        let (req_tx, mut req_rx) = mpsc::unbounded_channel::<RequestFrame>();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<Frame>();

        // 事件转发任务 / Event forwarding task
        let mut events = self.subscribe_events();
        let event_frame_tx = frame_tx.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if event_frame_tx.send(Frame::Notify { event }).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!("Channel event forwarder lagged by {}", n);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        // 请求处理任务 / Request handling task
        let service = self;
        tokio::spawn(async move {
            while let Some(req) = req_rx.recv().await {
                let resp = service.handle_request(req).await;
                if frame_tx.send(Frame::Response(resp)).is_err() {
                    break;
                }
            }
            debug!("Channel request loop ended");
        });

        (req_tx, frame_rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascp::events::SERVER_CREATE_SESSION;
    use ascp::ReqId;

    #[tokio::test]
    async fn test_service_builder_defaults() {
        let service = AscpServiceBuilder::new().build();
        assert_eq!(service.store().stats().total, 0);
    }

    #[tokio::test]
    async fn test_service_builder_with_store_injection() {
        let store = Arc::new(SessionStore::new());
        let service = AscpServiceBuilder::new().with_store(store.clone()).build();
        assert!(Arc::ptr_eq(service.store(), &store));
    }

    #[tokio::test]
    async fn test_attach_channel_roundtrip() {
        let service = AscpServiceBuilder::new().build();
        let (req_tx, mut frame_rx) = service.clone().attach_channel();

        req_tx
            .send(RequestFrame {
                req_id: ReqId::new().as_str().to_string(),
                op: SERVER_CREATE_SESSION.to_string(),
                payload: serde_json::json!({}),
            })
            .unwrap();

        match frame_rx.recv().await.unwrap() {
            Frame::Response(resp) => {
                assert!(resp.is_ok());
                assert!(resp.payload.unwrap()["session_id"].is_string());
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}
