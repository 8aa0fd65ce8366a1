/*!
* 文件名: transport
* 作者: JQQ
* 创建日期: 2026/03/02
* 最后修改日期: 2026/03/02
* 版权: 2023 JQQ. All rights reserved.
* 依赖: tokio, tokio-util
* 描述: ASCP客户端传输层实现 / ASCP client transport layer implementation
*/

use crate::error::{AscpClientError, Result};
use ascp::{Frame, ReqId, RequestFrame, ResponseFrame, SessionEvent};
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{debug, error, info, warn};

/// 通知广播通道容量 / Notify broadcast channel capacity
const NOTIFY_CHANNEL_CAPACITY: usize = 256;

/// ASCP传输层抽象 / ASCP transport abstraction
///
/// 请求-响应调用加通知事件订阅 / Request-response calls plus notify event subscription
#[async_trait]
pub trait Transport: Send + Sync {
    /// 发送请求并等待响应 / Send a request and await the response
    async fn call(&self, op: &str, payload: Value, timeout_secs: u64) -> Result<Value>;

    /// 订阅通知事件 / Subscribe to notify events
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// 关闭传输 / Shut the transport down
    async fn shutdown(&self) -> Result<()>;
}

/// 帧路由器 / Frame router
///
/// 按req_id关联响应，通知事件走广播扇出
/// Correlates responses by req_id, fans notify events out over a broadcast
pub(crate) struct FrameRouter {
    pending: DashMap<String, oneshot::Sender<ResponseFrame>>,
    notify_tx: broadcast::Sender<SessionEvent>,
}

impl FrameRouter {
    fn new() -> Self {
        let (notify_tx, _) = broadcast::channel(NOTIFY_CHANNEL_CAPACITY);
        Self {
            pending: DashMap::new(),
            notify_tx,
        }
    }

    fn register(&self, req_id: &str) -> oneshot::Receiver<ResponseFrame> {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(req_id.to_string(), tx);
        rx
    }

    fn discard(&self, req_id: &str) {
        self.pending.remove(req_id);
    }

    fn route(&self, frame: Frame) {
        match frame {
            Frame::Response(resp) => {
                if let Some((_, tx)) = self.pending.remove(&resp.req_id) {
                    let _ = tx.send(resp);
                } else {
                    warn!("Dropping response for unknown req_id: {}", resp.req_id);
                }
            }
            Frame::Notify { event } => {
                // 无订阅者时发送失败，属正常情况
                let _ = self.notify_tx.send(event);
            }
            Frame::Request(req) => {
                warn!("Unexpected request frame from backend: {}", req.op);
            }
        }
    }

    /// 连接断开时让所有挂起调用立即失败
    /// Fail every pending call immediately when the connection drops
    fn close_all(&self) {
        self.pending.clear();
    }
}

/// 等待关联响应并映射错误 / Await the correlated response and map errors
async fn await_response(
    router: &FrameRouter,
    req_id: &str,
    op: &str,
    rx: oneshot::Receiver<ResponseFrame>,
    timeout_secs: u64,
) -> Result<Value> {
    match tokio::time::timeout(Duration::from_secs(timeout_secs), rx).await {
        Ok(Ok(resp)) => match resp.error {
            Some(err) => Err(AscpClientError::from_wire(err)),
            None => Ok(resp.payload.unwrap_or(Value::Null)),
        },
        Ok(Err(_)) => Err(AscpClientError::backend_unavailable(
            "Connection closed before reply",
        )),
        Err(_) => {
            router.discard(req_id);
            error!("Timeout while calling op: {}", op);
            Err(AscpClientError::Timeout)
        }
    }
}

/// 子进程stdio传输层 / Child-process stdio transport
///
/// 以子进程方式启动后端，在其stdin/stdout上传输换行分隔JSON帧
/// Spawns the backend as a child process and speaks newline-delimited JSON
/// frames over its stdin/stdout
pub struct StdioTransport {
    router: Arc<FrameRouter>,
    writer: Mutex<Option<FramedWrite<ChildStdin, LinesCodec>>>,
    child: Mutex<Option<Child>>,
}

impl std::fmt::Debug for StdioTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioTransport").finish_non_exhaustive()
    }
}

impl StdioTransport {
    /// 启动后端进程并建立传输 / Spawn the backend process and establish the transport
    pub async fn spawn(command: &str, args: &[String]) -> Result<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            // 后端日志走stderr，stdout属于协议
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        debug!("Starting backend: {} {:?}", command, args);

        let mut child = cmd.spawn().map_err(|e| {
            AscpClientError::backend_unavailable(format!("Failed to start backend: {}", e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AscpClientError::internal("Backend stdin not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AscpClientError::internal("Backend stdout not captured"))?;

        let router = Arc::new(FrameRouter::new());

        // 读取任务：逐行解析帧并路由 / Reader task: parse frames line by line and route them
        let reader_router = router.clone();
        tokio::spawn(async move {
            let mut reader = FramedRead::new(stdout, LinesCodec::new());
            while let Some(line) = reader.next().await {
                match line {
                    Ok(line) => match serde_json::from_str::<Frame>(&line) {
                        Ok(frame) => reader_router.route(frame),
                        Err(e) => warn!("Dropping malformed frame: {}", e),
                    },
                    Err(e) => {
                        error!("Failed to read from backend: {}", e);
                        break;
                    }
                }
            }
            info!("Backend closed its stdout");
            reader_router.close_all();
        });

        info!("Connected to session backend: {}", command);

        Ok(Self {
            router,
            writer: Mutex::new(Some(FramedWrite::new(stdin, LinesCodec::new()))),
            child: Mutex::new(Some(child)),
        })
    }

    async fn send_frame(&self, frame: &Frame) -> Result<()> {
        let line = serde_json::to_string(frame)?;
        let mut writer = self.writer.lock().await;
        let writer = writer
            .as_mut()
            .ok_or_else(|| AscpClientError::backend_unavailable("Transport already shut down"))?;
        writer.send(line).await.map_err(|e| {
            AscpClientError::backend_unavailable(format!("Failed to write to backend: {}", e))
        })
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn call(&self, op: &str, payload: Value, timeout_secs: u64) -> Result<Value> {
        let req_id = ReqId::new();
        debug!("Calling op: {} with timeout {}s", op, timeout_secs);

        let rx = self.router.register(req_id.as_str());
        let frame = Frame::Request(RequestFrame {
            req_id: req_id.as_str().to_string(),
            op: op.to_string(),
            payload,
        });

        if let Err(e) = self.send_frame(&frame).await {
            self.router.discard(req_id.as_str());
            return Err(e);
        }

        await_response(&self.router, req_id.as_str(), op, rx, timeout_secs).await
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.router.notify_tx.subscribe()
    }

    async fn shutdown(&self) -> Result<()> {
        // 关闭stdin通知后端退出 / Close stdin so the backend exits
        self.writer.lock().await.take();

        let mut child = self.child.lock().await;
        if let Some(mut process) = child.take() {
            drop(child);

            // 等待进程退出或强制杀死 / Wait for process exit or force kill
            match tokio::time::timeout(Duration::from_secs(5), process.wait()).await {
                Ok(Ok(status)) => {
                    debug!("Backend exited with status: {}", status);
                }
                Ok(Err(e)) => {
                    error!("Error waiting for backend: {}", e);
                }
                Err(_) => {
                    warn!("Backend did not exit within timeout, killing it");
                    if let Err(e) = process.kill().await {
                        error!("Failed to kill backend: {}", e);
                    }
                }
            }
        }

        info!("Stdio transport shut down");
        Ok(())
    }
}

/// 进程内通道传输层 / In-process channel transport
///
/// 与同进程内的会话服务以帧通道配对，用于内嵌与测试
/// Pairs with an in-process session service over frame channels, for
/// embedding and tests
pub struct ChannelTransport {
    router: Arc<FrameRouter>,
    requests: std::sync::Mutex<Option<mpsc::UnboundedSender<RequestFrame>>>,
}

impl ChannelTransport {
    /// 由服务端帧通道建立传输 / Build the transport from service frame channels
    pub fn new(
        requests: mpsc::UnboundedSender<RequestFrame>,
        mut frames: mpsc::UnboundedReceiver<Frame>,
    ) -> Self {
        let router = Arc::new(FrameRouter::new());

        let reader_router = router.clone();
        tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                reader_router.route(frame);
            }
            debug!("Session service closed its frame channel");
            reader_router.close_all();
        });

        Self {
            router,
            requests: std::sync::Mutex::new(Some(requests)),
        }
    }

    fn send_request(&self, req: RequestFrame) -> Result<()> {
        let guard = self
            .requests
            .lock()
            .map_err(|_| AscpClientError::internal("Request channel lock poisoned"))?;
        let tx = guard
            .as_ref()
            .ok_or_else(|| AscpClientError::backend_unavailable("Transport already shut down"))?;
        tx.send(req)
            .map_err(|_| AscpClientError::backend_unavailable("Session service dropped"))
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn call(&self, op: &str, payload: Value, timeout_secs: u64) -> Result<Value> {
        let req_id = ReqId::new();
        debug!("Calling op: {} with timeout {}s", op, timeout_secs);

        let rx = self.router.register(req_id.as_str());
        let req = RequestFrame {
            req_id: req_id.as_str().to_string(),
            op: op.to_string(),
            payload,
        };

        if let Err(e) = self.send_request(req) {
            self.router.discard(req_id.as_str());
            return Err(e);
        }

        await_response(&self.router, req_id.as_str(), op, rx, timeout_secs).await
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.router.notify_tx.subscribe()
    }

    async fn shutdown(&self) -> Result<()> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.take();
        }
        Ok(())
    }
}
