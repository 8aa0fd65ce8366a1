//! 帧分发与轮次处理模块 / Frame dispatch and turn processing module

use crate::session::{SessionError, SessionRecord, SessionStore};
use crate::supervisor::McpSupervisor;
use ascp::events::{
    SERVER_CREATE_SESSION, SERVER_DESTROY_SESSION, SERVER_RESUME_SESSION, SERVER_SEND_MESSAGE,
};
use ascp::{
    codes, CreateSessionReq, CreateSessionResp, DestroySessionReq, MessageData, RequestFrame,
    ResponseFrame, ResumeSessionReq, ResumeSessionResp, SendMessageReq, SendMessageResp,
    SessionEvent,
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// 事件广播通道容量 / Event broadcast channel capacity
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 256;

/// 中间delta事件的切块长度（字符） / Chunk length of intermediate delta events (chars)
const DELTA_CHUNK_CHARS: usize = 24;

/// 提示处理器 / Prompt handler
///
/// 为一轮提示生成助手回复文本。真实部署委托给模型推理，
/// 测试注入确定性实现。
/// Produces the assistant reply text for one prompt. Real deployments
/// delegate to model inference, tests plug in a deterministic implementation.
#[async_trait]
pub trait PromptHandler: Send + Sync {
    async fn complete(&self, session: &SessionRecord, prompt: &str) -> String;
}

/// 回显处理器（内置默认） / Echo handler (built-in default)
pub struct EchoPromptHandler {
    prefix: String,
}

impl EchoPromptHandler {
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for EchoPromptHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromptHandler for EchoPromptHandler {
    async fn complete(&self, _session: &SessionRecord, prompt: &str) -> String {
        format!("{}{}", self.prefix, prompt)
    }
}

/// 一轮待处理的提示 / One queued prompt
struct TurnJob {
    turn_id: String,
    prompt: String,
}

/// 操作结果：成功负载或(错误码, 信息) / Op result: payload or (code, message)
type OpResult = Result<Value, (&'static str, String)>;

/// ASCP 会话服务
///
/// 按操作名分发请求帧；每个会话一个工作器任务，
/// 轮次严格按入队顺序处理（同会话回复不乱序）
/// Dispatches request frames by op name; one worker task per session, turns
/// processed strictly in enqueue order (replies on one session never reorder)
pub struct AscpService {
    store: Arc<SessionStore>,
    supervisor: Arc<McpSupervisor>,
    prompt_handler: Arc<dyn PromptHandler>,
    events: broadcast::Sender<SessionEvent>,
    workers: DashMap<String, mpsc::UnboundedSender<TurnJob>>,
}

impl AscpService {
    pub(crate) fn new(
        store: Arc<SessionStore>,
        supervisor: Arc<McpSupervisor>,
        prompt_handler: Arc<dyn PromptHandler>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            supervisor,
            prompt_handler,
            events,
            workers: DashMap::new(),
        }
    }

    /// 会话存储 / Session store
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// 进程监督器 / Process supervisor
    pub fn supervisor(&self) -> &Arc<McpSupervisor> {
        &self.supervisor
    }

    /// 订阅会话事件 / Subscribe to session events
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// 分发一个请求帧并生成响应帧
    /// Dispatch one request frame and produce the response frame
    pub async fn handle_request(&self, req: RequestFrame) -> ResponseFrame {
        debug!("Handling op: {} (req_id {})", req.op, req.req_id);

        let result = match req.op.as_str() {
            SERVER_CREATE_SESSION => self.handle_create(req.payload).await,
            SERVER_RESUME_SESSION => self.handle_resume(req.payload).await,
            SERVER_DESTROY_SESSION => self.handle_destroy(req.payload).await,
            SERVER_SEND_MESSAGE => self.handle_send(req.payload).await,
            other => Err((codes::BAD_REQUEST, format!("Unknown op: {}", other))),
        };

        match result {
            Ok(payload) => ResponseFrame::ok(req.req_id, payload),
            Err((code, message)) => {
                debug!("Op failed: {} ({})", message, code);
                ResponseFrame::err(req.req_id, code, message)
            }
        }
    }

    async fn handle_create(&self, payload: Value) -> OpResult {
        let req: CreateSessionReq = parse_payload(payload)?;
        let record = self.store.create(req.config).map_err(map_session_error)?;

        self.supervisor
            .spawn_for_session(&record.session_id, record.config.mcp_servers.iter());
        self.start_worker(&record.session_id);

        info!("Session created: {}", record.session_id);
        respond(CreateSessionResp {
            session_id: record.session_id,
        })
    }

    async fn handle_resume(&self, payload: Value) -> OpResult {
        let req: ResumeSessionReq = parse_payload(payload)?;
        let (record, new_servers) = self
            .store
            .resume(&req.session_id, req.config)
            .map_err(map_session_error)?;

        // 只为本次新增的服务器启动进程 / Spawn processes only for servers this call added
        self.supervisor.spawn_for_session(
            &record.session_id,
            record
                .config
                .mcp_servers
                .iter()
                .filter(|(name, _)| new_servers.iter().any(|n| n == *name)),
        );
        if !self.workers.contains_key(&record.session_id) {
            self.start_worker(&record.session_id);
        }

        info!("Session resumed: {}", record.session_id);
        respond(ResumeSessionResp {
            session_id: record.session_id,
        })
    }

    async fn handle_destroy(&self, payload: Value) -> OpResult {
        let req: DestroySessionReq = parse_payload(payload)?;
        self.store
            .destroy(&req.session_id)
            .map_err(map_session_error)?;

        // 先停工作器并回收进程，再写响应 / Stop the worker and reclaim processes before replying
        self.workers.remove(&req.session_id);
        self.supervisor.kill_session(&req.session_id).await;
        let _ = self.events.send(SessionEvent::SessionDestroyed {
            session_id: req.session_id.clone(),
        });

        info!("Session destroyed: {}", req.session_id);
        Ok(serde_json::json!({}))
    }

    async fn handle_send(&self, payload: Value) -> OpResult {
        let req: SendMessageReq = parse_payload(payload)?;
        let turn_id = self
            .store
            .record_turn(&req.session_id)
            .map_err(map_session_error)?;

        let enqueued = self
            .workers
            .get(&req.session_id)
            .map(|worker| {
                worker
                    .send(TurnJob {
                        turn_id: turn_id.clone(),
                        prompt: req.prompt,
                    })
                    .is_ok()
            })
            .unwrap_or(false);

        if !enqueued {
            // 与destroy竞态时工作器已消失 / The worker is gone when racing a destroy
            return Err((
                codes::SESSION_DESTROYED,
                format!("Session already destroyed: {}", req.session_id),
            ));
        }

        respond(SendMessageResp { turn_id })
    }

    /// 为会话启动轮次工作器 / Start the turn worker for a session
    fn start_worker(&self, session_id: &str) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.workers.insert(session_id.to_string(), tx);

        let store = self.store.clone();
        let prompt_handler = self.prompt_handler.clone();
        let events = self.events.clone();
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                process_turn(&store, prompt_handler.as_ref(), &events, &session_id, job).await;
            }
            debug!("Turn worker stopped for session {}", session_id);
        });
    }

    /// 停机：销毁所有活跃会话并回收其进程
    /// Shutdown: destroy every active session and reclaim its processes
    pub async fn shutdown(&self) {
        for session_id in self.store.active_session_ids() {
            if self.store.destroy(&session_id).is_ok() {
                self.workers.remove(&session_id);
                self.supervisor.kill_session(&session_id).await;
                let _ = self.events.send(SessionEvent::SessionDestroyed {
                    session_id: session_id.clone(),
                });
            }
        }
        info!("Session service shut down");
    }
}

/// 处理一轮提示并发布其事件 / Process one prompt and publish its events
async fn process_turn(
    store: &SessionStore,
    prompt_handler: &dyn PromptHandler,
    events: &broadcast::Sender<SessionEvent>,
    session_id: &str,
    job: TurnJob,
) {
    let Some(record) = store.get(session_id) else {
        warn!("Dropping turn for unknown session: {}", session_id);
        return;
    };

    let reply = prompt_handler.complete(&record, &job.prompt).await;

    // 先发中间delta，终端事件收尾 / Intermediate deltas first, the terminal event closes the turn
    for chunk in chunk_chars(&reply, DELTA_CHUNK_CHARS) {
        let _ = events.send(SessionEvent::MessageDelta {
            session_id: session_id.to_string(),
            turn_id: job.turn_id.clone(),
            content: chunk,
        });
    }
    let _ = events.send(SessionEvent::AssistantMessage {
        session_id: session_id.to_string(),
        turn_id: job.turn_id,
        data: MessageData { content: reply },
    });
}

fn parse_payload<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, (&'static str, String)> {
    serde_json::from_value(payload)
        .map_err(|e| (codes::BAD_REQUEST, format!("Malformed payload: {}", e)))
}

fn respond<T: serde::Serialize>(resp: T) -> OpResult {
    serde_json::to_value(resp).map_err(|e| (codes::INTERNAL, format!("Encode failure: {}", e)))
}

fn map_session_error(err: SessionError) -> (&'static str, String) {
    let code = match &err {
        SessionError::NotFound(_) => codes::SESSION_NOT_FOUND,
        SessionError::Destroyed(_) => codes::SESSION_DESTROYED,
        SessionError::Config(_) => codes::CONFIGURATION,
    };
    (code, err.to_string())
}

/// 按字符边界切块 / Chunk on char boundaries
fn chunk_chars(text: &str, size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for c in text.chars() {
        current.push(c);
        count += 1;
        if count >= size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
