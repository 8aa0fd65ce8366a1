//! 会话存储模块 / Session store module

use ascp::{ConfigError, CustomAgentConfig, SessionConfig};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

// 类型别名
pub type SessionId = String;

/// 会话错误类型
#[derive(Error, Debug, serde::Serialize)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),
    #[error("Session already destroyed: {0}")]
    Destroyed(SessionId),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 会话状态 / Session state
///
/// 状态机：Active -> Destroyed，销毁为终态，不可回转
/// State machine: Active -> Destroyed, destruction is terminal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionState {
    Active,
    Destroyed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Active => write!(f, "active"),
            SessionState::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// 会话记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// 会话 ID，创建时分配，恢复后不变
    pub session_id: SessionId,
    /// 累计生效的会话配置（创建配置加历次恢复合并）
    pub config: SessionConfig,
    /// 会话状态
    pub state: SessionState,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 已处理的轮次数
    pub turns: u64,
}

impl SessionRecord {
    fn new(config: SessionConfig) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            config,
            state: SessionState::Active,
            created_at: Utc::now(),
            turns: 0,
        }
    }

    /// 按名称查找已配置的 Agent / Look up a configured agent by name
    pub fn find_agent(&self, name: &str) -> Option<&CustomAgentConfig> {
        self.config.custom_agents.iter().find(|a| a.name == name)
    }

    /// 可被自动选择的 Agent，按配置顺序即优先级
    /// Agents eligible for auto-selection, config order is precedence
    pub fn inferable_agents(&self) -> impl Iterator<Item = &CustomAgentConfig> {
        self.config.custom_agents.iter().filter(|a| a.infer)
    }
}

/// 会话存储
#[derive(Debug)]
pub struct SessionStore {
    /// session_id -> record 映射（销毁后保留墓碑以区分错误码）
    sessions: Arc<DashMap<SessionId, SessionRecord>>,
}

impl SessionStore {
    /// 创建新的会话存储
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// 创建新会话，分配全新 ID
    pub fn create(&self, config: Option<SessionConfig>) -> Result<SessionRecord, SessionError> {
        let config = config.unwrap_or_default();
        config.validate()?;

        let record = SessionRecord::new(config);
        self.sessions
            .insert(record.session_id.clone(), record.clone());

        tracing::debug!("Created session: {}", record.session_id);
        Ok(record)
    }

    /// 恢复既有会话，增量合并配置
    ///
    /// 返回合并后的记录与本次新增的 MCP 服务器名称（供监督器启动进程）。
    /// 已销毁的会话对恢复而言视为不存在。
    /// Returns the merged record plus the names of the MCP servers this call
    /// added (for the supervisor to spawn). A destroyed session does not
    /// exist as far as resumption is concerned.
    pub fn resume(
        &self,
        session_id: &str,
        extra: Option<SessionConfig>,
    ) -> Result<(SessionRecord, Vec<String>), SessionError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        if entry.state == SessionState::Destroyed {
            return Err(SessionError::NotFound(session_id.to_string()));
        }

        let new_servers = match extra {
            Some(extra) => {
                let new_servers: Vec<String> = extra
                    .mcp_servers
                    .keys()
                    .filter(|name| !entry.config.mcp_servers.contains_key(*name))
                    .cloned()
                    .collect();
                entry.config.merge(extra)?;
                new_servers
            }
            None => Vec::new(),
        };

        tracing::debug!(
            "Resumed session: {} ({} new servers)",
            session_id,
            new_servers.len()
        );
        Ok((entry.clone(), new_servers))
    }

    /// 销毁会话，保留墓碑
    ///
    /// 再次销毁是显式错误而非静默no-op
    pub fn destroy(&self, session_id: &str) -> Result<SessionRecord, SessionError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        if entry.state == SessionState::Destroyed {
            return Err(SessionError::Destroyed(session_id.to_string()));
        }

        entry.state = SessionState::Destroyed;
        tracing::debug!("Destroyed session: {}", session_id);
        Ok(entry.clone())
    }

    /// 登记一轮对话，返回轮次 ID
    pub fn record_turn(&self, session_id: &str) -> Result<String, SessionError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        if entry.state == SessionState::Destroyed {
            return Err(SessionError::Destroyed(session_id.to_string()));
        }

        entry.turns += 1;
        Ok(Uuid::new_v4().to_string())
    }

    /// 获取会话记录
    pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    /// 获取所有活跃会话 ID
    pub fn active_session_ids(&self) -> Vec<SessionId> {
        self.sessions
            .iter()
            .filter(|s| s.state == SessionState::Active)
            .map(|s| s.session_id.clone())
            .collect()
    }

    /// 获取会话统计信息
    pub fn stats(&self) -> StoreStats {
        let total = self.sessions.len();
        let active = self
            .sessions
            .iter()
            .filter(|s| s.state == SessionState::Active)
            .count();

        StoreStats {
            total,
            active,
            destroyed: total - active,
        }
    }
}

/// 会话统计信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    /// 总会话数（含墓碑）
    pub total: usize,
    /// 活跃会话数
    pub active: usize,
    /// 已销毁会话数
    pub destroyed: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
