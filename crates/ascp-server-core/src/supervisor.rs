/**
* 文件名: supervisor
* 作者: JQQ
* 创建日期: 2026/03/02
* 最后修改日期: 2026/03/02
* 版权: 2023 JQQ. All rights reserved.
* 依赖: tokio
* 描述: 会话MCP服务器进程监督
*/
use ascp::{LocalServerConfig, McpServerConfig};
use dashmap::DashMap;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

/// 优雅退出等待时长 / Graceful exit wait duration
const GRACEFUL_EXIT_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(500);

/// 受监督的MCP服务器进程 / A supervised MCP server process
struct ManagedServer {
    name: String,
    child: Child,
}

/// MCP服务器进程监督器 / MCP server process supervisor
///
/// 进程按会话独占：一个会话的进程绝不与其他会话共享，
/// 会话销毁时必须全部回收
/// Processes are owned per session: never shared across sessions, and all
/// reclaimed when the session is destroyed
pub struct McpSupervisor {
    /// session_id -> 该会话拥有的进程
    children: DashMap<String, Vec<ManagedServer>>,
}

impl McpSupervisor {
    /// 创建新的监督器
    pub fn new() -> Self {
        Self {
            children: DashMap::new(),
        }
    }

    /// 为会话启动配置的local类型MCP服务器
    ///
    /// 启动失败只记日志并跳过：服务器是可用能力而非每次调用的必需品
    /// A spawn failure is logged and skipped: servers are available, not
    /// mandatory per call
    pub fn spawn_for_session<'a>(
        &self,
        session_id: &str,
        servers: impl IntoIterator<Item = (&'a String, &'a McpServerConfig)>,
    ) {
        for (name, config) in servers {
            match config {
                McpServerConfig::Local(params) => match Self::start_process(params) {
                    Ok(child) => {
                        info!(
                            "Started MCP server '{}' for session {}: {} {:?}",
                            name, session_id, params.command, params.args
                        );
                        self.children
                            .entry(session_id.to_string())
                            .or_default()
                            .push(ManagedServer {
                                name: name.clone(),
                                child,
                            });
                    }
                    Err(e) => {
                        warn!(
                            "MCP server '{}' unavailable for session {}: {}",
                            name, session_id, e
                        );
                    }
                },
                McpServerConfig::Http(params) => {
                    // 远端服务器无本地进程可监督
                    debug!(
                        "MCP server '{}' is remote ({}), nothing to spawn",
                        name, params.url
                    );
                }
            }
        }
    }

    /// 启动子进程 / Start child process
    fn start_process(params: &LocalServerConfig) -> std::io::Result<Child> {
        let mut cmd = Command::new(&params.command);
        cmd.args(&params.args);

        // 设置环境变量 / Set environment variables
        for (key, value) in &params.env {
            cmd.env(key, value);
        }

        // 配置stdio / Configure stdio
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        debug!("Starting command: {} {:?}", params.command, params.args);
        cmd.spawn()
    }

    /// 终止并回收会话的所有服务器进程
    ///
    /// 先关stdin给进程退出机会，超时后强制杀死
    /// Close stdin first to give the process a chance to exit, kill after the timeout
    pub async fn kill_session(&self, session_id: &str) {
        let Some((_, servers)) = self.children.remove(session_id) else {
            return;
        };

        for mut server in servers {
            drop(server.child.stdin.take());

            match tokio::time::timeout(GRACEFUL_EXIT_TIMEOUT, server.child.wait()).await {
                Ok(Ok(status)) => {
                    debug!("MCP server '{}' exited with status: {}", server.name, status);
                }
                Ok(Err(e)) => {
                    error!("Error waiting for MCP server '{}': {}", server.name, e);
                }
                Err(_) => {
                    warn!(
                        "MCP server '{}' did not exit within timeout, killing it",
                        server.name
                    );
                    if let Err(e) = server.child.kill().await {
                        error!("Failed to kill MCP server '{}': {}", server.name, e);
                    }
                }
            }
        }

        info!("Reclaimed MCP servers of session {}", session_id);
    }

    /// 终止所有会话的服务器进程（服务停机路径）
    pub async fn kill_all(&self) {
        let session_ids: Vec<String> = self.children.iter().map(|e| e.key().clone()).collect();
        for session_id in session_ids {
            self.kill_session(&session_id).await;
        }
    }

    /// 会话当前存活的受监督进程数
    pub fn server_count(&self, session_id: &str) -> usize {
        self.children
            .get(session_id)
            .map(|servers| servers.len())
            .unwrap_or(0)
    }
}

impl Default for McpSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn local(command: &str, args: &[&str]) -> McpServerConfig {
        McpServerConfig::Local(LocalServerConfig {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            env: HashMap::new(),
            tools: vec!["*".to_string()],
        })
    }

    #[tokio::test]
    async fn test_spawn_and_reclaim_short_lived_process() {
        let supervisor = McpSupervisor::new();
        let name = "test-server".to_string();
        let config = local("echo", &["hello"]);

        supervisor.spawn_for_session("s1", [(&name, &config)]);
        assert_eq!(supervisor.server_count("s1"), 1);

        // echo 立即退出，回收应当顺畅
        supervisor.kill_session("s1").await;
        assert_eq!(supervisor.server_count("s1"), 0);
    }

    #[tokio::test]
    async fn test_long_running_process_is_killed() {
        let supervisor = McpSupervisor::new();
        let name = "sleeper".to_string();
        let config = local("sleep", &["30"]);

        supervisor.spawn_for_session("s1", [(&name, &config)]);
        assert_eq!(supervisor.server_count("s1"), 1);

        supervisor.kill_session("s1").await;
        assert_eq!(supervisor.server_count("s1"), 0);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_not_fatal() {
        let supervisor = McpSupervisor::new();
        let name = "ghost".to_string();
        let config = local("nonexistent_command_12345", &[]);

        // 启动失败不会panic也不会登记进程
        supervisor.spawn_for_session("s1", [(&name, &config)]);
        assert_eq!(supervisor.server_count("s1"), 0);
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_processes() {
        let supervisor = McpSupervisor::new();
        let name = "test-server".to_string();
        let config = local("sleep", &["30"]);

        supervisor.spawn_for_session("s1", [(&name, &config)]);
        supervisor.spawn_for_session("s2", [(&name, &config)]);
        assert_eq!(supervisor.server_count("s1"), 1);
        assert_eq!(supervisor.server_count("s2"), 1);

        // 回收一个会话不影响另一个
        supervisor.kill_session("s1").await;
        assert_eq!(supervisor.server_count("s1"), 0);
        assert_eq!(supervisor.server_count("s2"), 1);

        supervisor.kill_all().await;
        assert_eq!(supervisor.server_count("s2"), 0);
    }

    #[tokio::test]
    async fn test_http_servers_spawn_nothing() {
        let supervisor = McpSupervisor::new();
        let name = "remote".to_string();
        let config = McpServerConfig::Http(ascp::HttpServerConfig {
            url: "https://example.com/mcp".to_string(),
            headers: HashMap::new(),
            tools: vec!["*".to_string()],
        });

        supervisor.spawn_for_session("s1", [(&name, &config)]);
        assert_eq!(supervisor.server_count("s1"), 0);
    }

    #[tokio::test]
    async fn test_spawn_with_env_config() {
        let mut env = HashMap::new();
        env.insert("ASCP_TEST_VAR".to_string(), "1".to_string());

        let supervisor = McpSupervisor::new();
        let name = "env-server".to_string();
        let config = McpServerConfig::Local(LocalServerConfig {
            command: "env".to_string(),
            args: vec![],
            env,
            tools: vec!["*".to_string()],
        });

        supervisor.spawn_for_session("s1", [(&name, &config)]);
        supervisor.kill_session("s1").await;
    }
}
