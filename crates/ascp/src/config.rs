/*!
* 文件名: config.rs
* 作者: JQQ
* 创建日期: 2026/03/02
* 最后修改日期: 2026/03/02
* 版权: 2023 JQQ. All rights reserved.
* 依赖: serde, thiserror
* 描述: 会话配置模式定义 / Session configuration schema definitions
*/

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// 配置错误类型 / Configuration error type
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum ConfigError {
    #[error("MCP server '{0}' has an empty command")]
    EmptyCommand(String),
    #[error("MCP server '{0}' has an empty url")]
    EmptyUrl(String),
    #[error("MCP server '{0}' is already configured with different parameters")]
    ServerConflict(String),
    #[error("Custom agent name must not be empty")]
    EmptyAgentName,
    #[error("Duplicate custom agent name: {0}")]
    DuplicateAgent(String),
}

/// 本地MCP服务器参数 / Local MCP server parameters
///
/// `local` 类型的服务器由后端作为子进程启动
/// A `local` server is spawned by the backend as a child process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalServerConfig {
    /// 命令 / Command
    pub command: String,
    /// 参数 / Arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// 环境变量 / Environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// 工具名称模式 / Tool name patterns
    #[serde(default = "default_tools")]
    pub tools: Vec<String>,
}

/// HTTP MCP服务器参数 / HTTP MCP server parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// URL / URL
    pub url: String,
    /// 头部 / Headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// 工具名称模式 / Tool name patterns
    #[serde(default = "default_tools")]
    pub tools: Vec<String>,
}

/// 省略时暴露所有工具 / Expose every tool when omitted
fn default_tools() -> Vec<String> {
    vec!["*".to_string()]
}

/// MCP服务器配置枚举 / MCP server configuration enum
///
/// 未识别的 `type` 标签在反序列化时即失败
/// An unrecognized `type` tag already fails at deserialization time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum McpServerConfig {
    /// 本地进程配置 / Local process config
    #[serde(rename = "local")]
    Local(LocalServerConfig),
    /// HTTP配置 / HTTP config
    #[serde(rename = "http")]
    Http(HttpServerConfig),
}

impl McpServerConfig {
    /// 获取工具名称模式 / Get tool name patterns
    pub fn tools(&self) -> &[String] {
        match self {
            McpServerConfig::Local(config) => &config.tools,
            McpServerConfig::Http(config) => &config.tools,
        }
    }

    /// 判断是否允许暴露指定工具 / Check whether a tool may be exposed
    ///
    /// `"*"` 匹配所有工具，尾部 `*` 匹配前缀，其余精确匹配
    /// `"*"` matches everything, a trailing `*` matches a prefix, anything else matches exactly
    pub fn allows_tool(&self, tool_name: &str) -> bool {
        self.tools().iter().any(|pattern| {
            if pattern == "*" {
                true
            } else if let Some(prefix) = pattern.strip_suffix('*') {
                tool_name.starts_with(prefix)
            } else {
                pattern == tool_name
            }
        })
    }

    /// 结构校验 / Structural validation
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        match self {
            McpServerConfig::Local(config) if config.command.is_empty() => {
                Err(ConfigError::EmptyCommand(name.to_string()))
            }
            McpServerConfig::Http(config) if config.url.is_empty() => {
                Err(ConfigError::EmptyUrl(name.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// 自定义Agent配置 / Custom agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAgentConfig {
    /// 唯一名称 / Unique name
    pub name: String,
    /// 显示名称 / Display name
    pub display_name: String,
    /// 描述 / Description
    pub description: String,
    /// 系统提示词 / System prompt
    pub prompt: String,
    /// 是否允许自动选择 / Whether the backend may auto-select this agent
    #[serde(default)]
    pub infer: bool,
}

/// 会话配置信封 / Session configuration envelope
///
/// 在创建或恢复会话时携带，两个字段都可省略
/// Carried at session creation or resumption, both fields optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// MCP服务器映射，按名称唯一 / MCP servers keyed by unique name
    #[serde(default)]
    pub mcp_servers: HashMap<String, McpServerConfig>,
    /// 自定义Agent序列，顺序即优先级 / Custom agents, order defines precedence
    #[serde(default)]
    pub custom_agents: Vec<CustomAgentConfig>,
}

impl SessionConfig {
    /// 结构校验 / Structural validation
    ///
    /// 纯数据检查，不触达后端 / Pure data checks, never touches the backend
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, server) in &self.mcp_servers {
            server.validate(name)?;
        }

        let mut seen = std::collections::HashSet::new();
        for agent in &self.custom_agents {
            if agent.name.is_empty() {
                return Err(ConfigError::EmptyAgentName);
            }
            if !seen.insert(agent.name.as_str()) {
                return Err(ConfigError::DuplicateAgent(agent.name.clone()));
            }
        }
        Ok(())
    }

    /// 恢复会话时的增量合并 / Additive merge applied at session resumption
    ///
    /// 服务器按键并集，重复提供相同配置视为幂等，不同配置视为冲突；
    /// Agent只追加，与已有名称重复即拒绝。合并从不移除已有配置。
    /// Servers union by key: an identical re-supply is idempotent, a different
    /// one is a conflict. Agents append only, rejecting duplicate names.
    /// Merging never removes anything already configured.
    pub fn merge(&mut self, extra: SessionConfig) -> Result<(), ConfigError> {
        extra.validate()?;

        for (name, server) in &extra.mcp_servers {
            if let Some(existing) = self.mcp_servers.get(name) {
                if existing != server {
                    return Err(ConfigError::ServerConflict(name.clone()));
                }
            }
        }
        for agent in &extra.custom_agents {
            if self.custom_agents.iter().any(|a| a.name == agent.name) {
                return Err(ConfigError::DuplicateAgent(agent.name.clone()));
            }
        }

        self.mcp_servers.extend(extra.mcp_servers);
        self.custom_agents.extend(extra.custom_agents);
        Ok(())
    }

    /// 配置是否为空 / Whether the configuration is empty
    pub fn is_empty(&self) -> bool {
        self.mcp_servers.is_empty() && self.custom_agents.is_empty()
    }
}
