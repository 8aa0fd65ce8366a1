/*!
* 文件名: events.rs
* 作者: JQQ
* 创建日期: 2026/03/02
* 最后修改日期: 2026/03/02
* 版权: 2023 JQQ. All rights reserved.
* 依赖: None
* 描述: ASCP协议操作名常量 / ASCP protocol operation name constants
*/

// 客户端 -> 服务器 会话生命周期操作 / Client -> server session lifecycle operations
pub const SERVER_CREATE_SESSION: &str = "server:create_session";
pub const SERVER_RESUME_SESSION: &str = "server:resume_session";
pub const SERVER_DESTROY_SESSION: &str = "server:destroy_session";
pub const SERVER_SEND_MESSAGE: &str = "server:send_message";

// 服务器 -> 客户端 通知事件标签 / Server -> client notification event tags
pub const NOTIFY_MESSAGE_DELTA: &str = "message_delta";
pub const NOTIFY_TOOL_CALL: &str = "tool_call";
pub const NOTIFY_ASSISTANT_MESSAGE: &str = "assistant_message";
pub const NOTIFY_SESSION_DESTROYED: &str = "session_destroyed";
