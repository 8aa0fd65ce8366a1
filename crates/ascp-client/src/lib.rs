/*!
* 文件名: lib
* 作者: JQQ
* 创建日期: 2026/03/02
* 最后修改日期: 2026/03/02
* 版权: 2023 JQQ. All rights reserved.
* 依赖: None
* 描述: ASCP会话生命周期客户端库 / ASCP session lifecycle client library
*/

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod transport;

// 重新导出主要类型
pub use client::AscpClient;
pub use config::AscpClientConfig;
pub use error::{AscpClientError, Result};
pub use events::SessionEvents;
pub use session::Session;
pub use transport::{ChannelTransport, StdioTransport, Transport};
