/*!
* 文件名: config
* 作者: JQQ
* 创建日期: 2026/03/02
* 最后修改日期: 2026/03/02
* 版权: 2023 JQQ. All rights reserved.
* 依赖: None
* 描述: ASCP客户端配置 / ASCP client configuration
*/

/// ASCP客户端配置
#[derive(Debug, Clone)]
pub struct AscpClientConfig {
    /// 控制调用超时时间（秒）
    pub default_timeout: u64,
    /// 等待一轮回复的超时时间（秒）
    pub turn_timeout: u64,
}

impl Default for AscpClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: 20,
            turn_timeout: 60,
        }
    }
}

impl AscpClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_timeout(mut self, timeout: u64) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: u64) -> Self {
        self.turn_timeout = timeout;
        self
    }
}
