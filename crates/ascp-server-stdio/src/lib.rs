//! Stdio adapter for the ASCP session service
//!
//! 在stdin/stdout上提供换行分隔JSON帧协议，客户端可将后端作为子进程启动。
//! 日志必须走stderr，stdout属于协议。
//! Serves the newline-delimited JSON frame protocol on stdin/stdout so a
//! client can spawn the backend as a child process. Logs must go to stderr,
//! stdout belongs to the protocol.

use ascp::Frame;
use ascp_server_core::AscpService;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::{info, warn};

/// 基于stdio的ASCP服务器 / A stdio-based ASCP server
pub struct StdioServer {
    service: Arc<AscpService>,
}

impl StdioServer {
    /// 创建新的stdio服务器 / Create a new stdio server
    pub fn new(service: Arc<AscpService>) -> Self {
        Self { service }
    }

    /// 在进程的stdin/stdout上运行 / Run on the process stdin/stdout
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        self.run_io(stdin, stdout).await
    }

    /// 在任意读写端上运行（测试注入用）
    /// Run on arbitrary reader/writer ends (test injection)
    pub async fn run_io<R, W>(
        self,
        input: R,
        output: W,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (req_tx, mut frame_rx) = self.service.clone().attach_channel();

        // 写任务：响应与通知经由单一写者串行输出
        // Writer task: responses and notifications serialize through one writer
        let writer_task = tokio::spawn(async move {
            let mut writer = FramedWrite::new(output, LinesCodec::new());
            while let Some(frame) = frame_rx.recv().await {
                match serde_json::to_string(&frame) {
                    Ok(line) => {
                        if writer.send(line).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Failed to encode frame: {}", e),
                }
            }
        });

        let mut reader = FramedRead::new(input, LinesCodec::new());
        while let Some(line) = reader.next().await {
            let line = line?;
            match serde_json::from_str::<Frame>(&line) {
                Ok(Frame::Request(req)) => {
                    if req_tx.send(req).is_err() {
                        break;
                    }
                }
                Ok(_) => warn!("Ignoring non-request frame from client"),
                Err(e) => warn!("Dropping malformed frame: {}", e),
            }
        }

        // stdin关闭即停机：销毁活跃会话并回收其MCP进程
        // EOF on stdin means shutdown: destroy live sessions and reclaim their MCP processes
        info!("Input closed, shutting session service down");
        self.service.shutdown().await;
        drop(req_tx);

        // 给停机通知留出冲刷时间 / Leave the shutdown notifications time to flush
        tokio::time::sleep(Duration::from_millis(50)).await;
        writer_task.abort();
        Ok(())
    }
}

/// 以默认配置快速运行服务 / Convenience runner with the given service
pub async fn run_server(
    service: Arc<AscpService>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    StdioServer::new(service).run().await
}
