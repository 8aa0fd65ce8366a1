use ascp_server_core::{AscpServiceBuilder, EchoPromptHandler};
use ascp_server_stdio::StdioServer;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// ASCP session service speaking NDJSON frames on stdio
#[derive(Parser, Debug)]
#[command(name = "ascp-server-stdio", version)]
struct Cli {
    /// 日志级别 / Log level (trace|debug|info|warn|error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 内置回显处理器的回复前缀 / Reply prefix of the built-in echo handler
    #[arg(long)]
    echo_prefix: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    // 日志走stderr，stdout属于协议 / Logs go to stderr, stdout belongs to the protocol
    let filter =
        EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let handler = match cli.echo_prefix {
        Some(prefix) => EchoPromptHandler::with_prefix(prefix),
        None => EchoPromptHandler::new(),
    };
    let service = AscpServiceBuilder::new()
        .with_prompt_handler(Arc::new(handler))
        .build();

    info!("Starting ASCP stdio server");
    StdioServer::new(service).run().await
}
