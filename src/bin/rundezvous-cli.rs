//! Rundezvous CLI 客户端（测试版）
//!
//! 非交互式 CLI，用于测试聊天轮询和位置上报
//! 启动后持续拉取聊天室新消息并按固定间隔上报位置，只展示接收到的信息

use anyhow::{Context, Result};
use clap::Parser;
use rundezvous_sdk_rust::sdk::chat::{ChatListener, DisplayedMessageSet, MessageId};
use rundezvous_sdk_rust::sdk::client::{ClientConfig, RundezvousClient};
use rundezvous_sdk_rust::sdk::places::{
    LocationListener, LocationProvider, LocationSample, LocationUpdateResp,
    StaticLocationProvider, UnavailableLocationProvider,
};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// Rundezvous CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "rundezvous-cli")]
#[command(about = "Rundezvous CLI 客户端 - 用于测试聊天轮询和位置上报", long_about = None)]
struct Args {
    /// 服务器地址
    #[arg(short, long, default_value = "http://localhost:8000")]
    base_url: String,

    /// 聊天轮询间隔（毫秒）
    #[arg(long, default_value = "1000")]
    poll_interval_ms: u64,

    /// 位置上报间隔（毫秒）
    #[arg(long, default_value = "30000")]
    report_interval_ms: u64,

    /// 位置上报地址
    #[arg(long, default_value = "/places/update_location")]
    location_endpoint: String,

    /// 固定纬度（不指定经纬度时视为没有定位能力）
    #[arg(long, requires = "long", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// 固定经度
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    long: Option<f64>,

    /// Django CSRF token
    #[arg(long)]
    csrf_token: Option<String>,

    /// Django 会话 ID
    #[arg(long)]
    session_id: Option<String>,

    /// 启动后发送一条消息
    #[arg(long)]
    send: Option<String>,

    /// 运行时长（秒），0 表示持续运行
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// 日志级别（默认: info,rundezvous_sdk_rust=debug）
    #[arg(long, default_value = "info,rundezvous_sdk_rust=debug")]
    log_level: String,

    /// 额外写入的日志文件（追加模式），不指定时只输出到控制台
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// 初始化日志：控制台始终输出，指定 `--log-file` 时另写一份到文件
fn init_logger(log_level: &str, log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // RUST_LOG 优先于命令行参数
    let filter_layer = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .with_context(|| format!("无效的日志级别: {}", log_level))?,
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal());

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("无法打开日志文件 {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("日志系统初始化失败")?;

    if let Some(path) = log_file {
        info!("[CLI] 📝 日志同时写入文件: {}", path.display());
    }
    Ok(())
}

struct CliChatListener;

#[async_trait::async_trait]
impl ChatListener for CliChatListener {
    async fn on_new_message(&self, message_id: MessageId, fragment: String) {
        info!("[CLI/Chat] 📨 新消息 #{}: {}", message_id, fragment.trim());
    }

    async fn on_sync_failed(&self, reason: String) {
        warn!("[CLI/Chat] ⚠️ 同步失败: {}", reason);
    }
}

struct CliLocationListener;

#[async_trait::async_trait]
impl LocationListener for CliLocationListener {
    async fn on_location_reported(&self, sample: LocationSample, resp: LocationUpdateResp) {
        info!(
            "[CLI/Location] 📍 已上报 ({}, {})，位置变化: {}",
            sample.latitude, sample.longitude, resp.update
        );
    }

    async fn on_report_failed(&self, reason: String) {
        warn!("[CLI/Location] ⚠️ 上报失败: {}", reason);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(&args.log_level, args.log_file.as_deref())?;

    info!("[CLI] 🚀 Rundezvous CLI 客户端（测试模式）");
    info!("[CLI] 🌐 服务器: {}", args.base_url);
    info!("[CLI] ⏱️  运行时长: {} 秒（0=持续运行）", args.duration);

    let mut config = ClientConfig::new(args.base_url.clone());
    config.chat_poll_interval = Duration::from_millis(args.poll_interval_ms);
    config.location_report_interval = Duration::from_millis(args.report_interval_ms);
    config.location_endpoint = args.location_endpoint.clone();
    config.csrf_token = args.csrf_token.clone();
    config.session_id = args.session_id.clone();

    let client = RundezvousClient::new(config)?;

    if let Some(text) = &args.send {
        match client.chat_api().send_message(text).await {
            Ok(fragment) => info!("[CLI] ✅ 消息已发送: {}", fragment.trim()),
            Err(e) => error!("[CLI] ❌ 消息发送失败: {:#}", e),
        }
    }

    let provider: Arc<dyn LocationProvider> = match (args.lat, args.long) {
        (Some(lat), Some(long)) => {
            info!("[CLI] 📍 使用固定坐标: ({}, {})", lat, long);
            Arc::new(StaticLocationProvider::new(lat, long))
        }
        _ => Arc::new(UnavailableLocationProvider),
    };

    let display = Arc::new(DisplayedMessageSet::new());
    let chat_loop = client
        .chat_syncer_with_listener(display.clone(), Arc::new(CliChatListener))
        .start();
    let location_loop = client
        .location_reporter_with_listener(provider, Arc::new(CliLocationListener))
        .start();

    info!("[CLI] 📥 开始轮询消息...");
    if args.duration > 0 {
        info!("[CLI] ⏰ {} 秒后自动退出", args.duration);
        sleep(Duration::from_secs(args.duration)).await;
    } else {
        info!("[CLI] ⏰ 持续运行中，按 Ctrl+C 退出");
        tokio::signal::ctrl_c().await?;
    }

    chat_loop.stop().await;
    location_loop.stop().await;
    let shown = display.len();
    info!("[CLI] 👋 程序退出，本次共展示 {} 条消息", shown);

    Ok(())
}
