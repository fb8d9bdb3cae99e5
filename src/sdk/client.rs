//! Rundezvous 客户端
//!
//! 持有配置和共享的 HTTP 客户端，负责创建聊天同步器、位置上报器和表单提交器。

use crate::sdk::chat::{
    ChatApi, ChatListener, ChatSyncer, ChatSyncerConfig, EmptyChatListener, MessageDisplay,
};
use crate::sdk::form::FormSubmitter;
use crate::sdk::places::{
    EmptyLocationListener, LocationListener, LocationProvider, LocationReporter,
    LocationReporterConfig,
};
use crate::sdk::scheduler::OverlapPolicy;
use crate::sdk::transport::{ApiClient, Transport};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// 服务器地址，例如 `http://localhost:8000`
    pub base_url: String,
    /// 聊天接口路径前缀
    pub chat_path_prefix: String,
    /// 聊天轮询间隔
    pub chat_poll_interval: Duration,
    /// 单轮聊天同步的最长时间
    pub chat_cycle_timeout: Duration,
    /// 位置上报地址（路径或完整 URL）
    pub location_endpoint: String,
    /// 位置上报间隔
    pub location_report_interval: Duration,
    /// 单个 HTTP 请求超时
    pub request_timeout: Duration,
    /// Django CSRF token，设置后通过 `X-CSRFToken` 请求头和 `csrftoken` Cookie 发送
    pub csrf_token: Option<String>,
    /// Django 会话 ID（`sessionid` Cookie）
    pub session_id: Option<String>,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            chat_path_prefix: "/chat".to_string(),
            chat_poll_interval: Duration::from_millis(1000),
            chat_cycle_timeout: Duration::from_secs(30),
            location_endpoint: "/places/update_location".to_string(),
            location_report_interval: Duration::from_millis(30_000),
            request_timeout: Duration::from_secs(10),
            csrf_token: None,
            session_id: None,
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("无效的服务器地址: {}", self.base_url))?;
        if self.chat_poll_interval.is_zero() {
            return Err(anyhow::anyhow!("聊天轮询间隔不能为 0"));
        }
        if self.chat_cycle_timeout.is_zero() {
            return Err(anyhow::anyhow!("聊天同步单轮超时不能为 0"));
        }
        if self.location_report_interval.is_zero() {
            return Err(anyhow::anyhow!("位置上报间隔不能为 0"));
        }
        if self.location_endpoint.trim().is_empty() {
            return Err(anyhow::anyhow!("位置上报地址不能为空"));
        }
        Ok(())
    }

    pub fn chat_syncer_config(&self) -> ChatSyncerConfig {
        ChatSyncerConfig {
            path_prefix: self.chat_path_prefix.clone(),
            poll_interval: self.chat_poll_interval,
            overlap: OverlapPolicy::Skip,
            cycle_timeout: Some(self.chat_cycle_timeout),
        }
    }

    pub fn location_reporter_config(&self) -> LocationReporterConfig {
        let mut cfg = LocationReporterConfig::new(self.location_endpoint.clone());
        cfg.report_interval = self.location_report_interval;
        cfg
    }

    /// 所有请求共用的默认请求头
    pub fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let mut cookies = Vec::new();

        if let Some(token) = &self.csrf_token {
            headers.insert(
                HeaderName::from_static("x-csrftoken"),
                HeaderValue::from_str(token).context("无效的 CSRF token")?,
            );
            cookies.push(format!("csrftoken={}", token));
        }
        if let Some(session_id) = &self.session_id {
            cookies.push(format!("sessionid={}", session_id));
        }
        if !cookies.is_empty() {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&cookies.join("; ")).context("无效的 Cookie")?,
            );
        }
        Ok(headers)
    }
}

/// Rundezvous 客户端
#[derive(Clone)]
pub struct RundezvousClient {
    config: ClientConfig,
    api: Arc<ApiClient>,
}

impl RundezvousClient {
    /// 创建客户端（真实 HTTP 传输）
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::ClientBuilder::new()
            .build()
            .context("创建 HTTP 客户端失败")?;
        let api = ApiClient::new(&config.base_url, http_client)?;

        info!("[Client] 🔗 创建客户端，服务器: {}", config.base_url);
        Self::from_api(config, api)
    }

    /// 创建客户端（自定义传输）
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let api = ApiClient::with_transport(&config.base_url, transport)?;
        Self::from_api(config, api)
    }

    // 认证请求头和超时挂在 ApiClient 上，与使用哪种传输无关
    fn from_api(config: ClientConfig, api: ApiClient) -> Result<Self> {
        let api = api
            .with_default_headers(config.default_headers()?)
            .with_timeout(config.request_timeout);
        Ok(Self {
            config,
            api: Arc::new(api),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api_client(&self) -> Arc<ApiClient> {
        self.api.clone()
    }

    pub fn chat_api(&self) -> ChatApi {
        ChatApi::new(self.api.clone(), self.config.chat_path_prefix.clone())
    }

    pub fn form_submitter(&self) -> FormSubmitter {
        FormSubmitter::new(self.api.clone())
    }

    /// 创建聊天同步器（尚未启动）
    pub fn chat_syncer(&self, display: Arc<dyn MessageDisplay>) -> Arc<ChatSyncer> {
        self.chat_syncer_with_listener(display, Arc::new(EmptyChatListener))
    }

    pub fn chat_syncer_with_listener(
        &self,
        display: Arc<dyn MessageDisplay>,
        listener: Arc<dyn ChatListener>,
    ) -> Arc<ChatSyncer> {
        Arc::new(ChatSyncer::with_listener(
            self.config.chat_syncer_config(),
            self.api.clone(),
            display,
            listener,
        ))
    }

    /// 创建位置上报器（尚未启动）
    pub fn location_reporter(&self, provider: Arc<dyn LocationProvider>) -> Arc<LocationReporter> {
        self.location_reporter_with_listener(provider, Arc::new(EmptyLocationListener))
    }

    pub fn location_reporter_with_listener(
        &self,
        provider: Arc<dyn LocationProvider>,
        listener: Arc<dyn LocationListener>,
    ) -> Arc<LocationReporter> {
        Arc::new(LocationReporter::with_listener(
            self.config.location_reporter_config(),
            self.api.clone(),
            provider,
            listener,
        ))
    }
}
