//! HTTP 传输层
//!
//! 各组件先用 `reqwest::RequestBuilder` 构造请求，再统一交给 [`Transport`] 执行。
//! 生产环境使用 [`HttpTransport`]（内部是共享的 `reqwest::Client`），
//! 单测中替换为记录请求的假实现，不需要真实服务器。

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Request, RequestBuilder, StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// 已读取完 body 的 HTTP 响应
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// 执行一个已构造好的 HTTP 请求
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<TransportResponse>;
}

/// 基于 reqwest 的默认传输实现
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request) -> Result<TransportResponse> {
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self
            .client
            .execute(request)
            .await
            .with_context(|| format!("请求失败: {} {}", method, url))?;

        let status = response.status();
        let body = response.text().await.context("读取响应 body 失败")?;
        debug!("[HTTP] {} {} -> {}", method, url, status);

        Ok(TransportResponse { status, body })
    }
}

/// 带基础地址的 API 客户端，负责拼接 URL、附加默认请求头和 operationID 并执行请求
///
/// 默认请求头（CSRF / Cookie）和超时由这里统一附加，
/// 因此对任何 [`Transport`] 实现都生效。
pub struct ApiClient {
    base_url: Url,
    // 仅用于构造请求，真正的发送由 transport 完成
    client: reqwest::Client,
    transport: Arc<dyn Transport>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl ApiClient {
    /// 使用真实 HTTP 传输创建 API 客户端
    pub fn new(base_url: &str, client: reqwest::Client) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(client.clone()));
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            client,
            transport,
            default_headers: HeaderMap::new(),
            timeout: None,
        })
    }

    /// 使用自定义传输创建 API 客户端
    pub fn with_transport(base_url: &str, transport: Arc<dyn Transport>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("创建 HTTP 客户端失败")?;
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            client,
            transport,
            default_headers: HeaderMap::new(),
            timeout: None,
        })
    }

    /// 每个请求都会带上的请求头（请求自身已设置的同名头优先）
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    /// 单个请求的超时时间
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 将路径（或完整 URL）解析为相对于基础地址的绝对 URL
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("无效的请求路径: {}", path))
    }

    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self.client.request(method, self.url(path)?))
    }

    /// 构造请求但不发送（附加默认请求头、超时和 operationID）
    pub fn build(&self, builder: RequestBuilder) -> Result<Request> {
        let operation_id = Uuid::new_v4().to_string();
        let mut builder = builder.header("operationID", &operation_id);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let mut request = builder.build().context("构造请求失败")?;

        let headers = request.headers_mut();
        for (name, value) in self.default_headers.iter() {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
        Ok(request)
    }

    pub async fn execute(&self, request: Request) -> Result<TransportResponse> {
        debug!(
            "[HTTP] 📡 {} {} (operationID: {})",
            request.method(),
            request.url(),
            request
                .headers()
                .get("operationID")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
        );
        let Some(limit) = request.timeout().copied() else {
            return self.transport.execute(request).await;
        };

        let method = request.method().clone();
        let url = request.url().clone();
        match tokio::time::timeout(limit, self.transport.execute(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("[HTTP] ⏱️ {} {} 超时 ({:?})", method, url, limit);
                Err(anyhow!("请求超时 ({:?}): {} {}", limit, method, url))
            }
        }
    }

    pub async fn send(&self, builder: RequestBuilder) -> Result<TransportResponse> {
        let request = self.build(builder)?;
        self.execute(request).await
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    Url::parse(base_url).with_context(|| format!("无效的服务器地址: {}", base_url))
}
