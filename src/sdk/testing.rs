//! 单测辅助：记录请求的假传输、日志初始化

use crate::sdk::transport::{Transport, TransportResponse};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Request, StatusCode};
use std::sync::{Mutex, Once};
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

pub(crate) fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::EnvFilter;

        // 测试中默认打开当前 crate 的 debug，关闭底层 HTTP 客户端的 debug 噪音
        let filter_layer =
            EnvFilter::new("info,rundezvous_sdk_rust=debug,hyper_util::client=info,reqwest=info");

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_test_writer();

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    });
}

/// 被记录下来的请求
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
    pub content_type: Option<String>,
    pub operation_id: Option<String>,
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
}

impl RecordedRequest {
    fn from_request(request: &Request) -> Self {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            method: request.method().clone(),
            path: request.url().path().to_string(),
            query: request.url().query().map(str::to_string),
            body: request
                .body()
                .and_then(|b| b.as_bytes())
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default(),
            content_type: header("content-type"),
            operation_id: header("operationID"),
            headers: request.headers().clone(),
            timeout: request.timeout().copied(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// 假响应
pub(crate) struct FakeReply {
    delay: Option<Duration>,
    outcome: std::result::Result<(u16, String), String>,
}

impl FakeReply {
    pub fn ok(status: u16, body: impl Into<String>) -> Self {
        Self {
            delay: None,
            outcome: Ok((status, body.into())),
        }
    }

    /// 模拟网络层失败（连接被拒绝等）
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            delay: None,
            outcome: Err(reason.into()),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Handler = Box<dyn Fn(&RecordedRequest) -> FakeReply + Send + Sync>;

/// 按处理函数返回响应并记录所有请求的假传输
pub(crate) struct FakeTransport {
    handler: Handler,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> FakeReply + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: Request) -> Result<TransportResponse> {
        let recorded = RecordedRequest::from_request(&request);
        self.requests.lock().unwrap().push(recorded.clone());

        let reply = (self.handler)(&recorded);
        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        match reply.outcome {
            Ok((status, body)) => Ok(TransportResponse::new(
                StatusCode::from_u16(status)?,
                body,
            )),
            Err(reason) => Err(anyhow::anyhow!("请求失败: {}", reason)),
        }
    }
}
