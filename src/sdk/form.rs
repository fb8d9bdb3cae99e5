//! 表单提交
//!
//! 拦截表单的提交动作：按表单声明的 method/action 构造请求，
//! 请求体为提交时刻的字段序列化结果，异步发送后立即重置表单。
//! 成功时把原始响应交给回调；失败只记录日志，不会向外抛出。

use crate::sdk::transport::ApiClient;
use crate::sdk::types::{ensure_success, truncate_body};
use anyhow::Result;
use reqwest::{Method, Request};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 提交成功后的回调，参数为原始响应内容
pub type FormCallback = Arc<dyn Fn(String) + Send + Sync>;

/// 表单字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
    /// 重置后恢复的默认值
    pub default_value: String,
}

/// 表单：method、action 和有序字段
#[derive(Debug, Clone)]
pub struct Form {
    method: Method,
    action: String,
    fields: Vec<FormField>,
}

impl Form {
    pub fn new(method: Method, action: impl Into<String>) -> Self {
        Self {
            method,
            action: action.into(),
            fields: Vec::new(),
        }
    }

    /// 按 HTML 表单属性创建，`method` 大小写不敏感，空值按 GET 处理
    pub fn from_attrs(method: &str, action: impl Into<String>) -> Result<Self> {
        let method = if method.trim().is_empty() {
            Method::GET
        } else {
            Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
                .map_err(|e| anyhow::anyhow!("无效的表单 method {:?}: {}", method, e))?
        };
        Ok(Self::new(method, action))
    }

    /// 声明一个字段及其默认值
    pub fn field(mut self, name: impl Into<String>, default_value: impl Into<String>) -> Self {
        let default_value = default_value.into();
        self.fields.push(FormField {
            name: name.into(),
            value: default_value.clone(),
            default_value,
        });
        self
    }

    /// 设置字段值，字段不存在时返回 false
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// 按声明顺序序列化字段
    pub fn serialize(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }

    /// 所有字段恢复为默认值
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.value = field.default_value.clone();
        }
    }
}

/// 表单提交器
#[derive(Clone)]
pub struct FormSubmitter {
    api: Arc<ApiClient>,
}

impl FormSubmitter {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// 按表单当前内容构造请求
    ///
    /// GET 表单的字段放在查询串中，其它 method 作为
    /// `application/x-www-form-urlencoded` 请求体。
    pub fn build_request(&self, form: &Form) -> Result<Request> {
        let pairs = form.serialize();
        let builder = self.api.request(form.method().clone(), form.action())?;
        let builder = if form.method() == Method::GET {
            builder.query(&pairs)
        } else {
            builder.form(&pairs)
        };
        self.api.build(builder)
    }

    /// 提交表单并等待响应，非 2xx 视为错误
    pub async fn send(&self, form: &Form) -> Result<String> {
        let request = self.build_request(form)?;
        info!("[Form] 📤 提交表单: {} {}", form.method(), form.action());
        let resp = self.api.execute(request).await?;
        ensure_success(&resp, "表单提交")?;
        Ok(resp.body)
    }

    /// 提交表单（发出即返回）
    ///
    /// 请求在后台任务中发送，表单在请求发出后立即重置，不等待响应。
    /// 构造请求失败时同样会重置表单，并返回错误。
    pub fn submit(
        &self,
        form: &mut Form,
        callback: Option<FormCallback>,
    ) -> Result<JoinHandle<()>> {
        let request = match self.build_request(form) {
            Ok(request) => request,
            Err(e) => {
                error!("[Form] ❌ 构造表单请求失败: {:#}", e);
                form.reset();
                return Err(e);
            }
        };

        info!("[Form] 📤 提交表单: {} {}", form.method(), form.action());
        let api = self.api.clone();
        let handle = tokio::spawn(async move {
            match api.execute(request).await {
                Ok(resp) if resp.is_success() => {
                    debug!("[Form] ✅ 表单提交成功: {}", truncate_body(&resp.body));
                    if let Some(callback) = callback {
                        callback(resp.body);
                    }
                }
                Ok(resp) => {
                    warn!(
                        "[Form] ⚠️ 表单提交失败，HTTP状态: {}, 响应: {}",
                        resp.status,
                        truncate_body(&resp.body)
                    );
                }
                Err(e) => warn!("[Form] ⚠️ 表单提交失败: {:#}", e),
            }
        });

        form.reset();
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::testing::{init_test_logger, FakeReply, FakeTransport};
    use std::sync::Mutex;
    use std::time::Duration;

    fn submitter(transport: Arc<FakeTransport>) -> FormSubmitter {
        let api = ApiClient::with_transport("http://localhost:8000", transport).unwrap();
        FormSubmitter::new(Arc::new(api))
    }

    fn sample_form() -> Form {
        let mut form = Form::new(Method::POST, "/chat/message")
            .field("a", "")
            .field("b", "");
        form.set("a", "1");
        form.set("b", "2");
        form
    }

    #[tokio::test]
    async fn submit_posts_serialized_fields_to_declared_action() {
        init_test_logger();
        let transport = Arc::new(FakeTransport::new(|_| FakeReply::ok(200, "<li>ok</li>")));
        let submitter = submitter(transport.clone());
        let mut form = sample_form();

        let handle = submitter.submit(&mut form, None).unwrap();
        handle.await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].path, "/chat/message");
        assert_eq!(requests[0].body, "a=1&b=2");
        assert_eq!(
            requests[0].content_type.as_deref(),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn form_is_reset_before_the_response_arrives() {
        let transport = Arc::new(FakeTransport::new(|_| {
            FakeReply::ok(200, "late").delayed(Duration::from_secs(10))
        }));
        let submitter = submitter(transport.clone());
        let received = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = received.clone();
        let callback: FormCallback = Arc::new(move |body| sink.lock().unwrap().push(body));
        let mut form = sample_form();

        let handle = submitter.submit(&mut form, Some(callback)).unwrap();

        assert_eq!(form.value("a"), Some(""));
        assert_eq!(form.value("b"), Some(""));
        assert!(received.lock().unwrap().is_empty());

        handle.await.unwrap();
        assert_eq!(*received.lock().unwrap(), vec!["late".to_string()]);
    }

    #[tokio::test]
    async fn callback_is_skipped_on_failure() {
        let transport = Arc::new(FakeTransport::new(|_| FakeReply::ok(500, "boom")));
        let submitter = submitter(transport.clone());
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let callback: FormCallback = Arc::new(move |_| *counter.lock().unwrap() += 1);
        let mut form = sample_form();

        let handle = submitter.submit(&mut form, Some(callback)).unwrap();
        // 失败不会以 panic 或错误的形式传出
        handle.await.unwrap();

        assert_eq!(*calls.lock().unwrap(), 0);
        assert_eq!(form.value("a"), Some(""));
    }

    #[tokio::test]
    async fn network_failure_is_swallowed() {
        let transport = Arc::new(FakeTransport::new(|_| FakeReply::fail("connection refused")));
        let submitter = submitter(transport.clone());
        let mut form = sample_form();

        let handle = submitter.submit(&mut form, None).unwrap();
        handle.await.unwrap();
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn each_submit_issues_exactly_one_request() {
        let transport = Arc::new(FakeTransport::new(|_| FakeReply::ok(200, "")));
        let submitter = submitter(transport.clone());
        let mut form = sample_form();

        let first = submitter.submit(&mut form, None).unwrap();
        form.set("a", "3");
        let second = submitter.submit(&mut form, None).unwrap();
        first.await.unwrap();
        second.await.unwrap();

        let mut bodies: Vec<String> = transport.requests().into_iter().map(|r| r.body).collect();
        bodies.sort();
        assert_eq!(bodies, vec!["a=1&b=2".to_string(), "a=3&b=".to_string()]);
    }

    #[tokio::test]
    async fn get_forms_use_the_query_string() {
        let transport = Arc::new(FakeTransport::new(|_| FakeReply::ok(200, "")));
        let submitter = submitter(transport.clone());
        let mut form = Form::from_attrs("get", "/search").unwrap().field("q", "");
        form.set("q", "hello world");

        submitter.submit(&mut form, None).unwrap().await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].query.as_deref(), Some("q=hello+world"));
        assert!(requests[0].body.is_empty());
    }

    #[tokio::test]
    async fn send_returns_payload_and_reports_errors() {
        let transport = Arc::new(FakeTransport::new(|r| {
            if r.body.contains("bad") {
                FakeReply::ok(400, "nope")
            } else {
                FakeReply::ok(200, "fragment")
            }
        }));
        let submitter = submitter(transport);

        let form = sample_form();
        assert_eq!(submitter.send(&form).await.unwrap(), "fragment");

        let mut bad = sample_form();
        bad.set("a", "bad");
        assert!(submitter.send(&bad).await.is_err());
    }

    #[test]
    fn form_attrs_are_parsed() {
        assert_eq!(Form::from_attrs("post", "/x").unwrap().method(), Method::POST);
        assert_eq!(Form::from_attrs("", "/x").unwrap().method(), Method::GET);
        assert!(Form::from_attrs("no pe", "/x").is_err());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut form = Form::new(Method::POST, "/x").field("room", "7").field("text", "");
        form.set("room", "9");
        form.set("text", "hi");
        assert!(!form.set("missing", "x"));

        form.reset();
        assert_eq!(form.value("room"), Some("7"));
        assert_eq!(form.value("text"), Some(""));
    }
}
