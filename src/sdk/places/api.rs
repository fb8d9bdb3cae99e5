//! 位置上报 HTTP API

use crate::sdk::places::models::{LocationSample, LocationUpdateResp};
use crate::sdk::transport::ApiClient;
use crate::sdk::types::{ensure_success, truncate_body};
use anyhow::{Context, Result};
use reqwest::Method;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct LocationApi {
    api: Arc<ApiClient>,
    endpoint: String,
}

impl LocationApi {
    pub fn new(api: Arc<ApiClient>, endpoint: impl Into<String>) -> Self {
        Self {
            api,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 上报位置：`POST {endpoint}`，表单字段 `lat`、`long`
    ///
    /// 响应内容只用于日志，无法解析为 JSON 时返回默认值。
    pub async fn report(&self, sample: &LocationSample) -> Result<LocationUpdateResp> {
        let builder = self
            .api
            .request(Method::POST, &self.endpoint)?
            .form(&sample.form_pairs()[..]);
        let resp = self.api.send(builder).await.context("请求位置上报失败")?;
        ensure_success(&resp, "位置上报")?;

        match serde_json::from_str::<LocationUpdateResp>(&resp.body) {
            Ok(update) => Ok(update),
            Err(e) => {
                debug!(
                    "[LocationAPI] 上报响应不是预期的 JSON（{}）: {}",
                    e,
                    truncate_body(&resp.body)
                );
                Ok(LocationUpdateResp::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::testing::{FakeReply, FakeTransport};

    fn location_api(transport: Arc<FakeTransport>) -> LocationApi {
        let api = ApiClient::with_transport("http://localhost:8000", transport).unwrap();
        LocationApi::new(Arc::new(api), "/places/update_location")
    }

    #[tokio::test]
    async fn posts_lat_and_long_as_form() {
        let transport = Arc::new(FakeTransport::new(|_| {
            FakeReply::ok(200, r#"{"update": true, "success": true}"#)
        }));
        let api = location_api(transport.clone());

        let resp = api.report(&LocationSample::new(45.5, -122.25)).await.unwrap();

        assert!(resp.update);
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].path, "/places/update_location");
        assert_eq!(requests[0].body, "lat=45.5&long=-122.25");
    }

    #[tokio::test]
    async fn html_response_is_ignored() {
        let transport = Arc::new(FakeTransport::new(|_| {
            FakeReply::ok(200, "<html>location required</html>")
        }));
        let api = location_api(transport);

        let resp = api.report(&LocationSample::new(1.0, 2.0)).await.unwrap();
        assert_eq!(resp, LocationUpdateResp::default());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let transport = Arc::new(FakeTransport::new(|_| FakeReply::ok(500, "oops")));
        let api = location_api(transport);

        assert!(api.report(&LocationSample::new(1.0, 2.0)).await.is_err());
    }
}
