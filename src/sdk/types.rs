use crate::sdk::transport::TransportResponse;
use anyhow::Result;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

// 日志中响应 body 的最大展示长度（HTML 片段可能很长）
const MAX_LOGGED_BODY: usize = 200;

/// 截断响应 body，用于日志和错误信息
pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_LOGGED_BODY {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX_LOGGED_BODY).collect();
        format!("{}...（共 {} 字符）", head, body.chars().count())
    }
}

/// 检查 HTTP 状态码，非 2xx 视为错误
pub fn ensure_success(resp: &TransportResponse, operation_name: &str) -> Result<()> {
    if !resp.is_success() {
        error!(
            "[HTTP] {}请求失败，HTTP状态: {}, 响应: {}",
            operation_name,
            resp.status,
            truncate_body(&resp.body)
        );
        return Err(anyhow::anyhow!(
            "HTTP 错误 {}: {}",
            resp.status,
            truncate_body(&resp.body)
        ));
    }
    debug!("[HTTP] {}请求成功，HTTP状态: {}", operation_name, resp.status);
    Ok(())
}

/// 通用 JSON 响应处理：先检查状态码，再反序列化
pub fn parse_json_response<T: DeserializeOwned>(
    resp: &TransportResponse,
    operation_name: &str,
) -> Result<T> {
    ensure_success(resp, operation_name)?;

    serde_json::from_str(&resp.body).map_err(|e| {
        error!(
            "[HTTP] {}反序列化失败: {:?}\n原始响应: {}",
            operation_name,
            e,
            truncate_body(&resp.body)
        );
        anyhow::anyhow!("反序列化响应失败: {:?}", e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        ok: bool,
    }

    #[test]
    fn non_success_status_is_an_error() {
        let resp = TransportResponse::new(StatusCode::NOT_FOUND, "You are not in any chatroom");
        let err = ensure_success(&resp, "探测").unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn parses_json_on_success() {
        let resp = TransportResponse::new(StatusCode::OK, r#"{"ok": true}"#);
        let probe: Probe = parse_json_response(&resp, "探测").unwrap();
        assert!(probe.ok);
    }

    #[test]
    fn html_body_is_not_json() {
        let resp = TransportResponse::new(StatusCode::OK, "<html></html>");
        assert!(parse_json_response::<Probe>(&resp, "探测").is_err());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let shown = truncate_body(&body);
        assert!(shown.starts_with(&"x".repeat(200)));
        assert!(shown.contains("500"));
        assert_eq!(truncate_body("short"), "short");
    }
}
