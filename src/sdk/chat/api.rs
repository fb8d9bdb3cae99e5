//! 聊天 HTTP API 客户端
//!
//! 负责所有聊天相关的 HTTP 请求

use crate::sdk::chat::models::{Cursor, MessageId, NewMessagesResp, MAX_CHAT_MESSAGE_LENGTH};
use crate::sdk::form::{Form, FormSubmitter};
use crate::sdk::transport::ApiClient;
use crate::sdk::types::{ensure_success, parse_json_response};
use anyhow::{Context, Result};
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, info};

/// 聊天相关的 HTTP API 客户端
#[derive(Clone)]
pub struct ChatApi {
    api: Arc<ApiClient>,
    forms: FormSubmitter,
    path_prefix: String,
}

impl ChatApi {
    pub fn new(api: Arc<ApiClient>, path_prefix: impl Into<String>) -> Self {
        let path_prefix = path_prefix.into().trim_end_matches('/').to_string();
        Self {
            forms: FormSubmitter::new(api.clone()),
            api,
            path_prefix,
        }
    }

    /// 获取游标之后的新消息 ID（按服务端返回顺序）
    pub async fn get_new_message_ids(&self, cursor: Cursor) -> Result<Vec<MessageId>> {
        let path = format!(
            "{}/chatroom/new_messages/{}",
            self.path_prefix,
            cursor.as_path_segment()
        );
        debug!("[ChatAPI] 📡 请求新消息列表，游标: {}", cursor.as_path_segment());

        let builder = self.api.request(Method::GET, &path)?;
        let resp = self.api.send(builder).await.context("请求新消息列表失败")?;
        let data: NewMessagesResp = parse_json_response(&resp, "新消息列表")?;

        if !data.message_ids.is_empty() {
            info!(
                "[ChatAPI] 📬 游标 {} 之后有 {} 条新消息",
                cursor.as_path_segment(),
                data.message_ids.len()
            );
        }
        Ok(data.message_ids)
    }

    /// 获取单条消息的渲染片段
    pub async fn get_message(&self, message_id: MessageId) -> Result<String> {
        let path = format!("{}/message/{}", self.path_prefix, message_id);

        let builder = self.api.request(Method::GET, &path)?;
        let resp = self
            .api
            .send(builder)
            .await
            .with_context(|| format!("请求消息 {} 失败", message_id))?;
        ensure_success(&resp, "获取消息")?;

        Ok(resp.body)
    }

    /// 发送一条聊天消息，返回服务端渲染的消息片段
    pub async fn send_message(&self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(anyhow::anyhow!("消息内容为空"));
        }
        let len = text.chars().count();
        if len > MAX_CHAT_MESSAGE_LENGTH {
            return Err(anyhow::anyhow!(
                "消息过长: {} 字符（上限 {}）",
                len,
                MAX_CHAT_MESSAGE_LENGTH
            ));
        }

        let mut form = self.message_form();
        form.set("text", text);
        let fragment = self.forms.send(&form).await.context("发送消息失败")?;
        info!("[ChatAPI] ✅ 消息发送成功");
        Ok(fragment)
    }

    /// 发送消息使用的表单（`POST {prefix}/message`，字段 `text`）
    pub fn message_form(&self) -> Form {
        Form::new(Method::POST, format!("{}/message", self.path_prefix)).field("text", "")
    }
}
