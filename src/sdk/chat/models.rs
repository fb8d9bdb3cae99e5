//! 聊天本地模型定义

use crate::sdk::scheduler::OverlapPolicy;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// 单条消息的最大长度（与服务端 MAX_CHAT_MESSAGE_LENGTH 一致）
pub const MAX_CHAT_MESSAGE_LENGTH: usize = 140;

/// 消息 ID：服务端分配，单调递增
///
/// 反序列化时同时接受 JSON 数字和数字字符串。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(MessageId(n)),
            RawId::Text(s) => s
                .trim()
                .parse()
                .map(MessageId)
                .map_err(|e| serde::de::Error::custom(format!("无效的消息 ID {:?}: {}", s, e))),
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageId {
    fn from(id: u64) -> Self {
        MessageId(id)
    }
}

/// 同步游标：当前展示的最后一条消息 ID
///
/// 没有任何消息时为空游标，请求路径中以 `0` 表示（服务端 ID 从 1 开始）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor(Option<MessageId>);

impl Cursor {
    pub const EMPTY: Cursor = Cursor(None);

    pub fn new(last_message_id: Option<MessageId>) -> Self {
        Cursor(last_message_id)
    }

    pub fn last_message_id(&self) -> Option<MessageId> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// 请求路径中使用的游标值
    pub fn as_path_segment(&self) -> String {
        match self.0 {
            Some(id) => id.to_string(),
            None => "0".to_string(),
        }
    }
}

/// 已展示的一条消息：ID + 服务端渲染好的片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedMessage {
    pub id: MessageId,
    pub fragment: String,
}

impl DisplayedMessage {
    pub fn new(id: MessageId, fragment: impl Into<String>) -> Self {
        Self {
            id,
            fragment: fragment.into(),
        }
    }
}

/// 新消息 ID 列表响应（GET /chat/chatroom/new_messages/{cursor}）
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessagesResp {
    #[serde(default)]
    pub message_ids: Vec<MessageId>,
}

/// 聊天同步器配置
#[derive(Debug, Clone)]
pub struct ChatSyncerConfig {
    /// 聊天接口路径前缀，例如 `/chat`
    pub path_prefix: String,
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 上一轮未结束时的处理方式
    pub overlap: OverlapPolicy,
    /// 单轮同步的最长时间，超时后取消本轮，下一次触发重新开始
    pub cycle_timeout: Option<Duration>,
}

impl Default for ChatSyncerConfig {
    fn default() -> Self {
        Self {
            path_prefix: "/chat".to_string(),
            poll_interval: Duration::from_millis(1000),
            overlap: OverlapPolicy::Skip,
            cycle_timeout: Some(Duration::from_secs(30)),
        }
    }
}
