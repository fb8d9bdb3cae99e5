//! 聊天监听器回调接口

use crate::sdk::chat::models::MessageId;
use async_trait::async_trait;

/// 聊天同步回调
#[async_trait]
pub trait ChatListener: Send + Sync {
    /// 新消息已追加到展示容器，`fragment` 为服务端渲染的原始片段
    async fn on_new_message(&self, message_id: MessageId, fragment: String);

    /// 一轮同步失败（循环会继续）
    async fn on_sync_failed(&self, reason: String);
}

/// 默认空实现（无操作）
pub struct EmptyChatListener;

#[async_trait]
impl ChatListener for EmptyChatListener {
    async fn on_new_message(&self, _message_id: MessageId, _fragment: String) {}

    async fn on_sync_failed(&self, _reason: String) {}
}
