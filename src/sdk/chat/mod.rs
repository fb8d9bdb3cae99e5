//! 聊天模块
//!
//! 实现聊天室的消息轮询同步和消息发送

pub mod api;
pub mod display;
pub mod listener;
pub mod models;
pub mod service;

// 重新导出主要类型
pub use api::ChatApi;
pub use display::{DisplayedMessageSet, MessageDisplay};
pub use listener::{ChatListener, EmptyChatListener};
pub use models::{
    ChatSyncerConfig, Cursor, DisplayedMessage, MessageId, NewMessagesResp,
    MAX_CHAT_MESSAGE_LENGTH,
};
pub use service::ChatSyncer;
