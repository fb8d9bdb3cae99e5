//! 消息展示状态
//!
//! 同步逻辑只通过 [`MessageDisplay`] 读取游标、追加消息，与具体渲染层解耦。

use crate::sdk::chat::models::{Cursor, DisplayedMessage, MessageId};
use std::sync::Mutex;
use tracing::warn;

/// 消息展示容器
pub trait MessageDisplay: Send + Sync {
    /// 最后一条已展示消息的 ID
    fn last_message_id(&self) -> Option<MessageId>;

    /// 在末尾追加一条消息
    ///
    /// ID 不大于当前末尾 ID 时拒绝追加并返回 false（游标不回退）。
    fn append(&self, message: DisplayedMessage) -> bool;

    /// 当前游标，每轮同步开始时重新计算
    fn cursor(&self) -> Cursor {
        Cursor::new(self.last_message_id())
    }
}

/// 内存中的有序消息集合
#[derive(Debug, Default)]
pub struct DisplayedMessageSet {
    messages: Mutex<Vec<DisplayedMessage>>,
}

impl DisplayedMessageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用页面初始渲染的消息填充，乱序的消息会被丢弃
    pub fn with_messages(messages: impl IntoIterator<Item = DisplayedMessage>) -> Self {
        let set = Self::new();
        for message in messages {
            set.append(message);
        }
        set
    }

    pub fn snapshot(&self) -> Vec<DisplayedMessage> {
        self.lock().clone()
    }

    pub fn ids(&self) -> Vec<MessageId> {
        self.lock().iter().map(|m| m.id).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DisplayedMessage>> {
        // 只追加不改写，锁中毒时数据依然完整
        self.messages.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MessageDisplay for DisplayedMessageSet {
    fn last_message_id(&self) -> Option<MessageId> {
        self.lock().last().map(|m| m.id)
    }

    fn append(&self, message: DisplayedMessage) -> bool {
        let mut messages = self.lock();
        if let Some(tail) = messages.last() {
            if message.id <= tail.id {
                warn!(
                    "[ChatDisplay] ⚠️ 拒绝追加消息 {}：不晚于当前末尾消息 {}",
                    message.id, tail.id
                );
                return false;
            }
        }
        messages.push(message);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_tracks_the_tail() {
        let display = DisplayedMessageSet::new();
        assert!(display.cursor().is_empty());

        for id in [3, 8, 21] {
            assert!(display.append(DisplayedMessage::new(
                MessageId(id),
                format!("<li>{}</li>", id)
            )));
            assert_eq!(display.cursor().last_message_id(), Some(MessageId(id)));
        }
    }

    #[test]
    fn cursor_never_regresses() {
        let display = DisplayedMessageSet::with_messages([
            DisplayedMessage::new(MessageId(5), "a"),
            DisplayedMessage::new(MessageId(6), "b"),
        ]);

        assert!(!display.append(DisplayedMessage::new(MessageId(6), "dup")));
        assert!(!display.append(DisplayedMessage::new(MessageId(2), "old")));
        assert_eq!(display.ids(), vec![MessageId(5), MessageId(6)]);
        assert_eq!(display.cursor().last_message_id(), Some(MessageId(6)));
    }

    #[test]
    fn initial_messages_out_of_order_are_dropped() {
        let display = DisplayedMessageSet::with_messages([
            DisplayedMessage::new(MessageId(1), "a"),
            DisplayedMessage::new(MessageId(4), "b"),
            DisplayedMessage::new(MessageId(3), "c"),
        ]);
        assert_eq!(display.len(), 2);
        assert_eq!(display.snapshot()[1].fragment, "b");
    }
}
