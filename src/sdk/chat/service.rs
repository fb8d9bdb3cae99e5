//! 聊天轮询同步服务层
//!
//! 每轮：从展示容器重新计算游标 → 拉取游标之后的消息 ID →
//! 按返回顺序逐条获取片段并追加。任何一步失败只记录日志并通知监听器，
//! 下一轮照常触发。

use crate::sdk::chat::api::ChatApi;
use crate::sdk::chat::display::MessageDisplay;
use crate::sdk::chat::listener::{ChatListener, EmptyChatListener};
use crate::sdk::chat::models::{ChatSyncerConfig, Cursor, DisplayedMessage};
use crate::sdk::scheduler::{spawn_fixed_delay, LoopHandle};
use crate::sdk::transport::ApiClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 聊天同步器
pub struct ChatSyncer {
    config: ChatSyncerConfig,
    api: ChatApi,
    display: Arc<dyn MessageDisplay>,
    listener: Arc<dyn ChatListener>,
}

impl ChatSyncer {
    /// 创建新的聊天同步器（使用默认空监听器）
    pub fn new(
        config: ChatSyncerConfig,
        api: Arc<ApiClient>,
        display: Arc<dyn MessageDisplay>,
    ) -> Self {
        Self::with_listener(config, api, display, Arc::new(EmptyChatListener))
    }

    /// 创建新的聊天同步器（带自定义监听器）
    pub fn with_listener(
        config: ChatSyncerConfig,
        api: Arc<ApiClient>,
        display: Arc<dyn MessageDisplay>,
        listener: Arc<dyn ChatListener>,
    ) -> Self {
        let api = ChatApi::new(api, config.path_prefix.clone());
        Self {
            config,
            api,
            display,
            listener,
        }
    }

    pub fn config(&self) -> &ChatSyncerConfig {
        &self.config
    }

    pub fn api(&self) -> &ChatApi {
        &self.api
    }

    /// 当前游标（来自展示容器，不做缓存）
    pub fn cursor(&self) -> Cursor {
        self.display.cursor()
    }

    /// 执行一轮同步，返回本轮追加的消息数
    ///
    /// 某条消息获取失败时本轮立即结束，已追加的消息保留，
    /// 下一轮从最后追加的消息继续，不会留下空洞。
    pub async fn sync_once(&self) -> Result<usize> {
        let cursor = self.cursor();
        let message_ids = self.api.get_new_message_ids(cursor).await?;

        let mut appended = 0;
        for message_id in message_ids {
            // 不会被追加的消息不再请求片段
            if let Some(tail) = self.display.last_message_id() {
                if message_id <= tail {
                    debug!(
                        "[ChatSync] ⏭️ 跳过消息 {}：不晚于当前末尾消息 {}",
                        message_id, tail
                    );
                    continue;
                }
            }

            let fragment = self
                .api
                .get_message(message_id)
                .await
                .with_context(|| format!("已追加 {} 条后获取消息 {} 失败", appended, message_id))?;

            if self
                .display
                .append(DisplayedMessage::new(message_id, fragment.clone()))
            {
                appended += 1;
                self.listener.on_new_message(message_id, fragment).await;
            }
        }

        Ok(appended)
    }

    /// 单轮任务：失败只记录，不向外传播
    async fn run_cycle(&self) {
        let cycle_id = Uuid::new_v4();
        match self.sync_once().await {
            Ok(0) => debug!("[ChatSync] 💤 无新消息 (cycle={})", cycle_id),
            Ok(n) => info!("[ChatSync] ✅ 追加 {} 条新消息 (cycle={})", n, cycle_id),
            Err(e) => {
                warn!("[ChatSync] ⚠️ 同步失败 (cycle={}): {:#}", cycle_id, e);
                self.listener.on_sync_failed(format!("{:#}", e)).await;
            }
        }
    }

    /// 启动轮询循环，第一轮立即执行
    pub fn start(self: &Arc<Self>) -> LoopHandle {
        info!(
            "[ChatSync] 🔄 启动消息轮询，间隔: {:?}",
            self.config.poll_interval
        );
        let syncer = self.clone();
        spawn_fixed_delay(
            "ChatSync",
            self.config.poll_interval,
            self.config.overlap,
            self.config.cycle_timeout,
            move || {
                let syncer = syncer.clone();
                Box::pin(async move { syncer.run_cycle().await })
            },
        )
    }
}
