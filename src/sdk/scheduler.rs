//! 固定间隔的周期任务调度
//!
//! 聊天轮询和位置上报都是"每隔固定时间执行一轮"的循环：
//! - 第一轮在启动时立即执行，之后每个周期触发一次；
//! - 每一轮作为独立任务运行，慢请求不会推迟下一次触发；
//! - 上一轮尚未结束时，按 [`OverlapPolicy`] 决定跳过、取消还是并行；
//! - 设置了单轮超时的循环，卡住的一轮到期后被取消，后续触发照常执行；
//! - 通过 [`LoopHandle`] 停止循环，丢弃句柄同样会停止循环。
//!
//! 计时基于 tokio 时钟，测试中可使用暂停时钟确定性地推进。

use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// 单轮任务
pub type CycleFuture = BoxFuture<'static, ()>;

/// 上一轮仍在执行时，新一轮触发的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// 跳过本次触发，等待下一个周期
    #[default]
    Skip,
    /// 取消仍在执行的上一轮，立即开始新一轮
    Abort,
    /// 不做限制，允许多轮并行
    Allow,
}

/// 循环运行统计
#[derive(Debug, Default)]
pub struct LoopStats {
    ticks: AtomicU64,
    started: AtomicU64,
    skipped: AtomicU64,
    aborted: AtomicU64,
    timed_out: AtomicU64,
}

/// 周期循环句柄
pub struct LoopHandle {
    name: &'static str,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    stats: Arc<LoopStats>,
}

impl LoopHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 定时器触发次数
    pub fn ticks(&self) -> u64 {
        self.stats.ticks.load(Ordering::SeqCst)
    }

    /// 实际启动的轮数
    pub fn cycles_started(&self) -> u64 {
        self.stats.started.load(Ordering::SeqCst)
    }

    /// 因上一轮未结束而跳过的次数
    pub fn cycles_skipped(&self) -> u64 {
        self.stats.skipped.load(Ordering::SeqCst)
    }

    /// 被取消的轮数
    pub fn cycles_aborted(&self) -> u64 {
        self.stats.aborted.load(Ordering::SeqCst)
    }

    /// 超过单轮超时而被取消的轮数
    pub fn cycles_timed_out(&self) -> u64 {
        self.stats.timed_out.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// 停止循环并等待调度任务退出（仍在执行的一轮会被取消）
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = (&mut self.task).await {
            if !e.is_cancelled() {
                warn!("[Scheduler] ⚠️ {} 调度任务异常退出: {}", self.name, e);
            }
        }
    }
}

/// 启动一个固定间隔的周期循环
///
/// `make_cycle` 每次触发时被调用一次，返回本轮要执行的任务。
/// `cycle_timeout` 为 `Some` 时，单轮执行超过该时长即被取消。
pub fn spawn_fixed_delay<F>(
    name: &'static str,
    period: Duration,
    policy: OverlapPolicy,
    cycle_timeout: Option<Duration>,
    mut make_cycle: F,
) -> LoopHandle
where
    F: FnMut() -> CycleFuture + Send + 'static,
{
    // tokio 的 interval 不接受零周期
    let period = if period.is_zero() {
        warn!("[Scheduler] ⚠️ {} 周期为 0，改为 1ms", name);
        Duration::from_millis(1)
    } else {
        period
    };

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let stats = Arc::new(LoopStats::default());
    let task_stats = stats.clone();

    let task = tokio::spawn(async move {
        info!(
            "[Scheduler] ▶️ {} 启动，周期: {:?}，重叠策略: {:?}，单轮超时: {:?}",
            name, period, policy, cycle_timeout
        );

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: Option<JoinHandle<()>> = None;

        loop {
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    // 发送端被丢弃同样视为停止
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            task_stats.ticks.fetch_add(1, Ordering::SeqCst);

            if let Some(prev) = in_flight.as_ref().filter(|h| !h.is_finished()) {
                match policy {
                    OverlapPolicy::Skip => {
                        task_stats.skipped.fetch_add(1, Ordering::SeqCst);
                        debug!("[Scheduler] ⏭️ {} 上一轮尚未结束，跳过本次触发", name);
                        continue;
                    }
                    OverlapPolicy::Abort => {
                        prev.abort();
                        task_stats.aborted.fetch_add(1, Ordering::SeqCst);
                        debug!("[Scheduler] ✂️ {} 上一轮尚未结束，已取消", name);
                    }
                    OverlapPolicy::Allow => {}
                }
            }

            task_stats.started.fetch_add(1, Ordering::SeqCst);
            let cycle = make_cycle();
            in_flight = Some(match cycle_timeout {
                Some(limit) => {
                    let stats = task_stats.clone();
                    tokio::spawn(async move {
                        if tokio::time::timeout(limit, cycle).await.is_err() {
                            stats.timed_out.fetch_add(1, Ordering::SeqCst);
                            warn!("[Scheduler] ⏱️ {} 本轮超过 {:?} 未结束，已取消", name, limit);
                        }
                    })
                }
                None => tokio::spawn(cycle),
            });
        }

        if let Some(handle) = in_flight {
            handle.abort();
        }
        info!("[Scheduler] ⏹️ {} 已停止", name);
    });

    LoopHandle {
        name,
        stop_tx,
        task,
        stats,
    }
}
