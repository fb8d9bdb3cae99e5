//! 位置上报服务层
//!
//! 每轮：检测定位能力 → 读取一次当前位置 → 上报 `lat`/`long`。
//! 不可用、被拒绝或上报失败都只影响当前这一轮。

use crate::sdk::places::api::LocationApi;
use crate::sdk::places::listener::{EmptyLocationListener, LocationListener};
use crate::sdk::places::models::{LocationReporterConfig, LocationSample, LocationUpdateResp};
use crate::sdk::places::provider::LocationProvider;
use crate::sdk::scheduler::{spawn_fixed_delay, LoopHandle};
use crate::sdk::transport::ApiClient;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 单轮上报结果
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    /// 平台没有定位能力，本轮跳过
    Unavailable,
    /// 未取得位置（用户拒绝授权等）
    Denied,
    /// 读数超出经纬度范围，未上报
    Invalid(LocationSample),
    /// 已上报
    Reported(LocationSample, LocationUpdateResp),
}

/// 位置上报器
pub struct LocationReporter {
    config: LocationReporterConfig,
    api: LocationApi,
    provider: Arc<dyn LocationProvider>,
    listener: Arc<dyn LocationListener>,
}

impl LocationReporter {
    /// 创建新的位置上报器（使用默认空监听器）
    pub fn new(
        config: LocationReporterConfig,
        api: Arc<ApiClient>,
        provider: Arc<dyn LocationProvider>,
    ) -> Self {
        Self::with_listener(config, api, provider, Arc::new(EmptyLocationListener))
    }

    /// 创建新的位置上报器（带自定义监听器）
    pub fn with_listener(
        config: LocationReporterConfig,
        api: Arc<ApiClient>,
        provider: Arc<dyn LocationProvider>,
        listener: Arc<dyn LocationListener>,
    ) -> Self {
        let api = LocationApi::new(api, config.endpoint.clone());
        Self {
            config,
            api,
            provider,
            listener,
        }
    }

    pub fn config(&self) -> &LocationReporterConfig {
        &self.config
    }

    /// 执行一轮上报
    pub async fn report_once(&self) -> Result<ReportOutcome> {
        if !self.provider.is_available() {
            return Ok(ReportOutcome::Unavailable);
        }

        let Some(sample) = self.provider.current_position().await else {
            return Ok(ReportOutcome::Denied);
        };

        if !sample.is_valid() {
            return Ok(ReportOutcome::Invalid(sample));
        }

        let resp = self.api.report(&sample).await?;
        self.listener.on_location_reported(sample, resp).await;
        Ok(ReportOutcome::Reported(sample, resp))
    }

    /// 单轮任务：失败只记录，不向外传播
    async fn run_cycle(&self) {
        match self.report_once().await {
            Ok(ReportOutcome::Unavailable) => info!("[LocationReport] 📵 定位不可用，跳过本轮"),
            Ok(ReportOutcome::Denied) => debug!("[LocationReport] 🚫 未获取到位置"),
            Ok(ReportOutcome::Invalid(sample)) => warn!(
                "[LocationReport] ⚠️ 忽略无效坐标: lat={}, long={}",
                sample.latitude, sample.longitude
            ),
            Ok(ReportOutcome::Reported(sample, resp)) => debug!(
                "[LocationReport] 📍 已上报 lat={}, long={} (update={}, success={})",
                sample.latitude, sample.longitude, resp.update, resp.success
            ),
            Err(e) => {
                warn!("[LocationReport] ⚠️ 上报失败: {:#}", e);
                self.listener.on_report_failed(format!("{:#}", e)).await;
            }
        }
    }

    /// 启动上报循环，第一轮立即执行
    pub fn start(self: &Arc<Self>) -> LoopHandle {
        info!(
            "[LocationReport] 🔄 启动位置上报，地址: {}，间隔: {:?}",
            self.api.endpoint(),
            self.config.report_interval
        );
        let reporter = self.clone();
        spawn_fixed_delay(
            "LocationReport",
            self.config.report_interval,
            self.config.overlap,
            // Abort 策略下每轮最多持续一个周期
            None,
            move || {
                let reporter = reporter.clone();
                Box::pin(async move { reporter.run_cycle().await })
            },
        )
    }
}
