//! 位置上报监听器回调接口

use crate::sdk::places::models::{LocationSample, LocationUpdateResp};
use async_trait::async_trait;

#[async_trait]
pub trait LocationListener: Send + Sync {
    /// 位置已上报
    async fn on_location_reported(&self, sample: LocationSample, resp: LocationUpdateResp);

    /// 上报失败（循环会继续）
    async fn on_report_failed(&self, reason: String);
}

/// 默认空实现（无操作）
pub struct EmptyLocationListener;

#[async_trait]
impl LocationListener for EmptyLocationListener {
    async fn on_location_reported(&self, _sample: LocationSample, _resp: LocationUpdateResp) {}

    async fn on_report_failed(&self, _reason: String) {}
}
