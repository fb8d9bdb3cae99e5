//! 定位能力抽象

use crate::sdk::places::models::LocationSample;
use async_trait::async_trait;

/// 平台定位能力
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// 平台是否提供定位能力（特性检测，不涉及授权）
    fn is_available(&self) -> bool;

    /// 读取一次当前位置
    ///
    /// 用户拒绝授权时返回 `None`；实现也可能一直不返回，由调度器负责取消。
    async fn current_position(&self) -> Option<LocationSample>;
}

/// 固定坐标（命令行和测试使用）
#[derive(Debug, Clone, Copy)]
pub struct StaticLocationProvider {
    latitude: f64,
    longitude: f64,
}

impl StaticLocationProvider {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[async_trait]
impl LocationProvider for StaticLocationProvider {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Option<LocationSample> {
        Some(LocationSample::new(self.latitude, self.longitude))
    }
}

/// 没有定位能力的平台
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLocationProvider;

#[async_trait]
impl LocationProvider for UnavailableLocationProvider {
    fn is_available(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Option<LocationSample> {
        None
    }
}
