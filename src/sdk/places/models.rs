//! 位置本地模型定义

use crate::sdk::scheduler::OverlapPolicy;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

/// 一次定位读数，仅在上报时使用，不做持久化
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub taken_at: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            taken_at: Utc::now(),
        }
    }

    /// 经纬度是否在合法范围内
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// 上报表单字段：`lat`、`long`
    pub fn form_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("lat", self.latitude.to_string()),
            ("long", self.longitude.to_string()),
        ]
    }
}

/// 位置上报响应，服务端返回 `{"update": bool, "success": bool}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LocationUpdateResp {
    /// 位置是否发生变化
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub success: bool,
}

/// 位置上报器配置
#[derive(Debug, Clone)]
pub struct LocationReporterConfig {
    /// 上报地址（路径或完整 URL）
    pub endpoint: String,
    /// 上报间隔
    pub report_interval: Duration,
    pub overlap: OverlapPolicy,
}

impl LocationReporterConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            report_interval: Duration::from_millis(30_000),
            // 一直未返回的定位请求在下一轮被取消
            overlap: OverlapPolicy::Abort,
        }
    }
}
