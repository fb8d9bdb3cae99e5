//! 位置模块
//!
//! 周期性读取设备位置并上报到服务端

pub mod api;
pub mod listener;
pub mod models;
pub mod provider;
pub mod service;

pub use api::LocationApi;
pub use listener::{EmptyLocationListener, LocationListener};
pub use models::{LocationReporterConfig, LocationSample, LocationUpdateResp};
pub use provider::{LocationProvider, StaticLocationProvider, UnavailableLocationProvider};
pub use service::{LocationReporter, ReportOutcome};
