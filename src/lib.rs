pub mod sdk;

// 重新导出常用类型，方便外部使用
pub use sdk::{
    chat::{ChatSyncer, ChatSyncerConfig, DisplayedMessageSet, MessageDisplay, MessageId},
    client::{ClientConfig, RundezvousClient},
    form::{Form, FormSubmitter},
    places::{LocationProvider, LocationReporter, LocationReporterConfig, LocationSample},
    scheduler::{LoopHandle, OverlapPolicy},
};
