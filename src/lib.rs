//! WeechatRN push bridge - 聊天事件到移动推送的分发与 token 生命周期管理

pub mod bridge;
pub mod cli;
pub mod host;
pub mod infra;
pub mod notification;
pub mod options;
pub mod registry;

pub use bridge::{Bridge, BridgeEvent};
pub use host::{BufferRef, ChatLineEvent, HostEvent, HostVersion, LineIndex, LineLookup, LineRef};
pub use infra::{ConfigStore, FileConfigStore, MemoryConfigStore};
pub use notification::{
    classify, DeliveryOutcome, DeliveryReport, DispatchOutcome, ExpoTransport, Notification,
    PushDispatcher, PushRequest, PushTransport, TransportConfig,
};
pub use options::Options;
pub use registry::{Token, TokenRegistry, TokenSnapshot};
