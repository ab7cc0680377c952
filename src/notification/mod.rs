//! 通知层 - 从聊天行到推送回执的完整链路
//!
//! # 流程
//! 1. `classifier`: 聊天行 → 零或一条 [`Notification`]
//! 2. `dispatcher`: 取 token 快照，构建批量请求
//! 3. `transport`: 异步提交到 Expo，响应连同快照送回事件循环
//! 4. `response`: 解析回执，删除 `DeviceNotRegistered` 的 token
//!
//! # 使用示例
//! ```ignore
//! use weechatrn_push::notification::{classify, PushDispatcher};
//!
//! if let Some(n) = classify(&line, &options, version, &lines) {
//!     dispatcher.dispatch(registry.snapshot(), &n);
//! }
//! ```

pub mod classifier;
pub mod dispatcher;
pub mod message;
pub mod response;
pub mod transport;

pub use classifier::classify;
pub use dispatcher::{build_batch, DispatchOutcome, PushDispatcher};
pub use message::Notification;
pub use response::{process, DeliveryReport, TicketStatus, DEVICE_NOT_REGISTERED};
pub use transport::{
    DeliveryOutcome, ExpoTransport, PushMessage, PushRequest, PushTransport, TransportConfig,
    EXPO_PUSH_URL,
};
