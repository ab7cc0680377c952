//! 事件分类器 - 判断聊天行是否需要推送
//!
//! 按顺序短路判断：
//! 1. 不带 `irc_privmsg` 标签 → 不通知（join/part/notice 等）
//! 2. 带 `notify_none` 标签 → 不通知（自己发出的消息等）
//! 3. 关闭了 notify_current_buffer 且是当前 buffer → 不通知
//! 4. 私聊 buffer → "Private message from ..."
//! 5. 高亮 → "Highlight in ..."
//!
//! 每个事件最多产生一条通知，私聊优先于高亮。

use tracing::debug;

use super::message::Notification;
use crate::host::{ChatLineEvent, HostVersion, LineLookup, PRIVMSG_TAG, SUPPRESS_TAG};
use crate::options::Options;

/// 分类一行聊天消息
pub fn classify(
    event: &ChatLineEvent,
    options: &Options,
    version: HostVersion,
    lines: &dyn LineLookup,
) -> Option<Notification> {
    if !event.has_tag(PRIVMSG_TAG) {
        debug!(buffer = %event.buffer.pointer, tags = ?event.tags, "Not a chat message, skipping");
        return None;
    }

    if event.has_tag(SUPPRESS_TAG) {
        debug!(buffer = %event.buffer.pointer, "Line tagged notify_none, skipping");
        return None;
    }

    if !options.notify_current_buffer && event.current {
        debug!(buffer = %event.buffer.pointer, "Line in current buffer, skipping");
        return None;
    }

    let title = if event.private {
        format!("Private message from {}", event.prefix)
    } else if event.highlight {
        format!("Highlight in {}", event.display_name())
    } else {
        return None;
    };

    let body = format!("<{}> {}", event.prefix, event.message);
    let buffer_id = version.buffer_id(&event.buffer);
    let line_id = lines
        .last_line(&event.buffer)
        .map(|line| version.line_id(&line));

    Some(Notification::new(title, body).with_route(buffer_id, line_id))
}
