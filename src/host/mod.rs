//! 宿主聊天客户端模型
//!
//! 宿主中的中继脚本把事件逐行写成 JSON，本 crate 只消费这些事件：
//! - `host_info`: 宿主版本号
//! - `command`: `/weechatrn <token>` 命令
//! - `config_changed`: 插件选项变化
//! - `line`: 新打印的聊天行
//!
//! 中继脚本可以转发所有打印的行，分类器只处理带 `irc_privmsg` 标签的行。

pub mod event;
pub mod identifiers;
pub mod reader;

pub use event::{BufferRef, ChatLineEvent, HostEvent, LineRef, PRIVMSG_TAG, SUPPRESS_TAG};
pub use identifiers::{HostVersion, LineId, LineIndex, LineLookup};
pub use reader::{parse_host_event, spawn_reader, spawn_stdin_reader};
