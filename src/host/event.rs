//! 宿主事件定义

use serde::{Deserialize, Serialize};

/// 不通知标签（自己发出的消息等）
pub const SUPPRESS_TAG: &str = "notify_none";

/// IRC PRIVMSG 行的标签，join/part/notice 等行不带这个标签
pub const PRIVMSG_TAG: &str = "irc_privmsg";

/// buffer 引用：宿主指针字符串 + 新版本宿主提供的数字 id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferRef {
    pub pointer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl BufferRef {
    pub fn new(pointer: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

/// 行引用：line_data 指针 + 新版本宿主提供的数字 id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRef {
    pub pointer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// 新打印的聊天行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLineEvent {
    pub buffer: BufferRef,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub highlight: bool,
    pub prefix: String,
    pub message: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub name: String,
    /// buffer 的 localvar_type 是否为 private
    #[serde(default)]
    pub private: bool,
    /// 是否为用户当前聚焦的 buffer
    #[serde(default)]
    pub current: bool,
    /// 该 buffer 最后追加的行（宿主在打印后读取）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_line: Option<LineRef>,
}

impl ChatLineEvent {
    pub fn new(buffer: BufferRef, prefix: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            buffer,
            tags: Vec::new(),
            highlight: false,
            prefix: prefix.into(),
            message: message.into(),
            short_name: String::new(),
            name: String::new(),
            private: false,
            current: false,
            last_line: None,
        }
    }

    /// 解析宿主的逗号分隔标签
    pub fn with_tag_string(mut self, tags: &str) -> Self {
        self.tags = tags
            .split(',')
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        self
    }

    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn with_names(mut self, short_name: impl Into<String>, name: impl Into<String>) -> Self {
        self.short_name = short_name.into();
        self.name = name.into();
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    pub fn with_current(mut self, current: bool) -> Self {
        self.current = current;
        self
    }

    pub fn with_last_line(mut self, line: LineRef) -> Self {
        self.last_line = Some(line);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// 显示名：short_name 为空时回退到完整名称
    pub fn display_name(&self) -> &str {
        if self.short_name.is_empty() {
            &self.name
        } else {
            &self.short_name
        }
    }
}

/// 宿主发来的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// 宿主版本号，十六进制（`0x04040000`）或十进制字符串
    HostInfo { version_number: String },
    /// `/weechatrn` 命令参数
    Command {
        #[serde(default)]
        args: String,
    },
    /// 选项变化
    ConfigChanged { option: String, value: String },
    /// 聊天行
    Line(ChatLineEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_event() {
        let json = r##"{"type":"line","buffer":{"pointer":"0x55d0","id":1709},
            "tags":["irc_privmsg","notify_message"],"highlight":true,
            "prefix":"alice","message":"hi","short_name":"#general",
            "name":"libera.#general","last_line":{"pointer":"0x77aa","id":42}}"##;
        let event: HostEvent = serde_json::from_str(json).unwrap();

        match event {
            HostEvent::Line(line) => {
                assert_eq!(line.buffer, BufferRef::new("0x55d0").with_id(1709));
                assert!(line.highlight);
                assert!(!line.private);
                assert!(!line.current);
                assert_eq!(line.display_name(), "#general");
                assert_eq!(line.last_line.unwrap().id, Some(42));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_command_and_config_events() {
        let cmd: HostEvent = serde_json::from_str(r#"{"type":"command","args":" tok "}"#).unwrap();
        assert_eq!(cmd, HostEvent::Command { args: " tok ".to_string() });

        let cfg: HostEvent = serde_json::from_str(
            r#"{"type":"config_changed","option":"plugins.var.python.WeechatRN.push_tokens","value":"a,b"}"#,
        )
        .unwrap();
        assert!(matches!(cfg, HostEvent::ConfigChanged { .. }));
    }

    #[test]
    fn test_tag_string_and_display_name() {
        let event = ChatLineEvent::new(BufferRef::new("0x1"), "bob", "yo")
            .with_tag_string("irc_privmsg,notify_none,,self_msg")
            .with_names("", "libera.#rust");

        assert_eq!(event.tags, vec!["irc_privmsg", "notify_none", "self_msg"]);
        assert!(event.has_tag(SUPPRESS_TAG));
        assert_eq!(event.display_name(), "libera.#rust");
    }
}
