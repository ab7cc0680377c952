//! 插件选项 - 内存镜像、默认值和描述
//!
//! 选项持久化在 [`ConfigStore`](crate::infra::store::ConfigStore) 中，
//! 这里只维护运行时读取用的镜像，避免每次回调都访问存储。

/// push token 列表选项名
pub const PUSH_TOKENS: &str = "push_tokens";
/// 是否为当前 buffer 发送通知
pub const NOTIFY_CURRENT_BUFFER: &str = "notify_current_buffer";

/// 宿主中插件选项的完整前缀
pub const OPTION_PREFIX: &str = "plugins.var.python.WeechatRN.";

/// token 持久化时的分隔符
pub const TOKEN_DELIMITER: char = ',';

/// 选项默认值
#[derive(Debug, Clone, Copy)]
pub struct OptionDefault {
    pub name: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

impl OptionDefault {
    /// 带默认值的完整描述，与宿主 `/help` 中显示的一致
    pub fn full_description(&self) -> String {
        format!("{} (default: \"{}\")", self.description, self.default)
    }
}

pub const OPTION_DEFAULTS: &[OptionDefault] = &[
    OptionDefault {
        name: PUSH_TOKENS,
        default: "",
        description: "Comma separated list of push tokens (appended to by /weechatrn <token>)",
    },
    OptionDefault {
        name: NOTIFY_CURRENT_BUFFER,
        default: "on",
        description: "Option to send notifications for the current buffer",
    },
];

/// 去掉宿主前缀，返回已知的选项名
///
/// 同时接受 `push_tokens` 和 `plugins.var.python.WeechatRN.push_tokens`。
pub fn normalize_option_name(option: &str) -> Option<&'static str> {
    let bare = option.strip_prefix(OPTION_PREFIX).unwrap_or(option);
    OPTION_DEFAULTS
        .iter()
        .find(|o| o.name == bare)
        .map(|o| o.name)
}

/// 宿主的布尔值约定
pub fn parse_boolean(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "yes" | "y" | "true" | "t" | "1"
    )
}

/// 将分隔的字符串解析为 token 序列（空片段忽略）
pub fn split_tokens(raw: &str) -> Vec<String> {
    raw.split(TOKEN_DELIMITER)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// 将 token 序列拼接为持久化格式
pub fn join_tokens(tokens: &[String]) -> String {
    tokens.join(TOKEN_DELIMITER.to_string().as_str())
}

/// 分类器读取的设置镜像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub notify_current_buffer: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            notify_current_buffer: true,
        }
    }
}

impl Options {
    /// 应用一次配置变更，返回是否命中了本结构维护的选项
    pub fn apply(&mut self, option: &str, value: &str) -> bool {
        match normalize_option_name(option) {
            Some(NOTIFY_CURRENT_BUFFER) => {
                self.notify_current_buffer = parse_boolean(value);
                true
            }
            _ => false,
        }
    }
}
