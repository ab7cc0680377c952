//! Output formatting for CLI commands

use serde::Serialize;

use crate::options::OPTION_DEFAULTS;

/// 选项展示行
#[derive(Debug, Serialize)]
pub struct OptionRow {
    pub name: &'static str,
    pub value: Option<String>,
    pub description: String,
}

/// Format output as pretty JSON
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// token 列表：JSON 或带序号的文本
pub fn format_tokens(tokens: &[String], json: bool) -> String {
    if json {
        return format_json(&tokens);
    }
    if tokens.is_empty() {
        return "No push tokens registered".to_string();
    }
    tokens
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{:>3}. {}", i + 1, t))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 选项列表
pub fn format_options(rows: &[OptionRow], json: bool) -> String {
    if json {
        return format_json(&rows);
    }
    rows.iter()
        .map(|r| {
            format!(
                "{} = \"{}\"\n    {}",
                r.name,
                r.value.as_deref().unwrap_or(""),
                r.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 用读取函数构建所有已知选项的展示行
pub fn option_rows(get: impl Fn(&str) -> Option<String>) -> Vec<OptionRow> {
    OPTION_DEFAULTS
        .iter()
        .map(|o| OptionRow {
            name: o.name,
            value: get(o.name),
            description: o.full_description(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens(&[], false), "No push tokens registered");
        let tokens = vec!["a".to_string(), "b".to_string()];
        assert_eq!(format_tokens(&tokens, false), "  1. a\n  2. b");
        assert_eq!(
            serde_json::from_str::<Vec<String>>(&format_tokens(&tokens, true)).unwrap(),
            tokens
        );
    }

    #[test]
    fn test_option_rows() {
        let rows = option_rows(|name| (name == "push_tokens").then(|| "x".to_string()));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value.as_deref(), Some("x"));
        assert!(rows[1].value.is_none());
        assert!(format_options(&rows, false).contains("push_tokens = \"x\""));
    }
}
