//! buffer / line 标识的表示方式
//!
//! 移动端用这些标识做深链跳转，表示方式随宿主版本变化：
//! - 4.3.0 起 buffer 有数字 id，之前使用指针字符串
//! - 4.4.0 起 line_data 有数字 id，之前使用指针字符串

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::event::{BufferRef, LineRef};

/// 宿主版本号（`0xMMmmpp00`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct HostVersion(pub u32);

impl HostVersion {
    /// buffer 开始提供数字 id 的版本
    pub const BUFFER_ID: HostVersion = HostVersion(0x0403_0000);
    /// line_data 开始提供数字 id 的版本
    pub const LINE_ID: HostVersion = HostVersion(0x0404_0000);

    /// 解析 `info_get("version_number")` 的输出，无法解析时视为 0
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        HostVersion(parsed.unwrap_or(0))
    }

    /// 通知 metadata 中的 bufferId，始终是字符串
    pub fn buffer_id(&self, buffer: &BufferRef) -> String {
        match buffer.id {
            Some(id) if *self >= Self::BUFFER_ID => id.to_string(),
            _ => buffer.pointer.clone(),
        }
    }

    /// 通知 metadata 中的 lineId
    pub fn line_id(&self, line: &LineRef) -> LineId {
        match line.id {
            Some(id) if *self >= Self::LINE_ID => LineId::Id(id),
            _ => LineId::Pointer(line.pointer.clone()),
        }
    }
}

impl std::fmt::Display for HostVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let v = self.0;
        write!(f, "{}.{}.{}", v >> 24, (v >> 16) & 0xff, (v >> 8) & 0xff)
    }
}

/// 行标识：数字 id 或指针字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineId {
    Id(i64),
    Pointer(String),
}

/// 查询 buffer 最后追加的行
pub trait LineLookup {
    fn last_line(&self, buffer: &BufferRef) -> Option<LineRef>;
}

/// 每个 buffer 最后一行的镜像，由 line 事件更新
#[derive(Debug, Default)]
pub struct LineIndex {
    last_lines: HashMap<String, LineRef>,
}

impl LineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, buffer: &BufferRef, line: LineRef) {
        self.last_lines.insert(buffer.pointer.clone(), line);
    }

    /// 宿主无法给出最后一行时清除旧记录，避免指向之前的消息
    pub fn forget(&mut self, buffer: &BufferRef) {
        self.last_lines.remove(&buffer.pointer);
    }

    pub fn len(&self) -> usize {
        self.last_lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_lines.is_empty()
    }
}

impl LineLookup for LineIndex {
    fn last_line(&self, buffer: &BufferRef) -> Option<LineRef> {
        self.last_lines.get(&buffer.pointer).cloned()
    }
}
