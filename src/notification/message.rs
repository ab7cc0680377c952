//! 推送通知消息

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::host::LineId;

/// 推送通知
///
/// 每个符合条件的事件构建一次，之后不可修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    title: String,
    body: String,
    /// 路由提示（bufferId / lineId），移动端用于深链
    metadata: Map<String, Value>,
}

impl Notification {
    /// 创建无 metadata 的消息
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            metadata: Map::new(),
        }
    }

    /// 设置任意 metadata 字段
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// 设置 buffer / line 路由提示，行未知时 lineId 为 null
    pub fn with_route(self, buffer_id: String, line_id: Option<LineId>) -> Self {
        let line_id = match line_id {
            Some(LineId::Id(id)) => Value::from(id),
            Some(LineId::Pointer(pointer)) => Value::from(pointer),
            None => Value::Null,
        };
        self.with_data("bufferId", buffer_id).with_data("lineId", line_id)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}
