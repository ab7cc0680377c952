//! 投递响应处理 - 根据推送服务的回执清理失效 token
//!
//! 响应格式：
//! ```json
//! {"data": [{"status": "ok"}, {"status": "error", "details": {"error": "DeviceNotRegistered"}}]}
//! ```
//! 回执按位置对应请求快照中的 token。解析失败、结构不符或越界的条目一律忽略，
//! 只有 `DeviceNotRegistered` 会导致 token 被删除。

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::registry::{Token, TokenRegistry, TokenSnapshot};

/// 设备已注销的错误原因
pub const DEVICE_NOT_REGISTERED: &str = "DeviceNotRegistered";

/// 单条回执
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TicketStatus {
    Ok,
    Error {
        #[serde(default)]
        details: Option<ErrorDetails>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorDetails {
    #[serde(default)]
    pub error: Option<String>,
}

impl TicketStatus {
    /// 错误原因（仅 Error 且带 details.error 时有值）
    pub fn reason(&self) -> Option<&str> {
        match self {
            TicketStatus::Error {
                details: Some(ErrorDetails { error: Some(e) }),
            } => Some(e.as_str()),
            _ => None,
        }
    }

    pub fn is_device_not_registered(&self) -> bool {
        self.reason() == Some(DEVICE_NOT_REGISTERED)
    }
}

/// 一次响应处理的统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryReport {
    /// 响应无法解析或缺少 data 数组
    pub discarded: bool,
    pub ok: usize,
    pub errors: usize,
    /// 结构不符或越界的条目
    pub skipped: usize,
    pub removed: Vec<Token>,
}

/// 解析响应，返回每个位置的回执；整体解析失败时返回 None
pub fn parse_tickets(raw: &str) -> Option<Vec<Option<TicketStatus>>> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let data = value.get("data")?.as_array()?;
    Some(
        data.iter()
            .map(|entry| TicketStatus::deserialize(entry).ok())
            .collect(),
    )
}

/// 处理推送服务响应
///
/// 被标记的 token 按值从存储中的最新序列删除，只在确有删除时写入一次。
pub fn process(registry: &mut TokenRegistry, snapshot: &TokenSnapshot, raw: &str) -> DeliveryReport {
    let mut report = DeliveryReport::default();

    let Some(tickets) = parse_tickets(raw) else {
        debug!("Discarding unparseable push response");
        report.discarded = true;
        return report;
    };

    for (index, ticket) in tickets.iter().enumerate() {
        let (Some(ticket), Some(token)) = (ticket, snapshot.get(index)) else {
            report.skipped += 1;
            continue;
        };

        match ticket {
            TicketStatus::Ok => report.ok += 1,
            TicketStatus::Error { .. } => {
                report.errors += 1;
                if ticket.is_device_not_registered() {
                    if !report.removed.contains(token) {
                        report.removed.push(token.clone());
                    }
                } else {
                    debug!(index, reason = ?ticket.reason(), "Push delivery error, keeping token");
                }
            }
        }
    }

    if !report.removed.is_empty() {
        info!(removed = ?report.removed, "Removing unregistered push tokens");
        registry.remove_all(&report.removed);
    }

    report
}
