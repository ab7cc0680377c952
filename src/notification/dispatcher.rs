//! 推送分发器 - 为所有 token 构建一次批量请求

use anyhow::Result;
use tracing::{debug, info, warn};

use super::message::Notification;
use super::transport::{PushMessage, PushRequest, PushTransport};
use crate::registry::TokenSnapshot;

/// 一次分发的结果
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// 没有注册的 token，不发请求
    Idle,
    /// 已提交，等待响应
    Submitted { tokens: usize },
    /// dry-run 模式，只记录日志
    DryRun { tokens: usize },
    /// 提交失败，通知被丢弃（不重试）
    Dropped { reason: String },
}

/// 构建批量请求体，顺序与快照一致
pub fn build_batch(snapshot: &TokenSnapshot, notification: &Notification) -> Result<String> {
    let batch: Vec<PushMessage<'_>> = snapshot
        .iter()
        .map(|token| PushMessage {
            to: token,
            title: notification.title(),
            body: notification.body(),
            data: notification.metadata(),
        })
        .collect();
    Ok(serde_json::to_string(&batch)?)
}

/// 推送分发器
pub struct PushDispatcher<T: PushTransport> {
    transport: T,
    dry_run: bool,
}

impl<T: PushTransport> PushDispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            dry_run: false,
        }
    }

    /// 设置 dry-run 模式
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 发送通知到快照中的所有 token
    pub fn dispatch(&self, snapshot: TokenSnapshot, notification: &Notification) -> DispatchOutcome {
        if snapshot.is_empty() {
            debug!("No push tokens registered, skipping dispatch");
            return DispatchOutcome::Idle;
        }

        let tokens = snapshot.len();
        let body = match build_batch(&snapshot, notification) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to serialize push batch, dropping notification");
                return DispatchOutcome::Dropped {
                    reason: e.to_string(),
                };
            }
        };

        if self.dry_run {
            info!(tokens, body = %body, "[DRY-RUN] Would submit push batch");
            return DispatchOutcome::DryRun { tokens };
        }

        match self.transport.submit(PushRequest { snapshot, body }) {
            Ok(()) => {
                info!(
                    transport = self.transport.name(),
                    tokens,
                    title = notification.title(),
                    "Push batch submitted"
                );
                DispatchOutcome::Submitted { tokens }
            }
            Err(e) => {
                warn!(
                    transport = self.transport.name(),
                    error = %e,
                    "Push submission failed, dropping notification"
                );
                DispatchOutcome::Dropped {
                    reason: e.to_string(),
                }
            }
        }
    }
}
