//! 推送传输 - 把批量请求发送到 Expo push 服务
//!
//! 提交立即返回，HTTP 请求在事件循环的 task 中完成，
//! 响应连同请求时的快照作为 [`BridgeEvent::Delivery`] 送回事件循环。

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::bridge::BridgeEvent;
use crate::registry::TokenSnapshot;

/// Expo push 接口
pub const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

/// 批量请求中的一条消息
#[derive(Debug, Serialize)]
pub struct PushMessage<'a> {
    pub to: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub data: &'a Map<String, Value>,
}

/// 已序列化的批量请求
#[derive(Debug, Clone)]
pub struct PushRequest {
    /// 请求时的 token 顺序，响应按位置对应
    pub snapshot: TokenSnapshot,
    /// JSON 数组
    pub body: String,
}

/// 推送服务的原始响应
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOutcome {
    pub snapshot: TokenSnapshot,
    pub response: String,
}

/// 推送传输接口
pub trait PushTransport {
    /// 传输名称（用于日志）
    fn name(&self) -> &str;

    /// 提交请求，不等待响应
    fn submit(&self, request: PushRequest) -> Result<()>;
}

/// 传输配置
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub endpoint: String,
    /// 超时时间 (秒)
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: EXPO_PUSH_URL.to_string(),
            timeout_secs: 20,
        }
    }
}

/// Expo HTTP 传输
#[derive(Debug)]
pub struct ExpoTransport {
    client: Client,
    config: TransportConfig,
    events: UnboundedSender<BridgeEvent>,
}

impl ExpoTransport {
    pub fn new(config: TransportConfig, events: UnboundedSender<BridgeEvent>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            config,
            events,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

impl PushTransport for ExpoTransport {
    fn name(&self) -> &str {
        "expo"
    }

    fn submit(&self, request: PushRequest) -> Result<()> {
        let handle = tokio::runtime::Handle::try_current()
            .context("No async runtime to submit push request")?;

        let client = self.client.clone();
        let endpoint = self.config.endpoint.clone();
        let events = self.events.clone();

        handle.spawn(async move {
            let PushRequest { snapshot, body } = request;

            let response = match client
                .post(&endpoint)
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "Push request failed");
                    return;
                }
            };

            // 与 curl failonerror 一致：HTTP 错误不处理响应体
            let status = response.status();
            if !status.is_success() {
                warn!(status = %status, "Push service returned error status");
                return;
            }

            let text = match response.text().await {
                Ok(t) => t,
                Err(e) => {
                    warn!(error = %e, "Failed to read push response");
                    return;
                }
            };

            if text.trim().is_empty() {
                debug!("Empty push response");
                return;
            }

            let delivery = BridgeEvent::Delivery(DeliveryOutcome {
                snapshot,
                response: text,
            });
            if events.send(delivery).is_err() {
                debug!("Event loop closed, dropping push response");
            }
        });

        Ok(())
    }
}
