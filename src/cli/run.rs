//! run / test-push 命令
//!
//! `run` 从 stdin 读取宿主事件并驱动事件循环；
//! `test-push` 向所有 token 发送一条测试通知并等待回执。

use anyhow::Result;
use clap::Args;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::StoreArgs;
use crate::bridge::{Bridge, BridgeEvent};
use crate::host::{spawn_stdin_reader, HostVersion};
use crate::notification::{
    DispatchOutcome, ExpoTransport, Notification, PushDispatcher, TransportConfig, EXPO_PUSH_URL,
};

/// 推送服务相关参数
#[derive(Args, Debug, Clone)]
pub struct PushArgs {
    /// 推送服务地址
    #[arg(long, default_value = EXPO_PUSH_URL)]
    pub endpoint: String,
    /// 请求超时（秒）
    #[arg(long, default_value = "20")]
    pub timeout: u64,
    /// Dry-run 模式（只打印不发送）
    #[arg(long)]
    pub dry_run: bool,
}

impl PushArgs {
    fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            endpoint: self.endpoint.clone(),
            timeout_secs: self.timeout,
        }
    }
}

/// run 命令参数
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub push: PushArgs,
    /// 宿主版本号（也可由 host_info 事件提供）
    #[arg(long)]
    pub host_version: Option<String>,
}

/// test-push 命令参数
#[derive(Args, Debug)]
pub struct TestPushArgs {
    #[command(flatten)]
    pub push: PushArgs,
    /// 通知标题
    #[arg(long, default_value = "WeechatRN")]
    pub title: String,
    /// 通知内容
    #[arg(long, default_value = "Test notification")]
    pub body: String,
}

/// 运行推送桥直到 stdin 关闭
pub async fn handle_run(store: &StoreArgs, args: RunArgs) -> Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let transport = ExpoTransport::new(args.push.transport_config(), tx.clone())?;
    let dispatcher = PushDispatcher::new(transport).with_dry_run(args.push.dry_run);

    let mut bridge = Bridge::new(Box::new(store.open()?), dispatcher);
    if let Some(version) = &args.host_version {
        bridge = bridge.with_version(HostVersion::parse(version));
    }

    spawn_stdin_reader(tx);
    bridge.run(rx).await;
    Ok(())
}

/// 发送测试通知，等待一次回执用于清理失效 token
pub async fn handle_test_push(store: &StoreArgs, args: TestPushArgs) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let timeout = Duration::from_secs(args.push.timeout);
    let transport = ExpoTransport::new(args.push.transport_config(), tx)?;
    let dispatcher = PushDispatcher::new(transport).with_dry_run(args.push.dry_run);
    let mut bridge = Bridge::new(Box::new(store.open()?), dispatcher);

    let notification = Notification::new(&args.title, &args.body);
    match bridge.notify(&notification) {
        DispatchOutcome::Submitted { tokens } => {
            info!(tokens, "Waiting for push response");
        }
        DispatchOutcome::Idle => {
            println!("No push tokens registered");
            return Ok(());
        }
        DispatchOutcome::DryRun { tokens } => {
            println!("[DRY-RUN] Would send to {} token(s)", tokens);
            return Ok(());
        }
        DispatchOutcome::Dropped { reason } => {
            anyhow::bail!("Push request could not be submitted: {}", reason);
        }
    }

    // transport 持有 sender，这里只能靠超时结束等待
    match tokio::time::timeout(timeout, rx.recv()).await {
        Ok(Some(BridgeEvent::Delivery(outcome))) => {
            let report = bridge.on_delivery(outcome);
            println!(
                "Delivered: {} ok, {} error(s), {} token(s) removed",
                report.ok,
                report.errors,
                report.removed.len()
            );
        }
        Ok(_) => warn!("Push response channel closed"),
        Err(_) => println!("No push response received"),
    }
    Ok(())
}
