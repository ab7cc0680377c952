//! 事件循环 - 把宿主事件和推送回执路由到各组件
//!
//! 单线程协作式：所有事件进入同一个 channel，逐个同步处理完毕。
//! 唯一的异步边界是 HTTP 请求，其响应作为 [`BridgeEvent::Delivery`] 回到这里。

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::host::{ChatLineEvent, HostEvent, HostVersion, LineIndex};
use crate::infra::store::ConfigStore;
use crate::notification::{
    classify, process, DeliveryOutcome, DeliveryReport, DispatchOutcome, Notification,
    PushDispatcher, PushTransport,
};
use crate::options::{
    normalize_option_name, split_tokens, Options, NOTIFY_CURRENT_BUFFER, PUSH_TOKENS,
};
use crate::registry::TokenRegistry;

/// 事件循环的输入
#[derive(Debug)]
pub enum BridgeEvent {
    Host(HostEvent),
    Delivery(DeliveryOutcome),
    /// 宿主事件流结束
    Shutdown,
}

/// 推送桥
pub struct Bridge<T: PushTransport> {
    options: Options,
    registry: TokenRegistry,
    dispatcher: PushDispatcher<T>,
    lines: LineIndex,
    version: HostVersion,
}

impl<T: PushTransport> Bridge<T> {
    /// 从存储加载选项和 token
    pub fn new(store: Box<dyn ConfigStore>, dispatcher: PushDispatcher<T>) -> Self {
        let mut options = Options::default();
        if let Some(value) = store.get(NOTIFY_CURRENT_BUFFER) {
            options.apply(NOTIFY_CURRENT_BUFFER, &value);
        }
        let registry = TokenRegistry::load(store);

        Self {
            options,
            registry,
            dispatcher,
            lines: LineIndex::new(),
            version: HostVersion::default(),
        }
    }

    pub fn with_version(mut self, version: HostVersion) -> Self {
        self.version = version;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub fn version(&self) -> HostVersion {
        self.version
    }

    pub fn dispatcher(&self) -> &PushDispatcher<T> {
        &self.dispatcher
    }

    /// 处理一个事件，返回 false 表示应退出循环
    pub fn handle(&mut self, event: BridgeEvent) -> bool {
        match event {
            BridgeEvent::Host(event) => {
                self.handle_host(event);
                true
            }
            BridgeEvent::Delivery(outcome) => {
                self.on_delivery(outcome);
                true
            }
            BridgeEvent::Shutdown => false,
        }
    }

    pub fn handle_host(&mut self, event: HostEvent) {
        match event {
            HostEvent::HostInfo { version_number } => {
                self.version = HostVersion::parse(&version_number);
                info!(version = %self.version, "Host version updated");
            }
            HostEvent::Command { args } => self.on_command(&args),
            HostEvent::ConfigChanged { option, value } => self.on_config_changed(&option, &value),
            HostEvent::Line(line) => {
                self.on_line(line);
            }
        }
    }

    /// `/weechatrn <token>`：追加 token
    pub fn on_command(&mut self, args: &str) {
        self.registry.add(args);
    }

    /// 宿主中的选项变化：刷新内存镜像并写入存储，重启后保持一致
    pub fn on_config_changed(&mut self, option: &str, value: &str) {
        match normalize_option_name(option) {
            Some(PUSH_TOKENS) => {
                self.registry.replace_all(split_tokens(value));
                debug!(count = self.registry.len(), "Push tokens changed in host");
            }
            Some(name) => {
                self.options.apply(name, value);
                if let Err(e) = self.registry.store_mut().set(name, value) {
                    warn!(option = name, error = %e, "Failed to persist option change");
                }
            }
            None => debug!(option = %option, "Ignoring unrelated option change"),
        }
    }

    /// 新聊天行：分类并在需要时分发
    pub fn on_line(&mut self, line: ChatLineEvent) -> Option<DispatchOutcome> {
        match &line.last_line {
            Some(last_line) => self.lines.record(&line.buffer, last_line.clone()),
            None => self.lines.forget(&line.buffer),
        }

        let notification = classify(&line, &self.options, self.version, &self.lines)?;
        Some(self.notify(&notification))
    }

    /// 直接分发一条通知
    ///
    /// 发送前从存储刷新 token，包含 CLI 在运行期间注册的设备。
    pub fn notify(&mut self, notification: &Notification) -> DispatchOutcome {
        self.registry.refresh();
        self.dispatcher
            .dispatch(self.registry.snapshot(), notification)
    }

    /// 推送回执：按请求时的快照清理 token
    pub fn on_delivery(&mut self, outcome: DeliveryOutcome) -> DeliveryReport {
        let report = process(&mut self.registry, &outcome.snapshot, &outcome.response);
        debug!(
            ok = report.ok,
            errors = report.errors,
            skipped = report.skipped,
            removed = report.removed.len(),
            "Processed push response"
        );
        report
    }

    /// 运行事件循环直到 `Shutdown` 或 channel 关闭
    pub async fn run(&mut self, mut events: UnboundedReceiver<BridgeEvent>) {
        info!(tokens = self.registry.len(), "Push bridge started");
        while let Some(event) = events.recv().await {
            if !self.handle(event) {
                break;
            }
        }
        info!("Push bridge stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{BufferRef, LineRef};
    use crate::infra::store::MemoryConfigStore;
    use crate::notification::PushRequest;
    use crate::registry::TokenSnapshot;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingTransport {
        requests: Arc<Mutex<Vec<PushRequest>>>,
    }

    impl PushTransport for RecordingTransport {
        fn name(&self) -> &str {
            "recording"
        }

        fn submit(&self, request: PushRequest) -> anyhow::Result<()> {
            self.requests.lock().unwrap().push(request);
            Ok(())
        }
    }

    fn bridge(tokens: &str, notify_current: &str) -> (Bridge<RecordingTransport>, RecordingTransport) {
        let store = MemoryConfigStore::new()
            .with_option(PUSH_TOKENS, tokens)
            .with_option(NOTIFY_CURRENT_BUFFER, notify_current);
        let transport = RecordingTransport::default();
        let bridge = Bridge::new(Box::new(store), PushDispatcher::new(transport.clone()));
        (bridge, transport)
    }

    fn private_line() -> ChatLineEvent {
        ChatLineEvent::new(BufferRef::new("0x1").with_id(7), "alice", "hi")
            .with_tag_string("irc_privmsg,notify_private,nick_alice")
            .with_private(true)
            .with_last_line(LineRef {
                pointer: "0xa".to_string(),
                id: Some(3),
            })
    }

    #[test]
    fn test_loads_options_from_store() {
        let (bridge, _) = bridge("t1,t2", "off");
        assert!(!bridge.options().notify_current_buffer);
        assert_eq!(bridge.registry().tokens(), &["t1", "t2"]);
    }

    #[test]
    fn test_line_dispatches_with_line_id() {
        let (mut bridge, transport) = bridge("t1", "on");
        bridge.handle_host(HostEvent::HostInfo {
            version_number: "0x04040000".to_string(),
        });

        let outcome = bridge.on_line(private_line());
        assert_eq!(outcome, Some(DispatchOutcome::Submitted { tokens: 1 }));

        let requests = transport.requests.lock().unwrap();
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body[0]["data"], serde_json::json!({"bufferId": "7", "lineId": 3}));
    }

    #[test]
    fn test_line_without_last_line_clears_previous_id() {
        let (mut bridge, transport) = bridge("t1", "on");
        bridge.handle_host(HostEvent::HostInfo {
            version_number: "0x04040000".to_string(),
        });

        bridge.on_line(private_line());
        let mut second = private_line();
        second.last_line = None;
        bridge.on_line(second);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
        assert_eq!(body[0]["data"], serde_json::json!({"bufferId": "7", "lineId": null}));
    }

    #[test]
    fn test_config_changes_are_persisted() {
        let store = MemoryConfigStore::new();
        let mut bridge = Bridge::new(
            Box::new(store.clone()),
            PushDispatcher::new(RecordingTransport::default()),
        );

        bridge.on_config_changed("plugins.var.python.WeechatRN.push_tokens", "a, b,");
        bridge.on_config_changed("notify_current_buffer", "off");
        bridge.on_config_changed("weechat.look.buffer_time_format", "%H");

        assert_eq!(store.get(PUSH_TOKENS), Some("a,b".to_string()));
        assert_eq!(store.get(NOTIFY_CURRENT_BUFFER), Some("off".to_string()));
        assert_eq!(store.get("weechat.look.buffer_time_format"), None);

        // 重新加载后保持一致
        let restarted = Bridge::new(
            Box::new(store),
            PushDispatcher::new(RecordingTransport::default()),
        );
        assert!(!restarted.options().notify_current_buffer);
        assert_eq!(restarted.registry().tokens(), &["a", "b"]);
    }

    #[test]
    fn test_config_changes_update_mirror() {
        let (mut bridge, transport) = bridge("", "on");

        bridge.on_config_changed("plugins.var.python.WeechatRN.notify_current_buffer", "off");
        bridge.on_config_changed("plugins.var.python.WeechatRN.push_tokens", "a,b");
        bridge.on_config_changed("weechat.look.buffer_time_format", "%H");

        assert!(!bridge.options().notify_current_buffer);
        assert_eq!(bridge.registry().tokens(), &["a", "b"]);

        // 当前 buffer 不再通知
        assert!(bridge.on_line(private_line().with_current(true)).is_none());
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_command_then_delivery_prunes() {
        let (mut bridge, _) = bridge("", "on");
        bridge.handle(BridgeEvent::Host(HostEvent::Command {
            args: "t1".to_string(),
        }));
        bridge.on_command("t2");
        bridge.on_command("t1");
        assert_eq!(bridge.registry().tokens(), &["t1", "t2"]);

        let keep_running = bridge.handle(BridgeEvent::Delivery(DeliveryOutcome {
            snapshot: TokenSnapshot::new(vec!["t1".to_string(), "t2".to_string()]),
            response: r#"{"data":[{"status":"error","details":{"error":"DeviceNotRegistered"}},{"status":"ok"}]}"#.to_string(),
        }));

        assert!(keep_running);
        assert_eq!(bridge.registry().tokens(), &["t2"]);
    }

    #[test]
    fn test_shutdown_stops_loop() {
        let (mut bridge, _) = bridge("", "on");
        assert!(!bridge.handle(BridgeEvent::Shutdown));
    }

    #[tokio::test]
    async fn test_run_consumes_events() {
        let (mut bridge, transport) = bridge("t1", "on");
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tx.send(BridgeEvent::Host(HostEvent::Line(private_line()))).unwrap();
        tx.send(BridgeEvent::Shutdown).unwrap();
        bridge.run(rx).await;

        assert_eq!(transport.requests.lock().unwrap().len(), 1);
    }
}
