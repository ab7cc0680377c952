//! 从 stdin 读取宿主事件

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::event::HostEvent;
use crate::bridge::BridgeEvent;

/// 解析一行事件，空行返回 None
pub fn parse_host_event(line: &str) -> Option<HostEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, line = %line, "Skipping malformed host event");
            None
        }
    }
}

/// 逐行读取事件并送入事件循环，EOF 时发送 `Shutdown`
pub fn spawn_reader<R>(reader: R, tx: UnboundedSender<BridgeEvent>) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(event) = parse_host_event(&line) {
                        if tx.send(BridgeEvent::Host(event)).is_err() {
                            break;
                        }
                    }
                }
                Ok(None) => {
                    debug!("Host event stream closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read host event");
                    break;
                }
            }
        }
        let _ = tx.send(BridgeEvent::Shutdown);
    })
}

pub fn spawn_stdin_reader(tx: UnboundedSender<BridgeEvent>) -> JoinHandle<()> {
    spawn_reader(BufReader::new(tokio::io::stdin()), tx)
}
