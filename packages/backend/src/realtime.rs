//! # Change feed over the realtime websocket
//!
//! The hosted backend pushes row changes over a Phoenix-channel websocket at
//! [`BackendConfig::realtime_url`]. One channel is joined per table, named
//! `realtime:{table}_changes`, listening for every event (`*`) on that table:
//!
//! ```json
//! {"topic":"realtime:families_changes","event":"phx_join","ref":"1",
//!  "payload":{"config":{"postgres_changes":[{"event":"*","schema":"public","table":"families"}]}}}
//! ```
//!
//! Incoming `postgres_changes` frames (and the older per-event `INSERT`/`UPDATE`/
//! `DELETE` frames) become [`Change`]s delivered through the [`ChangeHub`].
//!
//! The socket is driven by a background task started on the first join. It sends
//! a heartbeat every 25 seconds and reconnects after a drop, rejoining every table
//! that still has an open channel. The task ends when the owning backend is
//! dropped.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::config::BackendConfig;
use crate::listeners::ChangeHub;
use crate::models::{Change, ChangeKind, Table};

#[cfg_attr(target_arch = "wasm32", allow(dead_code))]
const HEARTBEAT: Duration = Duration::from_secs(25);
#[cfg_attr(target_arch = "wasm32", allow(dead_code))]
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Join(Table),
    Leave(Table),
}

/// Table subscriptions of one backend and the socket task serving them.
pub(crate) struct Realtime {
    config: BackendConfig,
    hub: Arc<ChangeHub>,
    /// Open channel count per table.
    joined: Arc<Mutex<BTreeMap<Table, usize>>>,
    commands: Mutex<Option<mpsc::UnboundedSender<Command>>>,
}

impl Realtime {
    pub fn new(config: BackendConfig, hub: Arc<ChangeHub>) -> Self {
        Self {
            config,
            hub,
            joined: Arc::new(Mutex::new(BTreeMap::new())),
            commands: Mutex::new(None),
        }
    }

    /// Count a newly opened channel on `table`, joining it on the first one.
    pub fn retain(&self, table: Table) {
        let first = {
            let mut joined = self.joined.lock();
            let count = joined.entry(table).or_insert(0);
            *count += 1;
            *count == 1
        };
        if first {
            self.send(Command::Join(table), true);
        }
    }

    /// Count a closed channel on `table`, leaving it when none remain.
    pub fn release(&self, table: Table) {
        let last = {
            let mut joined = self.joined.lock();
            match joined.get_mut(&table) {
                Some(count) if *count > 1 => {
                    *count -= 1;
                    false
                }
                Some(_) => {
                    joined.remove(&table);
                    true
                }
                None => false,
            }
        };
        if last {
            self.send(Command::Leave(table), false);
        }
    }

    fn send(&self, command: Command, start: bool) {
        let mut commands = self.commands.lock();
        if start && commands.as_ref().map_or(true, |tx| tx.is_closed()) {
            *commands = self.spawn_worker();
        }
        if let Some(tx) = commands.as_ref() {
            let _ = tx.send(command);
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_worker(&self) -> Option<mpsc::UnboundedSender<Command>> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!("no async runtime; change feed not started");
                return None;
            }
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            url: self.config.realtime_url(),
            schema: self.config.schema.clone(),
            hub: self.hub.clone(),
            joined: self.joined.clone(),
            next_ref: 0,
        };
        runtime.spawn(worker.run(rx));
        Some(tx)
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn_worker(&self) -> Option<mpsc::UnboundedSender<Command>> {
        let _ = (&self.config, &self.hub);
        tracing::warn!("change feed is not available in browser builds");
        None
    }
}

fn topic(table: Table) -> String {
    format!("realtime:{table}_changes")
}

pub(crate) fn join_frame(table: Table, schema: &str, msg_ref: u64) -> String {
    json!({
        "topic": topic(table),
        "event": "phx_join",
        "payload": {
            "config": {
                "postgres_changes": [
                    { "event": "*", "schema": schema, "table": table.as_str() }
                ]
            }
        },
        "ref": msg_ref.to_string(),
    })
    .to_string()
}

pub(crate) fn leave_frame(table: Table, msg_ref: u64) -> String {
    json!({
        "topic": topic(table),
        "event": "phx_leave",
        "payload": {},
        "ref": msg_ref.to_string(),
    })
    .to_string()
}

pub(crate) fn heartbeat_frame(msg_ref: u64) -> String {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": msg_ref.to_string(),
    })
    .to_string()
}

/// Decode a server frame into a row change, if it is one.
pub(crate) fn parse_change(text: &str) -> Option<Change> {
    let frame: Value = serde_json::from_str(text).ok()?;
    let event = frame.get("event")?.as_str()?;
    let payload = frame.get("payload")?;
    let (table, kind) = if event == "postgres_changes" {
        let data = payload.get("data")?;
        (data.get("table")?.as_str()?, data.get("type")?.as_str()?)
    } else {
        (payload.get("table")?.as_str()?, event)
    };
    Some(Change {
        table: Table::parse(table)?,
        kind: ChangeKind::parse(kind)?,
    })
}

/// Route one server frame: changes go to the hub, rejected joins are logged.
pub(crate) fn handle_frame(hub: &ChangeHub, text: &str) {
    if let Some(change) = parse_change(text) {
        tracing::debug!(table = %change.table, kind = ?change.kind, "remote change");
        hub.emit(change);
        return;
    }
    let Ok(frame) = serde_json::from_str::<Value>(text) else {
        tracing::warn!("unreadable change feed frame");
        return;
    };
    if frame["event"] == "phx_reply" && frame["payload"]["status"] == "error" {
        tracing::warn!(topic = %frame["topic"], response = %frame["payload"]["response"], "channel join rejected");
    }
}

#[cfg(not(target_arch = "wasm32"))]
struct Worker {
    url: String,
    schema: String,
    hub: Arc<ChangeHub>,
    joined: Arc<Mutex<BTreeMap<Table, usize>>>,
    next_ref: u64,
}

#[cfg(not(target_arch = "wasm32"))]
impl Worker {
    fn next_ref(&mut self) -> u64 {
        self.next_ref += 1;
        self.next_ref
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            match tokio_tungstenite::connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    tracing::info!("change feed connected");
                    if !self.serve(stream, &mut commands).await {
                        return;
                    }
                    tracing::warn!("change feed disconnected");
                }
                Err(e) => tracing::warn!("change feed connect failed: {}", e),
            }
            // Commands that arrive while offline are covered by the rejoin.
            tokio::select! {
                _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                command = commands.recv() => {
                    if command.is_none() {
                        return;
                    }
                }
            }
        }
    }

    /// Drive one connection. Returns `false` once the backend is gone.
    async fn serve<S>(
        &mut self,
        stream: tokio_tungstenite::WebSocketStream<S>,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> bool
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        use futures_util::{SinkExt, StreamExt};
        use std::collections::BTreeSet;
        use tokio_tungstenite::tungstenite::Message;

        let (mut sink, mut source) = stream.split();
        let mut active = BTreeSet::new();

        let tables: Vec<Table> = self.joined.lock().keys().copied().collect();
        for table in tables {
            active.insert(table);
            let msg_ref = self.next_ref();
            let frame = join_frame(table, &self.schema, msg_ref);
            if sink.send(Message::Text(frame)).await.is_err() {
                return true;
            }
        }

        let mut heartbeat = tokio::time::interval(HEARTBEAT);
        heartbeat.tick().await;
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        let _ = sink.close().await;
                        return false;
                    };
                    let frame = match command {
                        Command::Join(table) if !active.contains(&table) => {
                            active.insert(table);
                            let msg_ref = self.next_ref();
                            join_frame(table, &self.schema, msg_ref)
                        }
                        Command::Leave(table) if active.contains(&table) => {
                            active.remove(&table);
                            leave_frame(table, self.next_ref())
                        }
                        _ => continue,
                    };
                    if sink.send(Message::Text(frame)).await.is_err() {
                        return true;
                    }
                }
                message = source.next() => match message {
                    Some(Ok(Message::Text(text))) => handle_frame(&self.hub, &text),
                    Some(Ok(Message::Close(_))) | None => return true,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("change feed error: {}", e);
                        return true;
                    }
                },
                _ = heartbeat.tick() => {
                    let frame = heartbeat_frame(self.next_ref());
                    if sink.send(Message::Text(frame)).await.is_err() {
                        return true;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_join_frame_listens_to_every_event() {
        let frame: Value = serde_json::from_str(&join_frame(Table::Families, "public", 3)).unwrap();
        assert_eq!(frame["topic"], "realtime:families_changes");
        assert_eq!(frame["event"], "phx_join");
        assert_eq!(frame["ref"], "3");
        assert_eq!(
            frame["payload"]["config"]["postgres_changes"][0],
            json!({ "event": "*", "schema": "public", "table": "families" })
        );
    }

    #[test]
    fn test_parse_change_frames() {
        let current = r#"{"topic":"realtime:families_changes","event":"postgres_changes",
            "payload":{"ids":[1],"data":{"schema":"public","table":"families","type":"UPDATE"}},"ref":null}"#;
        assert_eq!(
            parse_change(current),
            Some(Change { table: Table::Families, kind: ChangeKind::Update })
        );

        let legacy = r#"{"topic":"realtime:members_changes","event":"DELETE",
            "payload":{"schema":"public","table":"members","type":"DELETE"},"ref":null}"#;
        assert_eq!(
            parse_change(legacy),
            Some(Change { table: Table::Members, kind: ChangeKind::Delete })
        );

        let reply = r#"{"topic":"phoenix","event":"phx_reply","payload":{"status":"ok","response":{}},"ref":"1"}"#;
        assert_eq!(parse_change(reply), None);
        assert_eq!(parse_change("not json"), None);
    }

    #[test]
    fn test_handle_frame_emits_to_matching_channels() {
        let hub = ChangeHub::default();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        hub.open(
            Table::Members,
            Arc::new(move |_: Change| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        handle_frame(&hub, r#"{"event":"INSERT","payload":{"table":"members"}}"#);
        handle_frame(&hub, r#"{"event":"INSERT","payload":{"table":"families"}}"#);
        handle_frame(&hub, r#"{"event":"phx_reply","payload":{"status":"error","response":{}}}"#);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_join_and_leave_follow_channel_counts() {
        let realtime = Realtime::new(
            BackendConfig::new("http://127.0.0.1:9", "anon"),
            Arc::new(ChangeHub::default()),
        );
        // Outside a runtime no worker starts, but the counts still track.
        realtime.retain(Table::Families);
        realtime.retain(Table::Families);
        realtime.release(Table::Families);
        assert_eq!(realtime.joined.lock().get(&Table::Families), Some(&1));
        realtime.release(Table::Families);
        assert!(realtime.joined.lock().is_empty());
        realtime.release(Table::Families);
        assert!(realtime.commands.lock().is_none());
    }
}
