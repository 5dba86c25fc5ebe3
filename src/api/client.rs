use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::api::events::{Transport, TransportEvent};
use crate::error::{ChatError, Result};

/// Reconnect backoff: the delay grows by `decay` after every failed attempt
/// and resets once a connection opens.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub decay: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(1000),
            max: Duration::from_millis(30_000),
            decay: 1.5,
        }
    }
}

impl ReconnectPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.decay.powi(attempt.min(64) as i32);
        let millis = (self.initial.as_millis() as f64 * factor).min(self.max.as_millis() as f64);
        Duration::from_millis(millis as u64)
    }
}

/// Send side of a running [`RoomSocket`]. Dropping it stops the socket.
pub struct SocketHandle {
    outgoing: UnboundedSender<String>,
    open: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SocketHandle {
    /// Stops the socket loop; no events follow.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl Transport for SocketHandle {
    fn send(&self, text: String) -> Result<()> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(ChatError::Transport("not connected".into()));
        }
        self.outgoing
            .send(text)
            .map_err(|_| ChatError::Transport("socket task is gone".into()))
    }
}

/// Websocket that keeps reconnecting to one room endpoint.
pub struct RoomSocket {
    url: Url,
    policy: ReconnectPolicy,
    events: UnboundedSender<TransportEvent>,
    outgoing: UnboundedReceiver<String>,
    open: Arc<AtomicBool>,
}

impl RoomSocket {
    /// Spawns the socket loop on the shared runtime.
    pub fn connect(url: Url, policy: ReconnectPolicy) -> (SocketHandle, UnboundedReceiver<TransportEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));
        let socket = RoomSocket {
            url,
            policy,
            events: events_tx,
            outgoing: out_rx,
            open: open.clone(),
        };
        let task = crate::utils::RUNTIME.spawn(socket.run());
        (SocketHandle { outgoing: out_tx, open, task }, events_rx)
    }

    async fn run(mut self) {
        let mut attempt = 0u32;
        loop {
            match connect_async(self.url.as_str()).await {
                Ok((ws, _)) => {
                    attempt = 0;
                    log::info!("websocket connected to {}", self.url);
                    // Anything queued while offline is not replayed.
                    while self.outgoing.try_recv().is_ok() {}
                    self.open.store(true, Ordering::SeqCst);
                    if !self.emit(TransportEvent::Open) {
                        return;
                    }
                    let reason = self.pump(ws).await;
                    self.open.store(false, Ordering::SeqCst);
                    if !self.emit(TransportEvent::Closed { reason }) {
                        return;
                    }
                }
                Err(e) => {
                    log::debug!("connect to {} failed: {e}", self.url);
                    if !self.emit(TransportEvent::Error(e.to_string())) {
                        return;
                    }
                }
            }
            let delay = self.policy.delay(attempt);
            attempt = attempt.saturating_add(1);
            log::debug!("reconnecting in {delay:?}");
            tokio::time::sleep(delay).await;
        }
    }

    /// Returns `false` once nobody listens for events anymore.
    fn emit(&self, event: TransportEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Runs one connection until it drops; returns the close reason if any.
    async fn pump<S>(&mut self, ws: S) -> Option<String>
    where
        S: futures_util::Stream<Item = tokio_tungstenite::tungstenite::Result<Message>>
            + futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
            + Unpin,
    {
        let (mut sink, mut stream) = ws.split();
        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if !self.emit(TransportEvent::Message(text)) {
                            return None;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        return frame.map(|f| format!("{} {}", u16::from(f.code), f.reason));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let _ = self.emit(TransportEvent::Error(e.to_string()));
                        return Some(e.to_string());
                    }
                    None => return None,
                },
                out = self.outgoing.recv() => match out {
                    Some(text) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            let _ = self.emit(TransportEvent::Error(e.to_string()));
                            return Some(e.to_string());
                        }
                    }
                    None => {
                        let _ = sink.close().await;
                        return None;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn backoff_grows_and_caps() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_millis(1000));
        assert_eq!(policy.delay(1), Duration::from_millis(1500));
        assert_eq!(policy.delay(2), Duration::from_millis(2250));
        assert_eq!(policy.delay(50), Duration::from_millis(30_000));
    }

    async fn recv(rx: &mut UnboundedReceiver<TransportEvent>) -> TransportEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for socket event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn relays_frames_both_ways_and_reconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            // First connection: echo one frame back, then hang up.
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            let Some(Ok(Message::Text(text))) = ws.next().await else {
                panic!("expected a text frame");
            };
            ws.send(Message::Text(format!("echo:{text}"))).await.unwrap();
            ws.close(None).await.unwrap();
            while let Some(Ok(_)) = ws.next().await {}
            // Second connection proves the reconnect.
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::Text("again".into())).await.unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        let url = Url::parse(&format!("ws://{addr}/ws/chat/room/1/")).unwrap();
        let policy = ReconnectPolicy {
            initial: Duration::from_millis(10),
            max: Duration::from_millis(50),
            decay: 1.5,
        };
        let (handle, mut events) = RoomSocket::connect(url, policy);

        assert_eq!(recv(&mut events).await, TransportEvent::Open);
        handle.send("ping".into()).unwrap();
        assert_eq!(recv(&mut events).await, TransportEvent::Message("echo:ping".into()));
        assert!(matches!(recv(&mut events).await, TransportEvent::Closed { .. }));
        assert_eq!(recv(&mut events).await, TransportEvent::Open);
        assert_eq!(recv(&mut events).await, TransportEvent::Message("again".into()));

        drop(handle);
        server.abort();
    }

    #[tokio::test]
    async fn text_sent_while_offline_is_refused_not_replayed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.close(None).await.unwrap();
            while let Some(Ok(_)) = ws.next().await {}

            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            // The first frame on the new connection must be the fresh one.
            let Some(Ok(Message::Text(text))) = ws.next().await else {
                panic!("expected a text frame");
            };
            ws.send(Message::Text(format!("first:{text}"))).await.unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        let url = Url::parse(&format!("ws://{addr}/")).unwrap();
        let policy = ReconnectPolicy {
            initial: Duration::from_millis(50),
            max: Duration::from_millis(50),
            decay: 1.0,
        };
        let (handle, mut events) = RoomSocket::connect(url, policy);

        assert_eq!(recv(&mut events).await, TransportEvent::Open);
        assert!(matches!(recv(&mut events).await, TransportEvent::Closed { .. }));
        assert!(matches!(
            handle.send("typed while offline".into()),
            Err(ChatError::Transport(_))
        ));

        assert_eq!(recv(&mut events).await, TransportEvent::Open);
        handle.send("fresh".into()).unwrap();
        assert_eq!(recv(&mut events).await, TransportEvent::Message("first:fresh".into()));

        drop(handle);
        server.abort();
    }

    #[tokio::test]
    async fn close_ends_the_connection_and_the_event_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (accepted_tx, accepted_rx) = tokio::sync::oneshot::channel();
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            let _ = accepted_tx.send(());
            // Runs until the client side goes away.
            while let Some(Ok(_)) = ws.next().await {}
        });

        let url = Url::parse(&format!("ws://{addr}/")).unwrap();
        let (handle, mut events) = RoomSocket::connect(url, ReconnectPolicy::default());
        assert_eq!(recv(&mut events).await, TransportEvent::Open);
        accepted_rx.await.unwrap();

        handle.close();
        assert!(matches!(
            handle.send("after close".into()),
            Err(ChatError::Transport(_))
        ));
        let next = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event stream did not end");
        assert_eq!(next, None);
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server still sees a live connection")
            .unwrap();
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_the_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            while let Some(Ok(_)) = ws.next().await {}
        });

        let url = Url::parse(&format!("ws://{addr}/")).unwrap();
        let (handle, mut events) = RoomSocket::connect(url, ReconnectPolicy::default());
        assert_eq!(recv(&mut events).await, TransportEvent::Open);
        drop(handle);

        let next = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("event stream did not end");
        assert_eq!(next, None);
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server still sees a live connection")
            .unwrap();
    }

    #[tokio::test]
    async fn unreachable_server_reports_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("ws://{addr}/")).unwrap();
        let (handle, mut events) = RoomSocket::connect(url, ReconnectPolicy::default());
        assert!(matches!(recv(&mut events).await, TransportEvent::Error(_)));
        assert!(matches!(handle.send("hi".into()), Err(ChatError::Transport(_))));
    }
}
