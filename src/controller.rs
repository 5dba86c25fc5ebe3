use log::{debug, info, warn};

use crate::api::events::{Transport, TransportEvent};
use crate::api::models::{ClientEnvelope, ServerEvent};
use crate::error::{ChatError, Result};
use crate::transcript::{TranscriptRenderer, TranscriptView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting…",
            ConnectionState::Open => "Connected",
            ConnectionState::Closed => "Disconnected, retrying…",
            ConnectionState::Errored => "Connection error, retrying…",
        }
    }
}

/// Sole owner of the transport: turns outgoing text into envelopes and
/// incoming envelopes into transcript appends.
pub struct ConnectionController<T, V> {
    transport: T,
    renderer: TranscriptRenderer<V>,
    state: ConnectionState,
    fetch_history_on_open: bool,
}

impl<T: Transport, V: TranscriptView> ConnectionController<T, V> {
    pub fn new(transport: T, renderer: TranscriptRenderer<V>) -> Self {
        Self {
            transport,
            renderer,
            state: ConnectionState::Connecting,
            fetch_history_on_open: false,
        }
    }

    pub fn with_history_on_open(mut self, enabled: bool) -> Self {
        self.fetch_history_on_open = enabled;
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[cfg(test)]
    pub fn renderer(&self) -> &TranscriptRenderer<V> {
        &self.renderer
    }

    pub fn handle(&mut self, event: TransportEvent) -> ConnectionState {
        match event {
            TransportEvent::Open => self.open(),
            TransportEvent::Message(raw) => {
                if let Err(err) = self.receive(&raw) {
                    warn!("dropping payload: {err}");
                }
            }
            TransportEvent::Closed { reason } => self.close(reason.as_deref()),
            TransportEvent::Error(err) => self.on_error(&err),
        }
        self.state
    }

    pub fn open(&mut self) {
        self.state = ConnectionState::Open;
        info!("room {} connection ready", self.renderer.session().room_id());
        if self.fetch_history_on_open {
            let sent = ClientEnvelope::fetch_history()
                .to_json()
                .and_then(|json| self.transport.send(json));
            if let Err(err) = sent {
                warn!("history request failed: {err}");
            }
        }
    }

    /// Returns how many transcript entries were appended.
    pub fn receive(&mut self, raw: &str) -> Result<usize> {
        match ServerEvent::decode(raw)? {
            ServerEvent::Delivery { kind, messages } => {
                debug!("{kind:?} delivery with {} message(s)", messages.len());
                for msg in &messages {
                    self.renderer.append(msg);
                }
                Ok(messages.len())
            }
            ServerEvent::Unknown { kind } => {
                debug!("ignoring `{kind}` envelope");
                Ok(0)
            }
        }
    }

    pub fn send_text(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(ChatError::Validation("message is empty"));
        }
        let json = ClientEnvelope::single(text).to_json()?;
        self.transport.send(json)
    }

    pub fn close(&mut self, reason: Option<&str>) {
        self.state = ConnectionState::Closed;
        match reason {
            Some(reason) => warn!("chat socket closed unexpectedly: {reason}"),
            None => warn!("chat socket closed unexpectedly"),
        }
    }

    pub fn on_error(&mut self, err: &str) {
        self.state = ConnectionState::Errored;
        warn!("chat socket error: {err}");
    }
}
