/// Everything the room socket can tell the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Message(String),
    Closed { reason: Option<String> },
    Error(String),
}

/// Send side of the transport as seen by the controller.
pub trait Transport {
    fn send(&self, text: String) -> crate::error::Result<()>;
}
