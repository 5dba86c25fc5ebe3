use url::Url;

use crate::error::{ChatError, Result};

/// Per-connection facts, fixed before the controller exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    room_id: String,
    local_user_id: String,
}

impl SessionContext {
    pub fn new(room_id: impl Into<String>, local_user_id: impl Into<String>) -> Result<Self> {
        let room_id = room_id.into();
        let local_user_id = local_user_id.into();
        if room_id.trim().is_empty() {
            return Err(ChatError::Validation("room id is empty"));
        }
        // Kept as given: self-attribution compares it byte for byte.
        if local_user_id.trim().is_empty() {
            return Err(ChatError::Validation("user id is empty"));
        }
        Ok(Self { room_id, local_user_id })
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn is_local(&self, creator: &str) -> bool {
        creator == self.local_user_id
    }

    /// `<ws|wss>://<host>/ws/chat/room/<room>/`
    pub fn endpoint(&self, host: &str, secure: bool) -> Result<Url> {
        let scheme = if secure { "wss" } else { "ws" };
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(ChatError::Config("server host is empty".into()));
        }
        let mut url = Url::parse(&format!("{scheme}://{host}/"))
            .map_err(|e| ChatError::Config(format!("invalid server `{host}`: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ChatError::Config(format!("server `{host}` cannot carry a path")))?
            .pop_if_empty()
            .extend(["ws", "chat", "room", self.room_id.as_str(), ""]);
        Ok(url)
    }
}
