use crate::error::{ChatError, Result};

pub trait InputField {
    fn text(&self) -> String;
    fn clear(&self);
    fn grab_focus(&self);
}

/// Key names that count as "submit" (GDK spells Enter as `Return`).
const SUBMIT_KEYS: [&str; 3] = ["Enter", "Return", "KP_Enter"];

/// Pulls composed text out of an input field and hands it to `send`.
pub struct InputBinder<F> {
    field: F,
}

impl<F: InputField> InputBinder<F> {
    pub fn new(field: F) -> Self {
        Self { field }
    }

    /// Sends the current text when it is not blank, then clears and refocuses
    /// the field. A blank field is left untouched.
    pub fn submit<S>(&self, send: S) -> Result<()>
    where
        S: FnOnce(String) -> Result<()>,
    {
        let text = self.field.text();
        if text.trim().is_empty() {
            return Err(ChatError::Validation("message is empty"));
        }
        send(text)?;
        self.field.clear();
        self.field.grab_focus();
        Ok(())
    }

    /// Returns `None` for keys that are not a submit key.
    pub fn key_pressed<S>(&self, key: &str, send: S) -> Option<Result<()>>
    where
        S: FnOnce(String) -> Result<()>,
    {
        SUBMIT_KEYS.contains(&key).then(|| self.submit(send))
    }

    #[cfg(test)]
    pub fn field(&self) -> &F {
        &self.field
    }
}
