use chrono::{DateTime, FixedOffset, Local, Utc};

use crate::api::models::ChatMessage;
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Start,
    End,
}

/// Render-side view of one message. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub display_name: String,
    pub alignment: Alignment,
    pub formatted_time: String,
    pub content: String,
}

impl TranscriptEntry {
    pub fn from_message(msg: &ChatMessage, session: &SessionContext, time: &TimeFormatter) -> Self {
        let is_me = session.is_local(&msg.creator);
        Self {
            display_name: if is_me { "Me".to_string() } else { msg.creator.clone() },
            alignment: if is_me { Alignment::End } else { Alignment::Start },
            formatted_time: time.format(msg.created_at),
            content: msg.content.clone(),
        }
    }

    pub fn is_me(&self) -> bool {
        self.alignment == Alignment::End
    }
}

/// 12-hour `h:MM AM` clock in a fixed zone.
#[derive(Debug, Clone, Copy)]
pub enum TimeFormatter {
    Local,
    Fixed(FixedOffset),
}

impl TimeFormatter {
    const PATTERN: &'static str = "%-I:%M %p";

    #[cfg(test)]
    pub fn utc() -> Self {
        TimeFormatter::Fixed(chrono::Offset::fix(&Utc))
    }

    pub fn format(&self, at: DateTime<Utc>) -> String {
        match self {
            TimeFormatter::Local => at.with_timezone(&Local).format(Self::PATTERN).to_string(),
            TimeFormatter::Fixed(offset) => at.with_timezone(offset).format(Self::PATTERN).to_string(),
        }
    }
}

pub trait TranscriptView {
    fn push_entry(&mut self, entry: &TranscriptEntry);
    fn scroll_to_bottom(&mut self);
}

pub struct TranscriptRenderer<V> {
    session: SessionContext,
    time: TimeFormatter,
    view: V,
}

impl<V: TranscriptView> TranscriptRenderer<V> {
    pub fn new(session: SessionContext, time: TimeFormatter, view: V) -> Self {
        Self { session, time, view }
    }

    pub fn append(&mut self, msg: &ChatMessage) -> TranscriptEntry {
        let entry = TranscriptEntry::from_message(msg, &self.session, &self.time);
        self.view.push_entry(&entry);
        self.view.scroll_to_bottom();
        entry
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    #[cfg(test)]
    pub fn view(&self) -> &V {
        &self.view
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Default)]
    pub(crate) struct RecordingView {
        pub entries: Vec<TranscriptEntry>,
        pub scrolls: usize,
    }

    impl TranscriptView for RecordingView {
        fn push_entry(&mut self, entry: &TranscriptEntry) {
            self.entries.push(entry.clone());
        }

        fn scroll_to_bottom(&mut self) {
            self.scrolls += 1;
        }
    }

    pub(crate) fn message(creator: &str, content: &str, hour: u32, min: u32) -> ChatMessage {
        ChatMessage {
            content: content.into(),
            creator: creator.into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, hour, min, 0).unwrap(),
            message_id: None,
            group_name: None,
        }
    }

    fn renderer(local: &str) -> TranscriptRenderer<RecordingView> {
        let session = SessionContext::new("12", local).unwrap();
        TranscriptRenderer::new(session, TimeFormatter::utc(), RecordingView::default())
    }

    #[test]
    fn other_author_is_start_aligned_with_their_name() {
        let mut r = renderer("bob");
        let entry = r.append(&message("alice", "hi", 10, 0));
        assert_eq!(entry.display_name, "alice");
        assert_eq!(entry.alignment, Alignment::Start);
        assert_eq!(entry.formatted_time, "10:00 AM");
        assert_eq!(entry.content, "hi");
    }

    #[test]
    fn own_message_renders_as_me_end_aligned() {
        let mut r = renderer("bob");
        let entry = r.append(&message("bob", "yo", 23, 5));
        assert_eq!(entry.display_name, "Me");
        assert_eq!(entry.alignment, Alignment::End);
        assert!(entry.is_me());
        assert_eq!(entry.formatted_time, "11:05 PM");
    }

    #[test]
    fn every_append_scrolls_to_latest() {
        let mut r = renderer("bob");
        r.append(&message("alice", "one", 9, 0));
        r.append(&message("bob", "two", 9, 1));
        assert_eq!(r.view().entries.len(), 2);
        assert_eq!(r.view().scrolls, 2);
    }

    #[test]
    fn hour_has_no_leading_zero_and_midnight_is_twelve() {
        let time = TimeFormatter::utc();
        assert_eq!(time.format(Utc.with_ymd_and_hms(2024, 1, 1, 0, 7, 0).unwrap()), "12:07 AM");
        assert_eq!(time.format(Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap()), "12:30 PM");
    }

    #[test]
    fn formatting_respects_offset_and_is_repeatable() {
        let time = TimeFormatter::Fixed(FixedOffset::east_opt(2 * 3600).unwrap());
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let first = time.format(at);
        assert_eq!(first, "12:00 PM");
        assert_eq!(time.format(at), first);
    }
}
