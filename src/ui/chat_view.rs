use gtk4::prelude::*;
use gtk4 as gtk;

use crate::input::InputField;
use crate::transcript::{Alignment, TranscriptEntry, TranscriptView};

pub struct ChatView {
    root: gtk::Box,
    scroller: gtk::ScrolledWindow,
    messages_box: gtk::Box,
    entry: gtk::Entry,
    send_btn: gtk::Button,
}

impl ChatView {
    pub fn new() -> Self {
        let root = gtk::Box::new(gtk::Orientation::Vertical, 6);
        root.set_margin_top(8);
        root.set_margin_bottom(8);
        root.set_margin_start(8);
        root.set_margin_end(8);

        let scroller = gtk::ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .hscrollbar_policy(gtk::PolicyType::Never)
            .build();
        let messages_box = gtk::Box::new(gtk::Orientation::Vertical, 6);
        scroller.set_child(Some(&messages_box));
        root.append(&scroller);

        // Input row
        let input_row = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let entry = gtk::Entry::new();
        entry.set_hexpand(true);
        entry.set_placeholder_text(Some("Type a message…"));
        let send_btn = gtk::Button::with_label("Send");
        send_btn.add_css_class("suggested-action");
        input_row.append(&entry);
        input_row.append(&send_btn);
        root.append(&input_row);

        Self { root, scroller, messages_box, entry, send_btn }
    }

    pub fn widget(&self) -> gtk::Widget {
        self.root.clone().upcast()
    }

    pub fn transcript(&self) -> GtkTranscript {
        GtkTranscript {
            messages_box: self.messages_box.clone(),
            scroller: self.scroller.clone(),
        }
    }

    pub fn input(&self) -> GtkInput {
        GtkInput(self.entry.clone())
    }

    pub fn entry(&self) -> &gtk::Entry {
        &self.entry
    }

    pub fn send_button(&self) -> &gtk::Button {
        &self.send_btn
    }
}

pub struct GtkTranscript {
    messages_box: gtk::Box,
    scroller: gtk::ScrolledWindow,
}

impl TranscriptView for GtkTranscript {
    fn push_entry(&mut self, entry: &TranscriptEntry) {
        let row = gtk::Box::new(gtk::Orientation::Horizontal, 0);
        row.set_hexpand(true);

        let bubble = gtk::Box::new(gtk::Orientation::Vertical, 2);
        bubble.add_css_class(if entry.is_me() { "chat-bg-me" } else { "chat-bg-other" });
        bubble.set_halign(match entry.alignment {
            Alignment::Start => gtk::Align::Start,
            Alignment::End => gtk::Align::End,
        });
        bubble.set_hexpand(true);

        let header = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        let name = gtk::Label::new(Some(&entry.display_name));
        name.add_css_class("heading");
        let time = gtk::Label::new(Some(&entry.formatted_time));
        time.add_css_class("dim-label");
        time.add_css_class("caption");
        header.append(&name);
        header.append(&time);
        bubble.append(&header);

        // Plain text; message content is never parsed as markup.
        let body = gtk::Label::new(Some(&entry.content));
        body.set_use_markup(false);
        body.set_wrap(true);
        body.set_wrap_mode(gtk::pango::WrapMode::WordChar);
        body.set_selectable(true);
        body.set_xalign(0.0);
        bubble.append(&body);

        row.append(&bubble);
        self.messages_box.append(&row);
    }

    fn scroll_to_bottom(&mut self) {
        // Wait for the new row to be measured before reading `upper`.
        let adj = self.scroller.vadjustment();
        glib::idle_add_local_once(move || {
            adj.set_value(adj.upper() - adj.page_size());
        });
    }
}

pub struct GtkInput(gtk::Entry);

impl InputField for GtkInput {
    fn text(&self) -> String {
        self.0.text().to_string()
    }

    fn clear(&self) {
        self.0.set_text("");
    }

    fn grab_focus(&self) {
        self.0.grab_focus();
    }
}
