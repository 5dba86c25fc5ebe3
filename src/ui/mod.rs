pub mod chat_view;
pub mod login;
pub mod main_window;

const CSS: &str = r#"
.chat-bg-me {
    background-color: alpha(@accent_bg_color, 0.25);
    border-radius: 10px;
    padding: 6px 10px;
}
.chat-bg-other {
    background-color: alpha(@card_fg_color, 0.08);
    border-radius: 10px;
    padding: 6px 10px;
}
"#;

pub fn load_css() {
    let provider = gtk4::CssProvider::new();
    provider.load_from_data(CSS);
    match gtk4::gdk::Display::default() {
        Some(display) => gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        ),
        None => log::warn!("no display; chat bubbles will be unstyled"),
    }
}
