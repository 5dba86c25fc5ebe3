use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;

use crate::app::Settings;

pub fn show_join_window(app: &Application, settings: Settings) {
    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title("Join Room")
        .default_width(420)
        .default_height(300)
        .resizable(false)
        .build();

    let toast_overlay = adw::ToastOverlay::new();

    // Root container
    let root = gtk::Box::new(gtk::Orientation::Vertical, 12);
    root.set_margin_top(24);
    root.set_margin_bottom(24);
    root.set_margin_start(24);
    root.set_margin_end(24);

    let title = gtk::Label::new(Some("Join a chat room"));
    title.add_css_class("title-2");
    title.set_halign(gtk::Align::Start);
    root.append(&title);

    let server_entry = gtk::Entry::new();
    server_entry.set_placeholder_text(Some("Server (e.g. https://chat.example.com)"));
    server_entry.set_hexpand(true);
    if !settings.server.is_empty() {
        let scheme = if settings.secure { "https" } else { "http" };
        server_entry.set_text(&format!("{scheme}://{}", settings.server));
    }

    let room_entry = gtk::Entry::new();
    room_entry.set_placeholder_text(Some("Room id"));
    room_entry.set_text(&settings.room_id);

    let user_entry = gtk::Entry::new();
    user_entry.set_placeholder_text(Some("Your user id (as the server knows you)"));
    user_entry.set_text(&settings.user_id);

    let form = gtk::Box::new(gtk::Orientation::Vertical, 8);
    form.append(&server_entry);
    form.append(&room_entry);
    form.append(&user_entry);
    root.append(&form);

    let join_btn = gtk::Button::with_label("Join");
    join_btn.add_css_class("suggested-action");
    join_btn.set_halign(gtk::Align::End);
    root.append(&join_btn);

    toast_overlay.set_child(Some(&root));
    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let header_title = gtk::Label::new(Some("Room Chat"));
    header.set_title_widget(Some(&header_title));
    container.append(&header);
    container.append(&toast_overlay);
    window.set_content(Some(&container));

    let on_join = {
        let app = app.clone();
        let window = window.clone();
        let overlay = toast_overlay.clone();
        let server_entry = server_entry.clone();
        let room_entry = room_entry.clone();
        let user_entry = user_entry.clone();
        move || {
            let (server, secure) = crate::utils::normalize_server(&server_entry.text());
            let next = Settings {
                server,
                secure,
                room_id: room_entry.text().trim().to_string(),
                user_id: user_entry.text().trim().to_string(),
                ..settings.clone()
            };
            if next.server.is_empty() {
                overlay.add_toast(adw::Toast::new("Please enter the server address."));
                return;
            }
            if let Err(e) = next.session().and_then(|s| s.endpoint(&next.server, next.secure)) {
                overlay.add_toast(adw::Toast::new(&e.to_string()));
                return;
            }
            if let Err(e) = next.save() {
                log::warn!("failed to save settings: {e}");
            }
            crate::ui::main_window::show_main_window(&app, next);
            window.close();
        }
    };

    use std::rc::Rc;
    let on_join: Rc<dyn Fn()> = Rc::new(on_join);
    {
        let on_join = on_join.clone();
        join_btn.connect_clicked(move |_| (on_join)());
    }
    for entry in [&server_entry, &room_entry, &user_entry] {
        let on_join = on_join.clone();
        entry.connect_activate(move |_| (on_join)());
    }

    window.present();
}
