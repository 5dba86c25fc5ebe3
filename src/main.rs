mod api;
mod app;
mod controller;
mod error;
mod input;
mod session;
mod transcript;
mod ui;
mod utils;

use adw::Application;
use adw::prelude::*;

fn main() -> glib::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = Application::builder()
        .application_id("com.example.RoomChatGtk")
        .build();
    app.connect_startup(|_| crate::ui::load_css());
    app.connect_activate(|app| {
        crate::app::build_ui(app);
    });
    app.run()
}
