use adw::prelude::*;
use adw::Application;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::client::{RoomSocket, SocketHandle};
use crate::app::Settings;
use crate::controller::ConnectionController;
use crate::error::ChatError;
use crate::input::InputBinder;
use crate::transcript::{TimeFormatter, TranscriptRenderer};
use crate::ui::chat_view::{ChatView, GtkInput, GtkTranscript};

type RoomController = ConnectionController<SocketHandle, GtkTranscript>;

pub fn show_main_window(app: &Application, settings: Settings) {
    let session = match settings.session() {
        Ok(session) => session,
        Err(e) => {
            log::warn!("cannot open room: {e}");
            crate::ui::login::show_join_window(app, settings);
            return;
        }
    };
    let url = match session.endpoint(&settings.server, settings.secure) {
        Ok(url) => url,
        Err(e) => {
            log::warn!("cannot open room: {e}");
            crate::ui::login::show_join_window(app, settings);
            return;
        }
    };

    let window = adw::ApplicationWindow::builder()
        .application(app)
        .title(format!("Room {}", session.room_id()))
        .default_width(720)
        .default_height(640)
        .build();

    let overlay = adw::ToastOverlay::new();
    let chat = ChatView::new();
    overlay.set_child(Some(&chat.widget()));

    let container = gtk::Box::new(gtk::Orientation::Vertical, 0);
    let header = adw::HeaderBar::new();
    let title = adw::WindowTitle::new(&format!("Room {}", session.room_id()), "Connecting…");
    header.set_title_widget(Some(&title));
    let switch_btn = gtk::Button::with_label("Switch Room");
    header.pack_end(&switch_btn);
    container.append(&header);
    container.append(&overlay);
    window.set_content(Some(&container));

    let (socket, mut events) = RoomSocket::connect(url, settings.reconnect_policy());
    let renderer = TranscriptRenderer::new(session, TimeFormatter::Local, chat.transcript());
    let controller: Rc<RefCell<Option<RoomController>>> = Rc::new(RefCell::new(Some(
        ConnectionController::new(socket, renderer).with_history_on_open(settings.fetch_history_on_open),
    )));
    let binder: Rc<InputBinder<GtkInput>> = Rc::new(InputBinder::new(chat.input()));

    // Transport events are drained on the GTK main context.
    let pump = {
        let controller = controller.clone();
        let title = title.clone();
        glib::spawn_future_local(async move {
            while let Some(event) = events.recv().await {
                let mut guard = controller.borrow_mut();
                let Some(ctrl) = guard.as_mut() else { break };
                let state = ctrl.handle(event);
                title.set_subtitle(state.label());
            }
        })
    };

    let send = {
        let controller = controller.clone();
        let overlay = overlay.clone();
        move |text: String| {
            let guard = controller.borrow();
            let Some(ctrl) = guard.as_ref() else {
                return Err(ChatError::Transport("room is closed".into()));
            };
            ctrl.send_text(&text).inspect_err(|e| {
                log::warn!("send failed: {e}");
                overlay.add_toast(adw::Toast::new("Message not sent."));
            })
        }
    };

    {
        let binder = binder.clone();
        let send = send.clone();
        chat.send_button().connect_clicked(move |_| {
            let _ = binder.submit(send.clone());
        });
    }
    {
        let binder = binder.clone();
        let send = send.clone();
        let keys = gtk::EventControllerKey::new();
        keys.set_propagation_phase(gtk::PropagationPhase::Capture);
        keys.connect_key_pressed(move |_, key, _, _| {
            let Some(name) = key.name() else {
                return glib::Propagation::Proceed;
            };
            match binder.key_pressed(name.as_str(), send.clone()) {
                Some(_) => glib::Propagation::Stop,
                None => glib::Propagation::Proceed,
            }
        });
        chat.entry().add_controller(keys);
    }

    // Drop the controller, and with it the socket, before the view goes away.
    {
        let controller = controller.clone();
        window.connect_close_request(move |_| {
            pump.abort();
            if controller.borrow_mut().take().is_some() {
                log::info!("left room");
            }
            glib::Propagation::Proceed
        });
    }
    {
        let app = app.clone();
        let window = window.clone();
        switch_btn.connect_clicked(move |_| {
            crate::ui::login::show_join_window(&app, settings.clone());
            window.close();
        });
    }

    window.present();
    chat.entry().grab_focus();
}
