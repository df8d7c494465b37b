use std::time::{Duration, Instant};

use self::state::AppState;

mod live;
pub mod state;
pub mod toast;

/// Polled data arrives in the background; keep frames coming while idle.
const REPAINT_INTERVAL: Duration = Duration::from_millis(250);

pub fn ui_main(ctx: &egui::Context, state: &mut AppState) {
    ctx.set_visuals(egui::Visuals::light());

    state.pump();

    egui::TopBottomPanel::top("header").show(ctx, |ui| {
        egui::Frame::default()
            .outer_margin(egui::vec2(0.0, 4.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.with_layout(egui::Layout::left_to_right(egui::Align::Center), |ui| {
                        ui.heading("Live Quiz");
                        if let Some(code) = state.flow.session_code() {
                            ui.separator();
                            ui.monospace(code.as_str());
                        }
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if state.user.is_some() && ui.button("Log out").clicked() {
                            state.logout();
                        }
                        if let Some(user) = &state.user {
                            ui.label(&user.name);
                        }
                        let unread = state.notifications.counters();
                        if unread.total() > 0 {
                            ui.label(format!(
                                "✉ {}  ⚑ {}  ⚔ {}  ★ {}",
                                unread.messages,
                                unread.invitations,
                                unread.challenges,
                                unread.new_quizzes
                            ));
                        }
                    });
                });
            });
    });

    egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(format!(
                "Channel: {}",
                if state.is_push_connected() {
                    "Connected"
                } else {
                    "Not Connected"
                }
            ));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("{:?}", state.flow.state()));
            });
        });
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        if state.user.is_some() {
            live::show(ui, &mut state.flow);
        } else {
            login_screen(ui, state);
        }
    });

    toast_area(ctx, state);
    ctx.request_repaint_after(REPAINT_INTERVAL);
}

fn login_screen(ui: &mut egui::Ui, state: &mut AppState) {
    ui.vertical_centered(|ui| {
        ui.add_space(12.0);
        ui.heading("Sign in");
        if let Some(notice) = &state.notice {
            ui.add_space(6.0);
            ui.colored_label(egui::Color32::DARK_RED, notice);
        }
        ui.add_space(12.0);

        let form = &mut state.login_form;
        egui::Grid::new("login_grid").num_columns(2).show(ui, |ui| {
            ui.label("Email:");
            ui.text_edit_singleline(&mut form.email);
            ui.end_row();

            ui.label("Password:");
            ui.add(egui::TextEdit::singleline(&mut form.password).password(true));
            ui.end_row();
        });

        if let Some(error) = &form.error {
            ui.colored_label(egui::Color32::RED, error);
        }

        ui.add_space(12.0);
        let submitting = form.submitting;
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!submitting, egui::Button::new("Sign in"))
                .clicked()
            {
                state.login();
            }
            if submitting {
                ui.spinner();
            }
        });
    });
}

fn toast_area(ctx: &egui::Context, state: &AppState) {
    let toasts = state.notifications.notifier().visible(Instant::now());
    if toasts.is_empty() {
        return;
    }
    egui::Area::new(egui::Id::new("toasts"))
        .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -36.0))
        .show(ctx, |ui| {
            for toast in toasts {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(280.0);
                    ui.strong(&toast.notification.title);
                    if !toast.notification.body.is_empty() {
                        ui.label(&toast.notification.body);
                    }
                });
                ui.add_space(6.0);
            }
        });
}
