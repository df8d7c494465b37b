//! Screens of the live quiz flow.

use egui::{Color32, RichText};

use crate::live::flow::{
    CreateWizard, JoinForm, MAX_PARTICIPANTS_RANGE, TIME_PER_QUESTION_RANGE,
};
use crate::live::game::{GameController, GamePhase, Standing};
use crate::live::lobby::LobbyController;
use crate::live::{Screen, SessionFlow};
use crate::models::session::{Participant, SESSION_CODE_LEN};

/// Flow transitions requested while a screen was borrowed.
enum Action {
    Create,
    Join,
    SubmitCreate,
    SubmitJoin(String),
    Leave,
}

pub fn show(ui: &mut egui::Ui, flow: &mut SessionFlow) {
    let mut action = None;
    match flow.screen_mut() {
        Screen::Menu => menu(ui, &mut action),
        Screen::Create(wizard) => create_wizard(ui, wizard, &mut action),
        Screen::Join(form) => join_form(ui, form, &mut action),
        Screen::Lobby(lobby) => lobby_screen(ui, lobby, &mut action),
        Screen::Game(game) => game_screen(ui, game, &mut action),
        Screen::Results(standings) => results(ui, standings, &mut action),
    }

    match action {
        Some(Action::Create) => flow.start_create_flow(),
        Some(Action::Join) => flow.start_join_flow(),
        Some(Action::SubmitCreate) => flow.submit_create(),
        Some(Action::SubmitJoin(code)) => flow.submit_join_code(&code),
        Some(Action::Leave) => flow.leave_session(),
        None => {}
    }
}

fn menu(ui: &mut egui::Ui, action: &mut Option<Action>) {
    ui.vertical_centered(|ui| {
        ui.add_space(24.0);
        ui.heading("Play together");
        ui.add_space(12.0);
        if ui.button("Host a session").clicked() {
            *action = Some(Action::Create);
        }
        ui.add_space(6.0);
        if ui.button("Join with a code").clicked() {
            *action = Some(Action::Join);
        }
    });
}

fn create_wizard(ui: &mut egui::Ui, wizard: &mut CreateWizard, action: &mut Option<Action>) {
    ui.heading("Host a session");
    ui.add_space(8.0);

    if wizard.quizzes_loading {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading quizzes…");
        });
    } else {
        let selected = wizard
            .quizzes
            .iter()
            .find(|q| Some(q.id) == wizard.quiz_id)
            .map(|q| q.title.clone())
            .unwrap_or_else(|| "Select a quiz".to_owned());
        egui::ComboBox::from_label("Quiz")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                for quiz in &wizard.quizzes {
                    ui.selectable_value(&mut wizard.quiz_id, Some(quiz.id), &quiz.title);
                }
            });
    }

    ui.add(
        egui::Slider::new(&mut wizard.time_per_question, TIME_PER_QUESTION_RANGE)
            .text("seconds per question"),
    );

    let mut limited = wizard.max_participants.is_some();
    if ui.checkbox(&mut limited, "Limit participants").changed() {
        wizard.max_participants = limited.then_some(10);
    }
    if let Some(max) = wizard.max_participants.as_mut() {
        ui.add(egui::Slider::new(max, MAX_PARTICIPANTS_RANGE).text("players"));
    }

    if let Some(error) = &wizard.error {
        ui.colored_label(Color32::RED, error);
    }

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        let ready = !wizard.submitting && wizard.quiz_id.is_some();
        if ui.add_enabled(ready, egui::Button::new("Create")).clicked() {
            *action = Some(Action::SubmitCreate);
        }
        if wizard.submitting {
            ui.spinner();
        }
        if ui.button("Cancel").clicked() {
            *action = Some(Action::Leave);
        }
    });
}

fn join_form(ui: &mut egui::Ui, form: &mut JoinForm, action: &mut Option<Action>) {
    ui.heading("Join a session");
    ui.add_space(8.0);

    let response = ui.add(
        egui::TextEdit::singleline(&mut form.input)
            .hint_text("ABC123")
            .char_limit(SESSION_CODE_LEN + 2)
            .desired_width(120.0),
    );
    let entered = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

    if let Some(error) = &form.error {
        ui.colored_label(Color32::RED, error);
    }

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        let clicked = ui
            .add_enabled(!form.submitting, egui::Button::new("Join"))
            .clicked();
        if (clicked || entered) && !form.submitting {
            *action = Some(Action::SubmitJoin(form.input.clone()));
        }
        if form.submitting {
            ui.spinner();
        }
        if ui.button("Cancel").clicked() {
            *action = Some(Action::Leave);
        }
    });
}

fn avatar_row(ui: &mut egui::Ui, participant: &Participant) {
    let initials = RichText::new(participant.initials()).monospace().strong();
    ui.label(initials);
    if participant.is_connected {
        ui.label(&participant.name);
    } else {
        ui.weak(&participant.name);
    }
}

fn lobby_screen(ui: &mut egui::Ui, lobby: &mut LobbyController, action: &mut Option<Action>) {
    ui.heading("Waiting room");
    ui.horizontal(|ui| {
        ui.label("Code:");
        ui.monospace(RichText::new(lobby.code().as_str()).size(20.0));
        if ui.button("Copy").clicked() {
            let code = lobby.copy_session_code();
            ui.ctx().copy_text(code);
        }
        if lobby.view().show_copied() {
            ui.label("Copied!");
        }
    });
    ui.separator();

    let view = lobby.view();
    ui.label(format!("{} player(s)", view.participants.len()));
    egui::ScrollArea::vertical()
        .max_height(240.0)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            for participant in &view.participants {
                ui.horizontal(|ui| avatar_row(ui, participant));
            }
        });

    if let Some(error) = &view.error {
        ui.colored_label(Color32::RED, error);
    }

    ui.add_space(8.0);
    let is_host = view.is_host;
    let can_start = view.can_start();
    let starting = view.starting;
    ui.horizontal(|ui| {
        if is_host {
            if ui
                .add_enabled(can_start, egui::Button::new("Start game"))
                .clicked()
            {
                lobby.trigger_start();
            }
            if starting {
                ui.spinner();
            }
        } else {
            ui.label("Waiting for the host to start…");
        }
        if ui.button("Leave").clicked() {
            *action = Some(Action::Leave);
        }
    });
}

fn game_screen(ui: &mut egui::Ui, game: &mut GameController, action: &mut Option<Action>) {
    let now = tokio::time::Instant::now();
    let view = game.view();
    let phase = view.phase();

    ui.horizontal(|ui| {
        if let (Some(number), Some(total)) = (view.question_number, view.total_questions) {
            ui.label(format!("Question {number} of {total}"));
        }
        if let Some(remaining) = view.remaining_seconds(now) {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(RichText::new(format!("{remaining}s")).strong());
            });
        }
    });
    ui.separator();

    let mut chosen = None;
    match &view.current_question {
        None => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Waiting for the next question…");
            });
        }
        Some(question) => {
            ui.heading(&question.text);
            if let Some(url) = &question.image_url {
                ui.hyperlink_to("Question image", url);
            }
            ui.add_space(8.0);

            let locked = view.selected_answer.as_deref();
            for option in view.options() {
                let selected = locked == Some(option.id.as_str());
                let label = egui::SelectableLabel::new(selected, &option.text);
                if ui.add_enabled(locked.is_none(), label).clicked() {
                    chosen = Some(option.id.clone());
                }
            }
        }
    }

    if phase == GamePhase::Answered {
        match &view.last_result {
            Some(result) if result.is_correct => {
                ui.colored_label(
                    Color32::DARK_GREEN,
                    format!("Correct! +{} points", result.points_earned),
                );
            }
            Some(result) => {
                ui.colored_label(Color32::DARK_RED, "Not quite.");
                if let Some(rank) = result.rank {
                    ui.label(format!("Score {} · rank #{}", result.your_score, rank));
                }
            }
            None => {
                ui.label("Answer locked in.");
            }
        }
    }

    if let Some(error) = &view.error {
        ui.colored_label(Color32::RED, error);
    }

    ui.separator();
    ui.label("Scores");
    for standing in view.standings() {
        ui.horizontal(|ui| {
            ui.label(format!("#{}", standing.rank));
            avatar_row(ui, &standing.participant);
            ui.label(standing.participant.score.to_string());
        });
    }

    let is_host = view.is_host;
    let advancing = view.advancing;
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        if is_host {
            let label = if phase == GamePhase::AwaitingQuestion {
                "Force next"
            } else {
                "Next question"
            };
            if ui
                .add_enabled(!advancing, egui::Button::new(label))
                .clicked()
            {
                game.advance_question();
            }
        }
        if ui.button("Leave").clicked() {
            *action = Some(Action::Leave);
        }
    });

    if let Some(option_id) = chosen {
        game.submit_answer(&option_id);
    }
}

fn results(ui: &mut egui::Ui, standings: &[Standing], action: &mut Option<Action>) {
    ui.heading("Final standings");
    ui.add_space(8.0);
    egui::Grid::new("results_grid")
        .num_columns(3)
        .striped(true)
        .show(ui, |ui| {
            for standing in standings {
                ui.label(format!("#{}", standing.rank));
                ui.horizontal(|ui| avatar_row(ui, &standing.participant));
                ui.label(standing.participant.score.to_string());
                ui.end_row();
            }
        });
    ui.add_space(12.0);
    if ui.button("Back to menu").clicked() {
        *action = Some(Action::Leave);
    }
}
