//! Top-level journey through a live quiz: menu, create or join, lobby, game,
//! results.
//!
//! [`SessionFlow`] is the only place that decides which screen is shown. Each
//! screen owns its controller, so replacing the screen tears the controller (and
//! its poller) down.

use std::{
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    time::Duration,
};

use log::{debug, info, warn};
use tokio::runtime::Handle;

use super::game::{GameController, GameOutcome, Standing};
use super::lobby::{LobbyController, LobbyOutcome};
use crate::api::session::SessionApi;
use crate::error::ApiError;
use crate::models::quiz::QuizSummary;
use crate::models::session::{CreateSessionRequest, CreatedSession, JoinedSession, SessionCode};

pub const JOIN_UNAUTHENTICATED: &str = "You must be logged in to join.";
pub const JOIN_REJECTED: &str = "Invalid session code or session full.";
pub const CREATE_UNAUTHENTICATED: &str = "You must be logged in to create a session.";
pub const CREATE_FAILED: &str = "Failed to create session.";

pub const TIME_PER_QUESTION_RANGE: std::ops::RangeInclusive<u32> = 5..=120;
pub const MAX_PARTICIPANTS_RANGE: std::ops::RangeInclusive<u32> = 2..=100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Menu,
    Create,
    Join,
    Lobby,
    Game,
    Results,
}

#[derive(Debug, Clone, Copy)]
pub struct PollIntervals {
    pub lobby: Duration,
    pub game: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            lobby: Duration::from_secs(2),
            game: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateWizard {
    pub quizzes: Vec<QuizSummary>,
    pub quizzes_loading: bool,
    pub quiz_id: Option<u64>,
    pub time_per_question: u32,
    pub max_participants: Option<u32>,
    pub submitting: bool,
    pub error: Option<String>,
}

impl CreateWizard {
    pub fn request(&self) -> Option<CreateSessionRequest> {
        let (min_time, max_time) = TIME_PER_QUESTION_RANGE.into_inner();
        let (min_players, max_players) = MAX_PARTICIPANTS_RANGE.into_inner();
        Some(CreateSessionRequest {
            quiz_id: self.quiz_id?,
            time_per_question: self.time_per_question.clamp(min_time, max_time),
            max_participants: self
                .max_participants
                .map(|max| max.clamp(min_players, max_players)),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct JoinForm {
    pub input: String,
    pub submitting: bool,
    pub error: Option<String>,
}

pub enum Screen {
    Menu,
    Create(CreateWizard),
    Join(JoinForm),
    Lobby(LobbyController),
    Game(GameController),
    Results(Vec<Standing>),
}

enum FlowEvent {
    QuizzesLoaded(Result<Vec<QuizSummary>, ApiError>),
    Created(Result<CreatedSession, ApiError>),
    Joined {
        code: SessionCode,
        result: Result<JoinedSession, ApiError>,
    },
}

pub struct SessionFlow {
    screen: Screen,
    session_code: Option<SessionCode>,
    is_host: bool,
    api: Arc<dyn SessionApi>,
    runtime: Handle,
    intervals: PollIntervals,
    default_time_per_question: u32,
    events_tx: Sender<FlowEvent>,
    events_rx: Receiver<FlowEvent>,
}

impl SessionFlow {
    pub fn new(
        api: Arc<dyn SessionApi>,
        runtime: Handle,
        intervals: PollIntervals,
        default_time_per_question: u32,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            screen: Screen::Menu,
            session_code: None,
            is_host: false,
            api,
            runtime,
            intervals,
            default_time_per_question,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> FlowState {
        match self.screen {
            Screen::Menu => FlowState::Menu,
            Screen::Create(_) => FlowState::Create,
            Screen::Join(_) => FlowState::Join,
            Screen::Lobby(_) => FlowState::Lobby,
            Screen::Game(_) => FlowState::Game,
            Screen::Results(_) => FlowState::Results,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn session_code(&self) -> Option<&SessionCode> {
        self.session_code.as_ref()
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    /// Open the create wizard and fetch the quizzes it offers.
    pub fn start_create_flow(&mut self) {
        self.screen = Screen::Create(CreateWizard {
            quizzes_loading: true,
            time_per_question: self.default_time_per_question,
            ..CreateWizard::default()
        });

        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let _ = tx.send(FlowEvent::QuizzesLoaded(api.list_quizzes().await));
        });
    }

    pub fn start_join_flow(&mut self) {
        self.screen = Screen::Join(JoinForm::default());
    }

    /// Send the wizard's choices to the server.
    pub fn submit_create(&mut self) {
        let Screen::Create(wizard) = &mut self.screen else {
            return;
        };
        if wizard.submitting {
            return;
        }
        let Some(request) = wizard.request() else {
            wizard.error = Some("Select a quiz first.".to_owned());
            return;
        };
        wizard.submitting = true;
        wizard.error = None;

        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let _ = tx.send(FlowEvent::Created(api.create_session(&request).await));
        });
    }

    /// The wizard produced a session: the creator hosts it.
    pub fn on_session_created(&mut self, code: SessionCode) {
        info!("Hosting session {}", code);
        self.is_host = true;
        self.enter_lobby(code);
    }

    /// Validate locally, then ask the server to join.
    ///
    /// Errors land on the join form; the flow stays put until the join succeeds.
    pub fn submit_join_code(&mut self, input: &str) {
        if !matches!(self.screen, Screen::Join(_)) {
            self.start_join_flow();
        }
        let Screen::Join(form) = &mut self.screen else {
            return;
        };
        form.input = input.to_owned();
        if form.submitting {
            return;
        }
        let code = match SessionCode::parse(input) {
            Ok(code) => code,
            Err(e) => {
                form.error = Some(e.to_string());
                return;
            }
        };
        form.input = code.to_string();
        form.submitting = true;
        form.error = None;

        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = api.join_session(&code).await;
            let _ = tx.send(FlowEvent::Joined { code, result });
        });
    }

    /// Lobby → game. Ignored from any other screen.
    pub fn on_lobby_start(&mut self) {
        let Screen::Lobby(lobby) = &self.screen else {
            debug!("Start signal outside the lobby ignored");
            return;
        };
        let code = lobby.code().clone();
        self.is_host = lobby.view().is_host;
        // Replacing the screen drops the lobby and stops its poller.
        self.screen = Screen::Game(GameController::mount(
            Arc::clone(&self.api),
            self.runtime.clone(),
            code,
            self.is_host,
            self.intervals.game,
        ));
    }

    /// Game → results, keeping the final standings from the last poll.
    pub fn on_game_end(&mut self, standings: Vec<Standing>) {
        if !matches!(self.screen, Screen::Game(_)) {
            debug!("End signal outside the game ignored");
            return;
        }
        self.screen = Screen::Results(standings);
    }

    /// Back to the menu from anywhere, dropping every piece of session state.
    pub fn leave_session(&mut self) {
        if matches!(self.screen, Screen::Lobby(_) | Screen::Game(_)) {
            if let Some(code) = self.session_code.clone() {
                let api = Arc::clone(&self.api);
                self.runtime.spawn(async move {
                    if let Err(e) = api.leave_session(&code).await {
                        warn!("Failed to leave session {}: {}", code, e);
                    }
                });
            }
        }
        self.screen = Screen::Menu;
        self.session_code = None;
        self.is_host = false;
    }

    /// Apply finished requests and controller outcomes; call once per frame.
    pub fn pump(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }

        match &mut self.screen {
            Screen::Lobby(lobby) => {
                if let Some(LobbyOutcome::Start) = lobby.pump() {
                    self.on_lobby_start();
                }
            }
            Screen::Game(game) => {
                if let Some(GameOutcome::Ended(standings)) = game.pump() {
                    self.on_game_end(standings);
                }
            }
            _ => {}
        }
    }

    fn apply(&mut self, event: FlowEvent) {
        match event {
            FlowEvent::QuizzesLoaded(result) => {
                let Screen::Create(wizard) = &mut self.screen else {
                    return;
                };
                wizard.quizzes_loading = false;
                match result {
                    Ok(quizzes) => {
                        if wizard.quiz_id.is_none() {
                            wizard.quiz_id = quizzes.first().map(|q| q.id);
                        }
                        wizard.quizzes = quizzes;
                    }
                    Err(e) => {
                        warn!("Failed to load quizzes: {}", e);
                        wizard.error = Some("Could not load quizzes.".to_owned());
                    }
                }
            }
            FlowEvent::Created(result) => {
                let Screen::Create(wizard) = &mut self.screen else {
                    debug!("Create finished after leaving the wizard");
                    return;
                };
                wizard.submitting = false;
                let created = match result {
                    Ok(created) => created,
                    Err(e) => {
                        warn!("Failed to create session: {}", e);
                        wizard.error = Some(if e.is_unauthorized() {
                            CREATE_UNAUTHENTICATED.to_owned()
                        } else {
                            e.server_message().unwrap_or(CREATE_FAILED).to_owned()
                        });
                        return;
                    }
                };
                match SessionCode::parse(&created.session_code) {
                    Ok(code) => self.on_session_created(code),
                    Err(_) => {
                        warn!("Server returned malformed code {:?}", created.session_code);
                        wizard.error = Some(CREATE_FAILED.to_owned());
                    }
                }
            }
            FlowEvent::Joined { code, result } => {
                let Screen::Join(form) = &mut self.screen else {
                    debug!("Join finished after leaving the form");
                    return;
                };
                form.submitting = false;
                match result {
                    Ok(_) => {
                        info!("Joined session {} as guest", code);
                        self.is_host = false;
                        self.enter_lobby(code);
                    }
                    Err(e) => {
                        warn!("Failed to join {}: {}", code, e);
                        form.error = Some(if e.is_unauthorized() {
                            JOIN_UNAUTHENTICATED
                        } else {
                            JOIN_REJECTED
                        }
                        .to_owned());
                    }
                }
            }
        }
    }

    fn enter_lobby(&mut self, code: SessionCode) {
        self.session_code = Some(code.clone());
        self.screen = Screen::Lobby(LobbyController::mount(
            Arc::clone(&self.api),
            self.runtime.clone(),
            code,
            self.is_host,
            self.intervals.lobby,
        ));
    }
}
