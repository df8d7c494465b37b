//! In-game loop: question tracking, the one-answer-per-question lock, host
//! advancement and completion.
//!
//! All server-driven state flows through [`GameView::apply_snapshot`], which only
//! needs the latest payload and the current local state. Local optimistic changes
//! (the selected answer, clearing it on advance) are a cache: the next snapshot
//! showing a different question id replaces them.

use std::{
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    time::Duration,
};

use log::{debug, info, warn};
use tokio::{runtime::Handle, time::Instant};

use super::poller::Poller;
use crate::api::session::SessionApi;
use crate::error::ApiError;
use crate::models::session::{
    AnswerOption, AnswerResult, CurrentQuestion, GameSnapshot, Participant, SessionCode,
    SubmitAnswerRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    AwaitingQuestion,
    QuestionActive,
    Answered,
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    /// 1-based.
    pub rank: usize,
    pub participant: Participant,
}

/// Highest score first; equal scores keep their order from the payload.
pub fn rank_participants(participants: &[Participant]) -> Vec<Standing> {
    let mut sorted = participants.to_vec();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, participant)| Standing {
            rank: i + 1,
            participant,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameOutcome {
    Ended(Vec<Standing>),
}

#[derive(Debug)]
pub enum GameEvent {
    Snapshot(GameSnapshot),
    AnswerRecorded {
        question_id: String,
        result: AnswerResult,
    },
    AdvanceFinished(Result<(), ApiError>),
}

#[derive(Debug, Clone, Default)]
pub struct GameView {
    pub is_host: bool,
    pub participants: Vec<Participant>,
    pub current_question: Option<CurrentQuestion>,
    pub time_per_question: Option<u32>,
    pub question_number: Option<u32>,
    pub total_questions: Option<u32>,
    /// Option id locked in for the current question.
    pub selected_answer: Option<String>,
    /// Server verdict for the locked answer, if the submit went through.
    pub last_result: Option<AnswerResult>,
    /// A next-question request is outstanding.
    pub advancing: bool,
    pub error: Option<String>,
    previous_question_id: Option<String>,
    question_seen_at: Option<Instant>,
    completed: bool,
}

impl GameView {
    pub fn new(is_host: bool) -> Self {
        Self {
            is_host,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> GamePhase {
        if self.completed {
            GamePhase::Completed
        } else if self.current_question.is_none() {
            GamePhase::AwaitingQuestion
        } else if self.selected_answer.is_some() {
            GamePhase::Answered
        } else {
            GamePhase::QuestionActive
        }
    }

    /// Fold the latest poll into local state.
    ///
    /// Idempotent for repeated identical payloads. A change of question id is the
    /// only thing that unlocks answering again. Returns the final standings the
    /// first time the session is seen completed; later snapshots are ignored.
    pub fn apply_snapshot(
        &mut self,
        snapshot: GameSnapshot,
        now: Instant,
    ) -> Option<GameOutcome> {
        if self.completed {
            return None;
        }

        self.is_host = snapshot.is_host;
        self.participants = snapshot.participants;
        self.time_per_question = snapshot.time_per_question;
        self.question_number = snapshot.question_number;
        self.total_questions = snapshot.total_questions;

        if let Some(question) = &snapshot.current_question {
            if self.previous_question_id.as_deref() != Some(question.id.as_str()) {
                debug!("Question changed to {}", question.id);
                self.previous_question_id = Some(question.id.clone());
                self.selected_answer = None;
                self.last_result = None;
                self.question_seen_at = Some(now);
            }
        }
        self.current_question = snapshot.current_question;

        if snapshot.status.is_completed() {
            self.completed = true;
            return Some(GameOutcome::Ended(self.standings()));
        }
        None
    }

    /// Lock `option_id` in for the current question.
    ///
    /// Returns the request to send, or `None` when there is no question or an
    /// answer is already locked.
    pub fn lock_answer(
        &mut self,
        code: &SessionCode,
        option_id: &str,
        now: Instant,
    ) -> Option<SubmitAnswerRequest> {
        if self.completed || self.selected_answer.is_some() {
            return None;
        }
        let question = self.current_question.as_ref()?;
        self.selected_answer = Some(option_id.to_owned());

        let elapsed = self
            .question_seen_at
            .map(|seen| now.saturating_duration_since(seen).as_secs())
            .unwrap_or(0);
        let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
        let time_taken = match self.time_per_question {
            Some(limit) => elapsed.min(limit),
            None => elapsed,
        };

        Some(SubmitAnswerRequest {
            session_code: code.to_string(),
            question_id: question.id.clone(),
            answer: option_id.to_owned(),
            time_taken,
        })
    }

    fn record_result(&mut self, question_id: &str, result: AnswerResult) {
        let current = self.current_question.as_ref().map(|q| q.id.as_str());
        if current == Some(question_id) {
            self.last_result = Some(result);
        }
    }

    /// Options of the current question in display order, rebuilt from the latest payload.
    pub fn options(&self) -> Vec<AnswerOption> {
        self.current_question
            .as_ref()
            .map(|q| q.options.normalize())
            .unwrap_or_default()
    }

    pub fn remaining_seconds(&self, now: Instant) -> Option<u32> {
        let limit = self.time_per_question?;
        let seen = self.question_seen_at?;
        self.current_question.as_ref()?;
        let elapsed = now.saturating_duration_since(seen).as_secs();
        Some(u64::from(limit).saturating_sub(elapsed) as u32)
    }

    pub fn standings(&self) -> Vec<Standing> {
        rank_participants(&self.participants)
    }
}

pub struct GameController {
    code: SessionCode,
    view: GameView,
    api: Arc<dyn SessionApi>,
    runtime: Handle,
    events_tx: Sender<GameEvent>,
    events_rx: Receiver<GameEvent>,
    poller: Option<Poller>,
}

impl GameController {
    pub fn mount(
        api: Arc<dyn SessionApi>,
        runtime: Handle,
        code: SessionCode,
        is_host: bool,
        period: Duration,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();

        let poll_api = Arc::clone(&api);
        let poll_code = code.clone();
        let poller = Poller::spawn(
            &runtime,
            "game",
            period,
            move || {
                let api = Arc::clone(&poll_api);
                let code = poll_code.clone();
                async move { api.get_session_status(&code).await.map(GameEvent::Snapshot) }
            },
            events_tx.clone(),
        );

        info!("Game started for {}", code);
        Self {
            code,
            view: GameView::new(is_host),
            api,
            runtime,
            events_tx,
            events_rx,
            poller: Some(poller),
        }
    }

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn view(&self) -> &GameView {
        &self.view
    }

    pub fn pump(&mut self) -> Option<GameOutcome> {
        let mut outcome = None;
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                GameEvent::Snapshot(snapshot) => {
                    if let Some(ended) = self.view.apply_snapshot(snapshot, Instant::now()) {
                        info!("Session {} completed", self.code);
                        outcome = Some(ended);
                    }
                }
                GameEvent::AnswerRecorded {
                    question_id,
                    result,
                } => self.view.record_result(&question_id, result),
                GameEvent::AdvanceFinished(result) => {
                    self.view.advancing = false;
                    if let Err(e) = result {
                        warn!("Failed to advance question: {}", e);
                        self.view.error =
                            Some("Could not move to the next question.".to_owned());
                    }
                }
            }
        }
        outcome
    }

    /// Lock the answer locally and send it without waiting for the server.
    ///
    /// A failed submit is logged and the lock stays until the question changes.
    pub fn submit_answer(&mut self, option_id: &str) {
        let Some(request) = self.view.lock_answer(&self.code, option_id, Instant::now()) else {
            debug!("Ignoring answer {}: already answered or no question", option_id);
            return;
        };

        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            match api.submit_answer(&request).await {
                Ok(result) => {
                    let _ = tx.send(GameEvent::AnswerRecorded {
                        question_id: request.question_id,
                        result,
                    });
                }
                Err(e) => warn!(
                    "Failed to submit answer for question {}: {}",
                    request.question_id, e
                ),
            }
        });
    }

    /// Host-only: move everyone to the next question.
    pub fn advance_question(&mut self) {
        if !self.view.is_host {
            debug!("Ignoring advance from a non-host");
            return;
        }
        if self.view.advancing || self.view.completed {
            return;
        }
        self.view.selected_answer = None;
        self.view.advancing = true;
        self.view.error = None;

        let api = Arc::clone(&self.api);
        let code = self.code.clone();
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = api.next_question(&code).await;
            let _ = tx.send(GameEvent::AdvanceFinished(result));
        });
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(Poller::is_running)
    }

    pub fn unmount(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }
}

impl Drop for GameController {
    fn drop(&mut self) {
        self.unmount();
    }
}
