use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;

use crate::api::session::SessionApi;
use crate::error::ApiError;
use crate::models::quiz::QuizSummary;
use crate::models::session::{
    AnswerResult, CreateSessionRequest, CreatedSession, GameSnapshot, JoinedSession,
    LobbySnapshot, SessionCode, StartedSession, SubmitAnswerRequest,
};

#[derive(Default)]
pub struct Calls {
    pub create: AtomicUsize,
    pub join: AtomicUsize,
    pub get_session: AtomicUsize,
    pub get_status: AtomicUsize,
    pub start: AtomicUsize,
    pub submit: AtomicUsize,
    pub next: AtomicUsize,
    pub leave: AtomicUsize,
}

/// In-memory session backend that records every call.
#[derive(Default)]
pub struct MockApi {
    pub calls: Calls,
    pub submitted: Mutex<Vec<SubmitAnswerRequest>>,
    lobby: Mutex<Option<LobbySnapshot>>,
    /// Replayed in order; the last one repeats.
    game: Mutex<VecDeque<GameSnapshot>>,
    join_error: Mutex<Option<fn() -> ApiError>>,
    start_fails: AtomicBool,
    submit_fails: AtomicBool,
    created_code: Mutex<String>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        let api = Self::default();
        *api.created_code.lock().unwrap() = "AB12CD".to_owned();
        Arc::new(api)
    }

    pub fn push_lobby(&self, snapshot: LobbySnapshot) {
        *self.lobby.lock().unwrap() = Some(snapshot);
    }

    pub fn push_game(&self, snapshot: GameSnapshot) {
        self.game.lock().unwrap().push_back(snapshot);
    }

    pub fn fail_join_with(&self, error: fn() -> ApiError) {
        *self.join_error.lock().unwrap() = Some(error);
    }

    pub fn fail_start(&self) {
        self.start_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_submit(&self) {
        self.submit_fails.store(true, Ordering::SeqCst);
    }

    fn rejected() -> ApiError {
        ApiError::Rejected {
            status: None,
            message: String::new(),
        }
    }
}

#[async_trait]
impl SessionApi for MockApi {
    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, ApiError> {
        Ok(vec![QuizSummary {
            id: 5,
            title: "Topic quiz".into(),
            description: None,
            questions_count: Some(3),
        }])
    }

    async fn create_session(
        &self,
        _request: &CreateSessionRequest,
    ) -> Result<CreatedSession, ApiError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        Ok(CreatedSession {
            session_code: self.created_code.lock().unwrap().clone(),
            session: None,
        })
    }

    async fn join_session(&self, _code: &SessionCode) -> Result<JoinedSession, ApiError> {
        self.calls.join.fetch_add(1, Ordering::SeqCst);
        match *self.join_error.lock().unwrap() {
            Some(error) => Err(error()),
            None => Ok(JoinedSession { session: None }),
        }
    }

    async fn get_session(&self, _code: &SessionCode) -> Result<LobbySnapshot, ApiError> {
        self.calls.get_session.fetch_add(1, Ordering::SeqCst);
        self.lobby.lock().unwrap().clone().ok_or(ApiError::MissingData)
    }

    async fn get_session_status(&self, _code: &SessionCode) -> Result<GameSnapshot, ApiError> {
        self.calls.get_status.fetch_add(1, Ordering::SeqCst);
        let mut game = self.game.lock().unwrap();
        if game.len() > 1 {
            Ok(game.pop_front().unwrap())
        } else {
            game.front().cloned().ok_or(ApiError::MissingData)
        }
    }

    async fn start_session(&self, _code: &SessionCode) -> Result<StartedSession, ApiError> {
        self.calls.start.fetch_add(1, Ordering::SeqCst);
        if self.start_fails.load(Ordering::SeqCst) {
            return Err(Self::rejected());
        }
        Ok(StartedSession { started: true })
    }

    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<AnswerResult, ApiError> {
        self.calls.submit.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(request.clone());
        if self.submit_fails.load(Ordering::SeqCst) {
            return Err(Self::rejected());
        }
        Ok(AnswerResult {
            is_correct: true,
            correct_answer: Some(request.answer.clone()),
            points_earned: 10,
            your_score: 10,
            rank: Some(1),
        })
    }

    async fn next_question(&self, _code: &SessionCode) -> Result<(), ApiError> {
        self.calls.next.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn leave_session(&self, _code: &SessionCode) -> Result<(), ApiError> {
        self.calls.leave.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
