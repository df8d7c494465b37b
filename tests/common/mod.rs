//! A tiny in-memory quiz server shared by several clients.

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use ksot_live::api::session::SessionApi;
use ksot_live::error::ApiError;
use ksot_live::models::quiz::QuizSummary;
use ksot_live::models::session::{
    AnswerResult, CreateSessionRequest, CreatedSession, CurrentQuestion, GameSnapshot,
    JoinedSession, LobbySnapshot, Participant, QuestionOptions, SessionCode, SessionStatus,
    StartedSession, SubmitAnswerRequest,
};

pub const SESSION_CODE: &str = "AB12CD";
pub const CORRECT_OPTION: &str = "B";

struct Session {
    host_id: Option<String>,
    participants: Vec<Participant>,
    status: SessionStatus,
    question: Option<CurrentQuestion>,
    time_per_question: u32,
}

pub struct MockServer {
    session: Mutex<Session>,
    reject_joins: Mutex<bool>,
    /// Every request from every client.
    pub requests: AtomicUsize,
}

impl MockServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(Session {
                host_id: None,
                participants: Vec::new(),
                status: SessionStatus::Waiting,
                question: None,
                time_per_question: 20,
            }),
            reject_joins: Mutex::new(false),
            requests: AtomicUsize::new(0),
        })
    }

    pub fn client(self: &Arc<Self>, id: &str, name: &str) -> Arc<ClientApi> {
        Arc::new(ClientApi {
            server: Arc::clone(self),
            id: id.to_owned(),
            name: name.to_owned(),
        })
    }

    pub fn reject_joins(&self) {
        *self.reject_joins.lock().unwrap() = true;
    }

    pub fn complete(&self) {
        let mut session = self.session.lock().unwrap();
        session.status = SessionStatus::Completed;
        session.question = None;
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn add_participant(&self, id: &str, name: &str) {
        let mut session = self.session.lock().unwrap();
        if session.participants.iter().all(|p| p.id != id) {
            session.participants.push(Participant {
                id: id.to_owned(),
                name: name.to_owned(),
                avatar_url: None,
                avatar_initials: None,
                is_connected: true,
                score: 0,
            });
        }
    }
}

fn question(id: &str) -> CurrentQuestion {
    CurrentQuestion {
        id: id.to_owned(),
        text: "Which surah is known as the heart of the Quran?".to_owned(),
        image_url: None,
        options: QuestionOptions::Map(
            [("A", "Al-Fatiha"), ("B", "Ya-Sin"), ("C", "Al-Mulk")]
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        ),
    }
}

/// One signed-in user talking to the shared server.
pub struct ClientApi {
    server: Arc<MockServer>,
    id: String,
    name: String,
}

impl ClientApi {
    fn hit(&self) {
        self.server.requests.fetch_add(1, Ordering::SeqCst);
    }

    fn is_host(&self, session: &Session) -> bool {
        session.host_id.as_deref() == Some(self.id.as_str())
    }
}

#[async_trait]
impl SessionApi for ClientApi {
    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, ApiError> {
        self.hit();
        Ok(vec![QuizSummary {
            id: 5,
            title: "Seerah basics".to_owned(),
            description: None,
            questions_count: Some(1),
        }])
    }

    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreatedSession, ApiError> {
        self.hit();
        {
            let mut session = self.server.session.lock().unwrap();
            session.host_id = Some(self.id.clone());
            session.time_per_question = request.time_per_question;
        }
        self.server.add_participant(&self.id, &self.name);
        Ok(CreatedSession {
            session_code: SESSION_CODE.to_owned(),
            session: None,
        })
    }

    async fn join_session(&self, code: &SessionCode) -> Result<JoinedSession, ApiError> {
        self.hit();
        if *self.server.reject_joins.lock().unwrap() || code.as_str() != SESSION_CODE {
            return Err(ApiError::Rejected {
                status: None,
                message: "Session not found or full".to_owned(),
            });
        }
        self.server.add_participant(&self.id, &self.name);
        Ok(JoinedSession { session: None })
    }

    async fn get_session(&self, _code: &SessionCode) -> Result<LobbySnapshot, ApiError> {
        self.hit();
        let session = self.server.session.lock().unwrap();
        Ok(LobbySnapshot {
            participants: session.participants.clone(),
            is_host: self.is_host(&session),
            status: session.status,
        })
    }

    async fn get_session_status(&self, _code: &SessionCode) -> Result<GameSnapshot, ApiError> {
        self.hit();
        let session = self.server.session.lock().unwrap();
        Ok(GameSnapshot {
            current_question: session.question.clone(),
            participants: session.participants.clone(),
            status: session.status,
            is_host: self.is_host(&session),
            time_per_question: Some(session.time_per_question),
            question_number: session.question.as_ref().map(|_| 1),
            total_questions: Some(1),
        })
    }

    async fn start_session(&self, _code: &SessionCode) -> Result<StartedSession, ApiError> {
        self.hit();
        let mut session = self.server.session.lock().unwrap();
        if !self.is_host(&session) {
            return Ok(StartedSession { started: false });
        }
        session.status = SessionStatus::Active;
        session.question = Some(question("101"));
        Ok(StartedSession { started: true })
    }

    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<AnswerResult, ApiError> {
        self.hit();
        let mut session = self.server.session.lock().unwrap();
        let is_correct = request.answer == CORRECT_OPTION;
        let points = if is_correct { 10 } else { 0 };
        let participant = session
            .participants
            .iter_mut()
            .find(|p| p.id == self.id)
            .ok_or(ApiError::MissingData)?;
        participant.score += points;
        Ok(AnswerResult {
            is_correct,
            correct_answer: Some(CORRECT_OPTION.to_owned()),
            points_earned: points,
            your_score: participant.score,
            rank: None,
        })
    }

    async fn next_question(&self, _code: &SessionCode) -> Result<(), ApiError> {
        self.hit();
        self.server.complete();
        Ok(())
    }

    async fn leave_session(&self, _code: &SessionCode) -> Result<(), ApiError> {
        self.hit();
        Ok(())
    }
}
