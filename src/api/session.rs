use async_trait::async_trait;
use log::{debug, info};

use super::{quiz, ApiClient};
use crate::error::ApiError;
use crate::models::quiz::QuizSummary;
use crate::models::session::{
    AnswerResult, CreateSessionRequest, CreatedSession, GameSnapshot, JoinedSession,
    LobbySnapshot, SessionCode, SessionCodeRequest, StartedSession, SubmitAnswerRequest,
};

/// REST operations behind a live quiz session.
///
/// Every method is a single request with no retry or caching; the controllers
/// decide what a failure means.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Quizzes the signed-in user can host.
    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, ApiError>;

    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreatedSession, ApiError>;

    async fn join_session(&self, code: &SessionCode) -> Result<JoinedSession, ApiError>;

    /// Waiting-room snapshot.
    async fn get_session(&self, code: &SessionCode) -> Result<LobbySnapshot, ApiError>;

    /// In-game snapshot.
    async fn get_session_status(&self, code: &SessionCode) -> Result<GameSnapshot, ApiError>;

    async fn start_session(&self, code: &SessionCode) -> Result<StartedSession, ApiError>;

    async fn submit_answer(&self, request: &SubmitAnswerRequest)
        -> Result<AnswerResult, ApiError>;

    async fn next_question(&self, code: &SessionCode) -> Result<(), ApiError>;

    async fn leave_session(&self, code: &SessionCode) -> Result<(), ApiError>;
}

#[async_trait]
impl SessionApi for ApiClient {
    async fn list_quizzes(&self) -> Result<Vec<QuizSummary>, ApiError> {
        quiz::list_quizzes(self).await
    }

    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreatedSession, ApiError> {
        let created: CreatedSession = self.post("/live-sessions", request).await?;
        info!("Created live session {}", created.session_code);
        Ok(created)
    }

    async fn join_session(&self, code: &SessionCode) -> Result<JoinedSession, ApiError> {
        let joined = self
            .post(
                "/live-sessions/join",
                &SessionCodeRequest {
                    code: code.as_str(),
                },
            )
            .await?;
        info!("Joined live session {}", code);
        Ok(joined)
    }

    async fn get_session(&self, code: &SessionCode) -> Result<LobbySnapshot, ApiError> {
        self.get(&format!("/live-sessions/{}", code)).await
    }

    async fn get_session_status(&self, code: &SessionCode) -> Result<GameSnapshot, ApiError> {
        self.get(&format!("/live-sessions/{}/status", code)).await
    }

    async fn start_session(&self, code: &SessionCode) -> Result<StartedSession, ApiError> {
        let started: StartedSession = self
            .post(
                "/live-sessions/start",
                &SessionCodeRequest {
                    code: code.as_str(),
                },
            )
            .await?;
        info!("Start requested for {}: started={}", code, started.started);
        Ok(started)
    }

    async fn submit_answer(
        &self,
        request: &SubmitAnswerRequest,
    ) -> Result<AnswerResult, ApiError> {
        debug!(
            "Submitting answer {} for question {}",
            request.answer, request.question_id
        );
        self.post("/live-sessions/answer", request).await
    }

    async fn next_question(&self, code: &SessionCode) -> Result<(), ApiError> {
        self.post_ack(
            "/live-sessions/next-question",
            &SessionCodeRequest {
                code: code.as_str(),
            },
        )
        .await
    }

    async fn leave_session(&self, code: &SessionCode) -> Result<(), ApiError> {
        self.post_ack(
            "/live-sessions/leave",
            &SessionCodeRequest {
                code: code.as_str(),
            },
        )
        .await?;
        info!("Left live session {}", code);
        Ok(())
    }
}
