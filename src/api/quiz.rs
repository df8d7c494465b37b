use log::info;

use super::ApiClient;
use crate::error::ApiError;
use crate::models::quiz::QuizSummary;

pub async fn list_quizzes(client: &ApiClient) -> Result<Vec<QuizSummary>, ApiError> {
    let quizzes: Vec<QuizSummary> = client.get("/quizzes").await?;
    info!("Fetched {} quizzes", quizzes.len());
    Ok(quizzes)
}
