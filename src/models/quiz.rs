use serde::Deserialize;

/// A quiz a host can run as a live session.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct QuizSummary {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "question_count")]
    pub questions_count: Option<u32>,
}
