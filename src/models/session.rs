use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CodeError;

use super::{de_id, de_opt_id};

/// Number of characters in a live session code.
pub const SESSION_CODE_LEN: usize = 6;

/// Six-character join code, always held in uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    /// Validate a code typed by the user and normalise it to uppercase.
    pub fn parse(input: &str) -> Result<Self, CodeError> {
        if input.chars().count() != SESSION_CODE_LEN {
            return Err(CodeError::InvalidLength);
        }
        Ok(Self(input.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-authoritative lifecycle of a session.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Waiting,
    #[serde(alias = "in_progress", alias = "started")]
    Active,
    #[serde(alias = "ended", alias = "finished")]
    Completed,
    #[serde(other)]
    Unknown,
}

impl SessionStatus {
    /// True once the host has started, including sessions that already ended.
    pub fn has_started(self) -> bool {
        matches!(self, SessionStatus::Active | SessionStatus::Completed)
    }

    pub fn is_completed(self) -> bool {
        self == SessionStatus::Completed
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Participant {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub avatar_initials: Option<String>,
    #[serde(default = "connected_by_default")]
    pub is_connected: bool,
    #[serde(default)]
    pub score: i64,
}

fn connected_by_default() -> bool {
    true
}

impl Participant {
    /// Initials shown when there is no avatar image.
    pub fn initials(&self) -> String {
        if let Some(initials) = self.avatar_initials.as_deref().filter(|i| !i.is_empty()) {
            return initials.to_owned();
        }
        let initials: String = self
            .name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            "?".to_owned()
        } else {
            initials
        }
    }
}

/// One selectable answer, after normalisation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(alias = "option_text")]
    pub text: String,
}

/// Options as they arrive on the wire: an ordered list or a keyed map.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum QuestionOptions {
    List(Vec<AnswerOption>),
    Map(IndexMap<String, String>),
}

impl Default for QuestionOptions {
    fn default() -> Self {
        QuestionOptions::List(Vec::new())
    }
}

impl QuestionOptions {
    /// Uniform ordered list; map keys become option ids in wire order.
    pub fn normalize(&self) -> Vec<AnswerOption> {
        match self {
            QuestionOptions::List(options) => options.clone(),
            QuestionOptions::Map(options) => options
                .iter()
                .map(|(id, text)| AnswerOption {
                    id: id.clone(),
                    text: text.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CurrentQuestion {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(alias = "question", alias = "question_text")]
    pub text: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub options: QuestionOptions,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SessionSummary {
    #[serde(alias = "session_code")]
    pub code: String,
    pub status: SessionStatus,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub quiz_id: Option<String>,
    #[serde(default)]
    pub time_per_question: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub host_id: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CreateSessionRequest {
    pub quiz_id: u64,
    pub time_per_question: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CreatedSession {
    pub session_code: String,
    #[serde(default)]
    pub session: Option<SessionSummary>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct JoinedSession {
    #[serde(default)]
    pub session: Option<SessionSummary>,
}

/// Body shared by join, start, advance and leave.
#[derive(Serialize, Debug)]
pub struct SessionCodeRequest<'a> {
    pub code: &'a str,
}

/// Waiting-room poll payload.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LobbySnapshot {
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub is_host: bool,
    pub status: SessionStatus,
}

/// In-game poll payload.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    #[serde(default)]
    pub current_question: Option<CurrentQuestion>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    pub status: SessionStatus,
    #[serde(default)]
    pub is_host: bool,
    #[serde(default)]
    pub time_per_question: Option<u32>,
    #[serde(default)]
    pub question_number: Option<u32>,
    #[serde(default)]
    pub total_questions: Option<u32>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct StartedSession {
    pub started: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SubmitAnswerRequest {
    pub session_code: String,
    pub question_id: String,
    pub answer: String,
    pub time_taken: u32,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AnswerResult {
    pub is_correct: bool,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub points_earned: i64,
    #[serde(default)]
    pub your_score: i64,
    #[serde(default)]
    pub rank: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_code_rejects_wrong_lengths() {
        for input in ["", "AB12C", "AB12CDE", "ABCDEFGHIJ"] {
            assert_eq!(SessionCode::parse(input), Err(CodeError::InvalidLength));
        }
        assert_eq!(
            CodeError::InvalidLength.to_string(),
            "Code must be 6 characters"
        );
    }

    #[test]
    fn session_code_is_uppercased() {
        let code = SessionCode::parse("ab12cd").unwrap();
        assert_eq!(code.as_str(), "AB12CD");
        assert_eq!(serde_json::to_string(&code).unwrap(), r#""AB12CD""#);
    }

    #[test]
    fn keyed_options_keep_wire_order() {
        let options: QuestionOptions =
            serde_json::from_str(r#"{"C":"z","A":"x","B":"y"}"#).unwrap();
        let ids: Vec<_> = options.normalize().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, ["C", "A", "B"]);
    }

    #[test]
    fn keyed_options_normalize_to_list() {
        let options: QuestionOptions = serde_json::from_str(r#"{"A":"x","B":"y"}"#).unwrap();
        assert_eq!(
            options.normalize(),
            vec![
                AnswerOption {
                    id: "A".into(),
                    text: "x".into()
                },
                AnswerOption {
                    id: "B".into(),
                    text: "y".into()
                },
            ]
        );
    }

    #[test]
    fn listed_options_are_unchanged() {
        let options: QuestionOptions =
            serde_json::from_str(r#"[{"id":7,"text":"seven"},{"id":"b","option_text":"bee"}]"#)
                .unwrap();
        let QuestionOptions::List(raw) = &options else {
            panic!("expected list variant");
        };
        assert_eq!(&options.normalize(), raw);
        assert_eq!(raw[0].id, "7");
        assert_eq!(raw[1].text, "bee");
    }

    #[test]
    fn status_aliases() {
        let parse = |s: &str| serde_json::from_str::<SessionStatus>(s).unwrap();
        assert_eq!(parse(r#""in_progress""#), SessionStatus::Active);
        assert_eq!(parse(r#""active""#), SessionStatus::Active);
        assert_eq!(parse(r#""completed""#), SessionStatus::Completed);
        assert_eq!(parse(r#""paused""#), SessionStatus::Unknown);
    }

    #[test]
    fn game_snapshot_without_question() {
        let snapshot: GameSnapshot = serde_json::from_str(
            r#"{"status":"active","is_host":true,"participants":[{"id":1,"name":"Ada Lovelace"}]}"#,
        )
        .unwrap();
        assert!(snapshot.current_question.is_none());
        assert_eq!(snapshot.participants[0].id, "1");
        assert!(snapshot.participants[0].is_connected);
        assert_eq!(snapshot.participants[0].score, 0);
    }

    #[test]
    fn question_text_aliases() {
        let question: CurrentQuestion = serde_json::from_str(
            r#"{"id":101,"question_text":"2 + 2?","options":{"A":"3","B":"4"}}"#,
        )
        .unwrap();
        assert_eq!(question.id, "101");
        assert_eq!(question.text, "2 + 2?");
    }

    #[test]
    fn initials_fallback() {
        let mut participant: Participant =
            serde_json::from_str(r#"{"id":"u1","name":"grace brewster hopper"}"#).unwrap();
        assert_eq!(participant.initials(), "GB");

        participant.avatar_initials = Some("GH".into());
        assert_eq!(participant.initials(), "GH");

        participant.avatar_initials = None;
        participant.name = "  ".into();
        assert_eq!(participant.initials(), "?");
    }
}
