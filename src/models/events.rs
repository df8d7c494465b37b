use serde::Deserialize;
use serde_json::Value;

/// Channel events the client reacts to outside the live quiz itself.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    NewMessage { sender: String, preview: String },
    TeamInvitation { team: String, invited_by: String },
    ChallengeReceived { challenger: String, quiz: String },
    QuizPosted { title: String },
}

pub const NEW_MESSAGE: &str = "new-message";
pub const TEAM_INVITATION: &str = "team-invitation";
pub const CHALLENGE_RECEIVED: &str = "challenge-received";
pub const QUIZ_POSTED: &str = "quiz-posted";

#[derive(Deserialize, Default)]
#[serde(default)]
struct MessagePayload {
    sender_name: Option<String>,
    message: Option<String>,
    content: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct InvitationPayload {
    team_name: Option<String>,
    inviter_name: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ChallengePayload {
    challenger_name: Option<String>,
    quiz_title: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct QuizPayload {
    title: Option<String>,
}

fn or_unknown(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_owned())
}

impl PushEvent {
    /// Build a typed event from a bound channel event name and its payload.
    ///
    /// Payload fields are all optional; missing ones fall back to placeholders so a
    /// malformed event still bumps the counters.
    pub fn from_channel(event: &str, data: &Value) -> Option<Self> {
        match event {
            NEW_MESSAGE => {
                let p: MessagePayload = serde_json::from_value(data.clone()).unwrap_or_default();
                Some(PushEvent::NewMessage {
                    sender: or_unknown(p.sender_name, "Someone"),
                    preview: or_unknown(p.message.or(p.content), ""),
                })
            }
            TEAM_INVITATION => {
                let p: InvitationPayload =
                    serde_json::from_value(data.clone()).unwrap_or_default();
                Some(PushEvent::TeamInvitation {
                    team: or_unknown(p.team_name, "a team"),
                    invited_by: or_unknown(p.inviter_name, "Someone"),
                })
            }
            CHALLENGE_RECEIVED => {
                let p: ChallengePayload = serde_json::from_value(data.clone()).unwrap_or_default();
                Some(PushEvent::ChallengeReceived {
                    challenger: or_unknown(p.challenger_name, "Someone"),
                    quiz: or_unknown(p.quiz_title, "a quiz"),
                })
            }
            QUIZ_POSTED => {
                let p: QuizPayload = serde_json::from_value(data.clone()).unwrap_or_default();
                Some(PushEvent::QuizPosted {
                    title: or_unknown(p.title, "New quiz"),
                })
            }
            _ => None,
        }
    }
}
