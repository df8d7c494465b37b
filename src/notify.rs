//! Non-game push events: unread counters and desktop notifications.

use std::sync::mpsc::Sender;

use log::{debug, info};
use once_cell::sync::OnceCell;

use crate::models::events::{
    PushEvent, CHALLENGE_RECEIVED, NEW_MESSAGE, QUIZ_POSTED, TEAM_INVITATION,
};
use crate::websocket::{BindingId, SessionTransport};

pub const QUIZZES_CHANNEL: &str = "quizzes";

pub fn user_channel(user_id: &str) -> String {
    format!("user.{user_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Notifications sharing a tag replace each other.
    pub tag: Option<String>,
}

/// Whatever actually puts a notification in front of the user.
pub trait Notifier {
    fn request_permission(&self) -> Permission;
    fn display(&self, notification: Notification);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UnreadCounters {
    pub messages: u32,
    pub invitations: u32,
    pub challenges: u32,
    pub new_quizzes: u32,
}

impl UnreadCounters {
    pub fn total(&self) -> u32 {
        self.messages + self.invitations + self.challenges + self.new_quizzes
    }
}

pub struct NotificationBridge<N: Notifier> {
    notifier: N,
    permission: OnceCell<Permission>,
    counters: UnreadCounters,
}

impl<N: Notifier> NotificationBridge<N> {
    pub fn new(notifier: N) -> Self {
        Self {
            notifier,
            permission: OnceCell::new(),
            counters: UnreadCounters::default(),
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Asks the notifier on first use only.
    pub fn permission(&self) -> Permission {
        *self.permission.get_or_init(|| {
            let permission = self.notifier.request_permission();
            info!("Notification permission: {:?}", permission);
            permission
        })
    }

    pub fn show(&self, title: &str, body: &str, tag: Option<&str>) {
        if self.permission() != Permission::Granted {
            debug!("Dropping notification {:?}: permission not granted", title);
            return;
        }
        self.notifier.display(Notification {
            title: title.to_owned(),
            body: body.to_owned(),
            tag: tag.map(str::to_owned),
        });
    }

    pub fn counters(&self) -> UnreadCounters {
        self.counters
    }

    /// Bump the matching counter and surface the event.
    pub fn handle_event(&mut self, event: &PushEvent) {
        match event {
            PushEvent::NewMessage { sender, preview } => {
                self.counters.messages += 1;
                self.show(&format!("New message from {sender}"), preview, Some(NEW_MESSAGE));
            }
            PushEvent::TeamInvitation { team, invited_by } => {
                self.counters.invitations += 1;
                self.show(
                    "Team invitation",
                    &format!("{invited_by} invited you to join {team}"),
                    Some(TEAM_INVITATION),
                );
            }
            PushEvent::ChallengeReceived { challenger, quiz } => {
                self.counters.challenges += 1;
                self.show(
                    "Challenge received",
                    &format!("{challenger} challenged you on {quiz}"),
                    Some(CHALLENGE_RECEIVED),
                );
            }
            PushEvent::QuizPosted { title } => {
                self.counters.new_quizzes += 1;
                self.show("New quiz posted", title, Some(QUIZ_POSTED));
            }
        }
    }

    pub fn reset_messages(&mut self) {
        self.counters.messages = 0;
    }

    pub fn reset_invitations(&mut self) {
        self.counters.invitations = 0;
    }

    pub fn reset_challenges(&mut self) {
        self.counters.challenges = 0;
    }

    pub fn reset_new_quizzes(&mut self) {
        self.counters.new_quizzes = 0;
    }
}

/// Subscribe to the user's channel and the public quiz feed, forwarding typed
/// events to `sink`.
pub fn bind_push_events(
    transport: &SessionTransport,
    user_id: &str,
    sink: Sender<PushEvent>,
) -> Vec<BindingId> {
    let user = user_channel(user_id);
    transport.subscribe(&user);
    transport.subscribe(QUIZZES_CHANNEL);

    let routes = [
        (user.as_str(), NEW_MESSAGE),
        (user.as_str(), TEAM_INVITATION),
        (user.as_str(), CHALLENGE_RECEIVED),
        (QUIZZES_CHANNEL, QUIZ_POSTED),
    ];
    routes
        .into_iter()
        .map(|(channel, event)| {
            let sink = sink.clone();
            transport.bind(channel, event, move |payload| {
                if let Some(parsed) = PushEvent::from_channel(event, payload) {
                    let _ = sink.send(parsed);
                }
            })
        })
        .collect()
}

pub fn unbind_push_events(transport: &SessionTransport, user_id: &str, bindings: Vec<BindingId>) {
    for id in bindings {
        transport.unbind(id);
    }
    transport.unsubscribe(&user_channel(user_id));
    transport.unsubscribe(QUIZZES_CHANNEL);
}
