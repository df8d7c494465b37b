//! Waiting room: roster refresh, host start, and detection of a started game.

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
use crate::models::session::{LobbySnapshot, Participant, SessionCode};

/// How long the "copied" hint stays visible.
pub const COPIED_HINT: Duration = Duration::from_secs(2);

/// Signal to the coordinator that the lobby is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyOutcome {
    Start,
}

#[derive(Debug)]
pub enum LobbyEvent {
    Snapshot(LobbySnapshot),
    StartFinished(Result<bool, ApiError>),
}

/// Local copy of the waiting room. The last poll always wins.
#[derive(Debug, Default, Clone)]
pub struct LobbyView {
    pub participants: Vec<Participant>,
    pub is_host: bool,
    /// A start request is outstanding.
    pub starting: bool,
    pub error: Option<String>,
    copied_at: Option<Instant>,
    transitioned: bool,
}

impl LobbyView {
    pub fn new(is_host: bool) -> Self {
        Self {
            is_host,
            ..Self::default()
        }
    }

    /// Overwrite roster and role from a poll. Reports a start at most once.
    pub fn apply_snapshot(&mut self, snapshot: LobbySnapshot) -> Option<LobbyOutcome> {
        self.participants = snapshot.participants;
        self.is_host = snapshot.is_host;
        if snapshot.status.has_started() {
            return self.transition();
        }
        None
    }

    fn apply_start(&mut self, result: Result<bool, ApiError>) -> Option<LobbyOutcome> {
        self.starting = false;
        match result {
            Ok(true) => self.transition(),
            Ok(false) => {
                self.error = Some("The session could not be started.".to_owned());
                None
            }
            Err(e) => {
                warn!("Failed to start session: {}", e);
                self.error = Some(
                    e.server_message()
                        .unwrap_or("Failed to start the session.")
                        .to_owned(),
                );
                None
            }
        }
    }

    fn transition(&mut self) -> Option<LobbyOutcome> {
        if self.transitioned {
            return None;
        }
        self.transitioned = true;
        Some(LobbyOutcome::Start)
    }

    pub fn can_start(&self) -> bool {
        self.is_host && !self.participants.is_empty() && !self.starting
    }

    pub fn show_copied(&self) -> bool {
        self.copied_at.is_some_and(|at| at.elapsed() < COPIED_HINT)
    }
}

pub struct LobbyController {
    code: SessionCode,
    view: LobbyView,
    api: Arc<dyn SessionApi>,
    runtime: Handle,
    events_tx: Sender<LobbyEvent>,
    events_rx: Receiver<LobbyEvent>,
    poller: Option<Poller>,
}

impl LobbyController {
    /// Enter the waiting room and start polling the session.
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
            "lobby",
            period,
            move || {
                let api = Arc::clone(&poll_api);
                let code = poll_code.clone();
                async move { api.get_session(&code).await.map(LobbyEvent::Snapshot) }
            },
            events_tx.clone(),
        );

        info!("Entered lobby for {}", code);
        Self {
            code,
            view: LobbyView::new(is_host),
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

    pub fn view(&self) -> &LobbyView {
        &self.view
    }

    /// Apply everything that arrived since the last frame.
    pub fn pump(&mut self) -> Option<LobbyOutcome> {
        let mut outcome = None;
        while let Ok(event) = self.events_rx.try_recv() {
            let next = match event {
                LobbyEvent::Snapshot(snapshot) => self.view.apply_snapshot(snapshot),
                LobbyEvent::StartFinished(result) => self.view.apply_start(result),
            };
            outcome = outcome.or(next);
        }
        outcome
    }

    /// Host-only: ask the server to start, then move on without waiting for a poll.
    pub fn trigger_start(&mut self) {
        if !self.view.is_host {
            debug!("Ignoring start from a non-host");
            return;
        }
        if self.view.starting {
            return;
        }
        self.view.starting = true;
        self.view.error = None;

        let api = Arc::clone(&self.api);
        let code = self.code.clone();
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = api.start_session(&code).await.map(|s| s.started);
            let _ = tx.send(LobbyEvent::StartFinished(result));
        });
    }

    /// Returns the text to put on the clipboard and arms the "copied" hint.
    pub fn copy_session_code(&mut self) -> String {
        self.view.copied_at = Some(Instant::now());
        self.code.to_string()
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

impl Drop for LobbyController {
    fn drop(&mut self) {
        self.unmount();
    }
}
