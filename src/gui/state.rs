use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc,
};

use log::{info, warn};
use tokio::runtime::Handle;

use super::toast::ToastCenter;
use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::live::{PollIntervals, SessionFlow};
use crate::models::auth::UserProfile;
use crate::models::events::PushEvent;
use crate::notify::{bind_push_events, unbind_push_events, NotificationBridge};
use crate::storage::{AuthStore, StoredAuth};
use crate::websocket::{BindingId, SessionTransport, WsHandle};

pub const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

#[derive(Debug, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub submitting: bool,
    pub error: Option<String>,
}

enum AuthEvent {
    LoggedIn(Result<StoredAuth, ApiError>),
}

pub struct AppState {
    pub config: AppConfig,
    pub flow: SessionFlow,
    pub login_form: LoginForm,
    pub user: Option<UserProfile>,
    /// Shown above the login form, e.g. after the token expired.
    pub notice: Option<String>,
    pub notifications: NotificationBridge<ToastCenter>,
    runtime: Handle,
    client: ApiClient,
    transport: SessionTransport,
    ws_handle: Option<WsHandle>,
    push_bindings: Vec<BindingId>,
    push_tx: Sender<PushEvent>,
    push_rx: Receiver<PushEvent>,
    auth_tx: Sender<AuthEvent>,
    auth_rx: Receiver<AuthEvent>,
}

impl AppState {
    pub fn new(config: AppConfig, auth: Arc<AuthStore>, runtime: Handle) -> Self {
        let client = ApiClient::new(&config.api_base_url, auth);
        let flow = SessionFlow::new(
            Arc::new(client.clone()),
            runtime.clone(),
            PollIntervals {
                lobby: config.lobby_poll_interval(),
                game: config.game_poll_interval(),
            },
            config.default_time_per_question,
        );
        let notifications = NotificationBridge::new(ToastCenter::new(config.notifications_enabled));
        let (push_tx, push_rx) = mpsc::channel();
        let (auth_tx, auth_rx) = mpsc::channel();

        let mut state = Self {
            config,
            flow,
            login_form: LoginForm::default(),
            user: None,
            notice: None,
            notifications,
            runtime,
            client,
            transport: SessionTransport::new(),
            ws_handle: None,
            push_bindings: Vec::new(),
            push_tx,
            push_rx,
            auth_tx,
            auth_rx,
        };
        if let Some(user) = state.client.auth().user() {
            state.signed_in(user);
        }
        state
    }

    pub fn is_push_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn login(&mut self) {
        if self.login_form.submitting {
            return;
        }
        if self.login_form.email.trim().is_empty() || self.login_form.password.is_empty() {
            self.login_form.error = Some("Enter your email and password.".to_owned());
            return;
        }
        self.login_form.submitting = true;
        self.login_form.error = None;

        let client = self.client.clone();
        let email = self.login_form.email.clone();
        let password = self.login_form.password.clone();
        let tx = self.auth_tx.clone();
        self.runtime.spawn(async move {
            let result = client.login(&email, &password).await;
            let _ = tx.send(AuthEvent::LoggedIn(result));
        });
    }

    pub fn logout(&mut self) {
        self.sign_out();
        let client = self.client.clone();
        self.runtime.spawn(async move { client.logout().await });
    }

    fn signed_in(&mut self, user: UserProfile) {
        info!("Signed in as {}", user.name);
        self.login_form = LoginForm::default();
        self.notice = None;
        self.notifications.permission();
        self.establish_ws_connection(&user.id);
        self.user = Some(user);
    }

    fn sign_out(&mut self) {
        self.flow.leave_session();
        self.disconnect();
        self.user = None;
    }

    fn establish_ws_connection(&mut self, user_id: &str) {
        self.disconnect();
        self.push_bindings = bind_push_events(&self.transport, user_id, self.push_tx.clone());
        self.ws_handle = Some(
            self.transport
                .connect(&self.runtime, self.config.push_url.clone()),
        );
    }

    pub fn disconnect(&mut self) {
        if let Some(handle) = self.ws_handle.take() {
            handle.shutdown();
        }
        if let Some(user) = &self.user {
            let bindings = std::mem::take(&mut self.push_bindings);
            unbind_push_events(&self.transport, &user.id, bindings);
        }
    }

    /// Drain background results; call once per frame before drawing.
    pub fn pump(&mut self) {
        while let Ok(event) = self.auth_rx.try_recv() {
            match event {
                AuthEvent::LoggedIn(Ok(auth)) => self.signed_in(auth.user),
                AuthEvent::LoggedIn(Err(e)) => {
                    warn!("Login failed: {}", e);
                    self.login_form.submitting = false;
                    self.login_form.error = Some(match &e {
                        ApiError::Unauthorized => "Invalid email or password.".to_owned(),
                        ApiError::Transport(_) => "Could not reach the server.".to_owned(),
                        _ => e.server_message().unwrap_or("Login failed.").to_owned(),
                    });
                }
            }
        }

        self.flow.pump();

        // Any request answered with 401 purges the token store.
        if self.user.is_some() && !self.client.auth().is_authenticated() {
            warn!("Token rejected by the server; returning to login");
            self.sign_out();
            self.notice = Some(SESSION_EXPIRED.to_owned());
        }

        while let Ok(event) = self.push_rx.try_recv() {
            self.notifications.handle_event(&event);
        }
    }
}
