use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::{
    runtime::Handle,
    sync::{mpsc, oneshot},
};
use tokio_tungstenite::tungstenite::Message;

use crate::error::TransportError;
use crate::models::websocket::{ChannelFrame, CONNECTION_ESTABLISHED, PING};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub type EventCallback = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    channels: BTreeSet<String>,
    bindings: HashMap<(String, String), Vec<(BindingId, EventCallback)>>,
    outgoing: Option<mpsc::UnboundedSender<ChannelFrame>>,
}

/// Stops the connection loop started by [`SessionTransport::connect`].
pub struct WsHandle {
    shutdown_tx: oneshot::Sender<()>,
}

impl WsHandle {
    pub fn shutdown(self) {
        info!("Shutting down channel socket");
        let _ = self.shutdown_tx.send(());
    }
}

/// Client side of the pub/sub channel service.
///
/// Subscriptions and bindings can be registered before or after connecting;
/// subscriptions are replayed on every (re)connect.
#[derive(Clone)]
pub struct SessionTransport {
    registry: Arc<Mutex<Registry>>,
    reconnect_delay: Duration,
}

impl Default for SessionTransport {
    fn default() -> Self {
        Self {
            registry: Arc::default(),
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

impl SessionTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pause between a dropped connection and the next attempt.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_connected(&self) -> bool {
        self.registry().outgoing.is_some()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.registry().channels.iter().cloned().collect()
    }

    pub fn subscribe(&self, channel: &str) {
        let mut registry = self.registry();
        if !registry.channels.insert(channel.to_owned()) {
            return;
        }
        debug!("Subscribing to {}", channel);
        if let Some(outgoing) = &registry.outgoing {
            let _ = outgoing.send(ChannelFrame::subscribe(channel));
        }
    }

    /// Leave a channel and drop every binding on it.
    pub fn unsubscribe(&self, channel: &str) {
        let mut registry = self.registry();
        if !registry.channels.remove(channel) {
            return;
        }
        debug!("Unsubscribing from {}", channel);
        registry.bindings.retain(|(bound, _), _| bound != channel);
        if let Some(outgoing) = &registry.outgoing {
            let _ = outgoing.send(ChannelFrame::unsubscribe(channel));
        }
    }

    pub fn bind<F>(&self, channel: &str, event: &str, callback: F) -> BindingId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = BindingId(registry.next_id);
        registry
            .bindings
            .entry((channel.to_owned(), event.to_owned()))
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    pub fn unbind(&self, id: BindingId) {
        let mut registry = self.registry();
        for callbacks in registry.bindings.values_mut() {
            callbacks.retain(|(bound, _)| *bound != id);
        }
        registry.bindings.retain(|_, callbacks| !callbacks.is_empty());
    }

    /// Deliver a frame to its bound callbacks. Returns how many ran.
    pub fn dispatch(&self, frame: &ChannelFrame) -> usize {
        if frame.is_system() {
            return 0;
        }
        let Some(channel) = frame.channel.as_deref() else {
            return 0;
        };
        let callbacks: Vec<EventCallback> = self
            .registry()
            .bindings
            .get(&(channel.to_owned(), frame.event.clone()))
            .map(|bound| bound.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();

        let payload = frame.payload();
        for callback in &callbacks {
            callback(&payload);
        }
        callbacks.len()
    }

    /// Keep a connection to `url` open until the handle is shut down,
    /// reconnecting after a delay whenever it drops.
    pub fn connect(&self, runtime: &Handle, url: String) -> WsHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let transport = self.clone();

        runtime.spawn(async move {
            loop {
                tokio::select! {
                    result = transport.run_once(&url) => match result {
                        Ok(()) => info!("Channel socket closed by server"),
                        Err(e) => error!("Channel socket error: {}", e),
                    },
                    _ = &mut shutdown_rx => break,
                }
                transport.registry().outgoing = None;

                info!("Reconnecting to channel service in {:?}", transport.reconnect_delay);
                tokio::select! {
                    _ = tokio::time::sleep(transport.reconnect_delay) => {}
                    _ = &mut shutdown_rx => break,
                }
            }
            transport.registry().outgoing = None;
            info!("Channel socket stopped");
        });

        WsHandle { shutdown_tx }
    }

    async fn run_once(&self, url: &str) -> Result<(), TransportError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url).await?;
        info!("Channel socket connected");
        let (mut sink, mut stream) = ws_stream.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        {
            let mut registry = self.registry();
            for channel in &registry.channels {
                let _ = out_tx.send(ChannelFrame::subscribe(channel));
            }
            registry.outgoing = Some(out_tx.clone());
        }

        loop {
            tokio::select! {
                Some(frame) = out_rx.recv() => {
                    let text = serde_json::to_string(&frame)?;
                    sink.send(Message::text(text)).await?;
                }
                message = stream.next() => match message {
                    Some(Ok(Message::Text(text))) => self.handle_text(text.as_str(), &out_tx),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                },
            }
        }
        sink.close().await.ok();
        Ok(())
    }

    fn handle_text(&self, text: &str, out_tx: &mpsc::UnboundedSender<ChannelFrame>) {
        let frame = match serde_json::from_str::<ChannelFrame>(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Received invalid frame: {}", e);
                return;
            }
        };
        match frame.event.as_str() {
            PING => {
                let _ = out_tx.send(ChannelFrame::pong());
            }
            CONNECTION_ESTABLISHED => debug!("Channel service handshake complete"),
            _ => {
                let delivered = self.dispatch(&frame);
                debug!(
                    "{} on {:?} delivered to {} handler(s)",
                    frame.event, frame.channel, delivered
                );
            }
        }
    }
}
