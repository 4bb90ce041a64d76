//! Host command channel: client handle, router task, and event fan-in.

use crate::app::AppState;
use crate::error::{KelimeError, Result};
use crate::host::contract::{CommandEnvelope, CommandName, EventEnvelope, ResponseEnvelope};
use crate::host::handler::CommandRouter;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

struct HostCommandRequest {
    envelope: CommandEnvelope,
    response_tx: oneshot::Sender<ResponseEnvelope>,
}

/// Cloneable handle for submitting commands to the router.
#[derive(Clone)]
pub struct HostCommandClient {
    request_tx: mpsc::Sender<HostCommandRequest>,
    event_tx: broadcast::Sender<EventEnvelope>,
}

impl HostCommandClient {
    /// Submit a command and wait for its response.
    ///
    /// Command failures come back as `ok: false` envelopes; an `Err` here
    /// means the router itself is gone.
    pub async fn send(&self, envelope: CommandEnvelope) -> Result<ResponseEnvelope> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request_tx
            .send(HostCommandRequest {
                envelope,
                response_tx,
            })
            .await
            .map_err(|e| {
                KelimeError::Channel(format!("failed to send host command request: {e}"))
            })?;

        response_rx
            .await
            .map_err(|e| KelimeError::Channel(format!("host command response dropped: {e}")))
    }

    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<EventEnvelope> {
        self.event_tx.subscribe()
    }
}

/// Router task. Each request is handled on its own tokio task so a slow
/// upstream call only stalls that request.
pub struct HostCommandServer {
    request_rx: mpsc::Receiver<HostCommandRequest>,
    router: CommandRouter,
}

#[must_use]
pub fn command_channel(
    request_capacity: usize,
    event_capacity: usize,
    app: AppState,
) -> (HostCommandClient, HostCommandServer) {
    let (request_tx, request_rx) = mpsc::channel(request_capacity.max(1));
    let (event_tx, _event_rx) = broadcast::channel(event_capacity.max(1));
    spawn_event_forwarders(&app, event_tx.clone());

    (
        HostCommandClient {
            request_tx,
            event_tx,
        },
        HostCommandServer {
            request_rx,
            router: CommandRouter::new(app),
        },
    )
}

impl HostCommandServer {
    pub async fn run(mut self) {
        while let Some(request) = self.request_rx.recv().await {
            let router = self.router.clone();
            tokio::spawn(async move {
                let response = route(&router, request.envelope).await;
                let _ = request.response_tx.send(response);
            });
        }
        debug!("host command server stopped");
    }
}

/// Route a command envelope to its handler and wrap the outcome.
pub async fn route(router: &CommandRouter, envelope: CommandEnvelope) -> ResponseEnvelope {
    let request_id = envelope
        .request_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let Some(command) = CommandName::parse(envelope.command.trim()) else {
        return ResponseEnvelope::error(
            request_id,
            format!("unknown command `{}`", envelope.command),
        );
    };

    debug!(command = command.as_str(), %request_id, "host command");
    match router.handle(command, &envelope.payload).await {
        Ok(data) => ResponseEnvelope::ok(request_id, data),
        Err(e) => {
            warn!(command = command.as_str(), %request_id, error = %e, "host command failed");
            ResponseEnvelope::error(request_id, e.to_string())
        }
    }
}

/// Forward store and digest notifications as host events.
fn spawn_event_forwarders(app: &AppState, event_tx: broadcast::Sender<EventEnvelope>) {
    let mut store_rx = app.store.subscribe();
    let store_tx = event_tx.clone();
    tokio::spawn(async move {
        loop {
            match store_rx.recv().await {
                Ok(event) => {
                    let payload = serde_json::to_value(&event).unwrap_or_default();
                    let _ = store_tx.send(EventEnvelope::new("vocabulary.changed", payload));
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(lagged = n, "vocabulary event forwarder lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut digest_rx = app.digest.subscribe();
    tokio::spawn(async move {
        loop {
            match digest_rx.recv().await {
                Ok(sent) => {
                    let payload = serde_json::to_value(&sent).unwrap_or_default();
                    let _ = event_tx.send(EventEnvelope::new("digest.sent", payload));
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(lagged = n, "digest event forwarder lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
