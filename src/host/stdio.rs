//! Stdin/stdout JSON bridge for the host command channel.
//!
//! Reads newline-delimited JSON `CommandEnvelope` messages, dispatches them
//! through the command router, and writes `ResponseEnvelope` and
//! `EventEnvelope` messages as newline-delimited JSON.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use crate::app::AppState;
use crate::error::{KelimeError, Result};
use crate::host::channel::{HostCommandClient, command_channel};
use crate::host::contract::{CommandEnvelope, ResponseEnvelope};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Default request channel capacity for the stdio bridge.
const REQUEST_CAPACITY: usize = 64;

/// Default event broadcast channel capacity for the stdio bridge.
const EVENT_CAPACITY: usize = 128;

type SharedWriter<W> = Arc<Mutex<BufWriter<W>>>;

/// Run the bridge on the process's stdin and stdout until stdin closes.
pub async fn run_stdio_bridge(app: AppState) -> Result<()> {
    run_bridge(app, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Run the bridge over arbitrary byte streams until `input` reaches EOF.
///
/// Three kinds of tasks run concurrently: the line reader (this task), one
/// task per in-flight command, and an event forwarder. In-flight commands
/// are drained before returning.
pub async fn run_bridge<R, W>(app: AppState, input: R, output: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (client, server) = command_channel(REQUEST_CAPACITY, EVENT_CAPACITY, app);
    let writer: SharedWriter<W> = Arc::new(Mutex::new(BufWriter::new(output)));

    let server_handle = tokio::spawn(server.run());

    let event_writer = Arc::clone(&writer);
    let mut event_rx = client.subscribe_events();
    let event_handle = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event_envelope) => match serde_json::to_string(&event_envelope) {
                    Ok(json) => {
                        let mut w = event_writer.lock().await;
                        if let Err(e) = write_line(&mut w, &json).await {
                            tracing::warn!(
                                error = %e,
                                "failed to write event envelope; stopping event forwarder"
                            );
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to serialize event envelope; skipping");
                    }
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event forwarder lagged; some events were dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let reader_result = run_reader(client, input, Arc::clone(&writer)).await;

    event_handle.abort();
    let _ = event_handle.await;
    server_handle.abort();
    let _ = server_handle.await;

    reader_result
}

async fn run_reader<R, W>(
    client: HostCommandClient,
    input: R,
    writer: SharedWriter<W>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut reader = BufReader::new(input);
    let mut line = String::new();
    let mut in_flight = JoinSet::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| KelimeError::Channel(format!("failed to read from stdin: {e}")))?;

        if bytes_read == 0 {
            tracing::info!("stdin closed (EOF); shutting down stdio bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let envelope: CommandEnvelope = match serde_json::from_str(trimmed) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse command envelope");
                let response = ResponseEnvelope::error(
                    "parse-error",
                    format!("failed to parse command envelope: {e}"),
                );
                write_response(&writer, &response).await?;
                continue;
            }
        };

        let client = client.clone();
        let writer = Arc::clone(&writer);
        in_flight.spawn(async move {
            let request_id = envelope.request_id.clone().unwrap_or_default();
            let response = match client.send(envelope).await {
                Ok(resp) => resp,
                Err(e) => {
                    tracing::error!(error = %e, "host command dispatch failed");
                    ResponseEnvelope::error(request_id, format!("dispatch failed: {e}"))
                }
            };
            write_response(&writer, &response).await
        });

        // Reap finished commands so the set does not grow unbounded.
        while let Some(done) = in_flight.try_join_next() {
            log_command_task(done);
        }
    }

    while let Some(done) = in_flight.join_next().await {
        log_command_task(done);
    }
    Ok(())
}

fn log_command_task(done: std::result::Result<Result<()>, tokio::task::JoinError>) {
    match done {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "failed to write command response"),
        Err(e) => tracing::error!(error = %e, "command task panicked"),
    }
}

async fn write_response<W>(writer: &SharedWriter<W>, response: &ResponseEnvelope) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(response)
        .map_err(|e| KelimeError::Channel(format!("failed to serialize response envelope: {e}")))?;
    let mut w = writer.lock().await;
    write_line(&mut w, &json).await
}

/// Write a single JSON line to the buffered writer and flush.
async fn write_line<W>(writer: &mut BufWriter<W>, json: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| KelimeError::Channel(format!("failed to write to stdout: {e}")))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| KelimeError::Channel(format!("failed to write newline to stdout: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| KelimeError::Channel(format!("failed to flush stdout: {e}")))?;
    Ok(())
}
