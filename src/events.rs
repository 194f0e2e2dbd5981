//! Daemon-wide event logging.
use futures::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::ResultOkLogExt;

/// Writes every event of `events` as one JSON line to `out`.
///
/// Returns once `cancel` fires or the stream ends. Stream errors are logged and skipped.
pub async fn log_events<S, T, E, W>(cancel: CancellationToken, out: &mut W, events: S)
where
    S: Stream<Item = Result<T, E>>,
    T: serde::Serialize,
    E: std::error::Error,
    W: AsyncWrite + Unpin,
{
    let mut events = std::pin::pin!(events);
    let mut line = Vec::with_capacity(1024);
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            event = events.next() => event,
        };
        let Some(event) = event else {
            log::info!("Event stream closed");
            return;
        };
        let Some(event) = event.ok_log() else {
            continue;
        };

        line.clear();
        if let Err(err) = write_event(out, &mut line, &event).await {
            log::error!("failed to write event: {}", err);
        }
    }
}

async fn write_event<W, T>(out: &mut W, line: &mut Vec<u8>, event: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    serde_json::to_writer(&mut *line, event)?;
    line.push(b'\n');
    out.write_all(line).await?;
    out.flush().await
}
