use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::container::ContainerID;

use super::{Snapshot, StatsSource};

/// Capacity of the channel shared by all forwarding tasks.
const MERGE_CHANNEL_CAPACITY: usize = 64;

/// One line of the statistics log.
#[derive(Debug, serde::Serialize)]
struct StatsRecord<'a, T> {
    container_id: &'a ContainerID,
    stats: &'a T,
}

/// Streams statistics of all `containers` into `out` until `cancel` fires.
///
/// One subscription and one forwarding task are started per container. The calling task
/// becomes the only writer of `out`: every non-empty snapshot is written as a single JSON
/// line of the form `{"container_id":"..","stats":{..}}`. Snapshots of one container are
/// written in the order they were received; there is no ordering across containers.
///
/// A subscription that closes only ends its own forwarding task. This function does not
/// return before `cancel` fires, and once it does it returns without draining snapshots
/// that are still buffered.
///
/// Write failures are logged and do not stop the collection.
pub async fn log_stats<S, W>(
    cancel: CancellationToken,
    out: &mut W,
    source: &S,
    containers: &[ContainerID],
) where
    S: StatsSource,
    W: AsyncWrite + Unpin,
{
    let (merged_tx, mut merged_rx) =
        mpsc::channel::<(ContainerID, S::Snapshot)>(MERGE_CHANNEL_CAPACITY);

    for container_id in containers {
        let stats_rx = source.subscribe(container_id, cancel.clone());
        tokio::spawn(forward_stats(
            cancel.clone(),
            container_id.clone(),
            stats_rx,
            merged_tx.clone(),
        ));
    }
    drop(merged_tx);

    let mut line = Vec::with_capacity(4096);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            entry = merged_rx.recv() => match entry {
                Some((container_id, snapshot)) => {
                    if snapshot.is_empty() {
                        continue;
                    }
                    line.clear();
                    if let Err(err) = write_record(out, &mut line, &container_id, &snapshot).await {
                        log::error!(
                            "failed to write stats for container \"{}\": {}",
                            container_id,
                            err
                        );
                    }
                }
                None => {
                    // every stream has ended
                    cancel.cancelled().await;
                    return;
                }
            },
        }
    }
}

async fn forward_stats<T>(
    cancel: CancellationToken,
    container_id: ContainerID,
    mut stats_rx: mpsc::Receiver<T>,
    merged_tx: mpsc::Sender<(ContainerID, T)>,
) {
    log::info!("Listening for stats for container \"{}\"", container_id);
    loop {
        let stat = tokio::select! {
            _ = cancel.cancelled() => return,
            stat = stats_rx.recv() => stat,
        };
        let Some(stat) = stat else {
            log::info!("Container \"{}\" is no longer streaming", container_id);
            return;
        };
        log::debug!("Received stat for container \"{}\"", container_id);

        tokio::select! {
            _ = cancel.cancelled() => return,
            sent = merged_tx.send((container_id.clone(), stat)) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}

async fn write_record<W, T>(
    out: &mut W,
    line: &mut Vec<u8>,
    container_id: &ContainerID,
    stats: &T,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    serde_json::to_writer(&mut *line, &StatsRecord {
        container_id,
        stats,
    })?;
    line.push(b'\n');
    out.write_all(line).await?;
    out.flush().await
}
