use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::container::ContainerID;

/// A point-in-time resource usage measurement of one container.
pub trait Snapshot: serde::Serialize + Send + 'static {
    /// Returns `true` for records that carry no measurement.
    ///
    /// The daemon emits such a zero-valued record when the container goes away
    /// while a stream is still open.
    fn is_empty(&self) -> bool;
}

/// A producer of per-container statistics streams.
pub trait StatsSource {
    type Snapshot: Snapshot;

    /// Opens a statistics subscription for `container_id`.
    ///
    /// The returned receiver yields snapshots in the order the source produced them and
    /// closes once the subscription ends. Implementations must tear the subscription down
    /// when `cancel` fires; one that does not simply leaks its producer.
    fn subscribe(
        &self,
        container_id: &ContainerID,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<Self::Snapshot>;
}
