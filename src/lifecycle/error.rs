use std::fmt;
use std::time::Duration;

use crate::container::ContainerID;

/// A lifecycle call issued against a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Kill,
    Inspect,
    Remove,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Call::Kill => "kill",
            Call::Inspect => "inspect",
            Call::Remove => "remove",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{call} of container \"{id}\" did not return within {after:?}")]
    Timeout {
        call: Call,
        id: ContainerID,
        after: Duration,
    },
    #[error("{call} of container \"{id}\" failed: {source}")]
    Call {
        call: Call,
        id: ContainerID,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
