use crate::container::ContainerID;
use crate::{docker, fsutil, image};

/// Errors that abort a run before the observation window.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to set up docker client: {0}")]
    Connect(#[source] docker::Error),
    #[error(transparent)]
    LogFile(#[from] fsutil::FileOpenError),
    #[error(transparent)]
    BuildContext(#[from] image::Error),
    #[error("failed to build image `{image}`: {source}")]
    BuildImage {
        image: String,
        #[source]
        source: docker::Error,
    },
    #[error("failed to create container: {0}")]
    CreateContainer(#[source] docker::Error),
    #[error("failed to start container \"{id}\": {source}")]
    StartContainer {
        id: ContainerID,
        #[source]
        source: docker::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait ResultOkLogExt<T, E> {
    fn ok_log(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{err}");
                None
            }
        }
    }
}
