#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("docker api call failed: {0}")]
    Api(#[from] bollard::errors::Error),
    #[error("image build failed: {0}")]
    Build(String),
    #[error(transparent)]
    InvalidContainerID(#[from] crate::container::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
