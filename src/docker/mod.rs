//! Docker daemon access through [`bollard`].
//!
//! [`DockerClient`] provides the setup calls of a run and implements the
//! [`ContainerStarter`], [`StatsSource`] and [`LifecycleClient`] seams on top of the
//! daemon API.
use std::pin::pin;

use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, KillContainerOptions,
    RemoveContainerOptions, StartContainerOptions, Stats, StatsOptions,
};
use bollard::image::BuildImageOptions;
use bollard::models::EventMessage;
use bollard::system::EventsOptions;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::container::ContainerID;
use crate::image;
use crate::lifecycle::LifecycleClient;
use crate::stats::{Snapshot, StatsSource};

mod error;

pub use error::{Error, Result};

/// Capacity of a single container's statistics channel.
const STATS_CHANNEL_CAPACITY: usize = 1;

/// Prefix of the zero timestamp the daemon puts into statistics of a stopped container.
const ZERO_TIME_PREFIX: &str = "0001-01-01T00:00:00";

impl Snapshot for Stats {
    fn is_empty(&self) -> bool {
        is_zero_time(&self.read)
    }
}

fn is_zero_time(timestamp: &str) -> bool {
    timestamp.is_empty() || timestamp.starts_with(ZERO_TIME_PREFIX)
}

#[derive(Debug, Clone)]
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    /// Connects to the daemon named by `DOCKER_HOST`, or the local socket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] if the connection settings are unusable. The daemon itself is
    /// not contacted.
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }

    /// Builds the image `name` from the tar archive `context`.
    ///
    /// The build output is copied to standard output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Build`] for the first error the build reports, [`Error::Api`] if the
    /// request fails.
    pub async fn build_image(&self, name: &str, context: Vec<u8>) -> Result<()> {
        let options = BuildImageOptions {
            dockerfile: image::DOCKERFILE_NAME,
            t: name,
            rm: true,
            ..Default::default()
        };
        let mut output = pin!(self.docker.build_image(options, None, Some(context.into())));
        while let Some(info) = output.next().await {
            let info = info?;
            if let Some(err) = info.error {
                return Err(Error::Build(err));
            }
            if let Some(line) = info.stream {
                print!("{line}");
            }
        }
        log::info!("Built image `{}`", name);
        Ok(())
    }

    pub async fn create_container(&self, image: &str) -> Result<ContainerID> {
        let config = Config {
            image: Some(image),
            ..Default::default()
        };
        let response = self
            .docker
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await?;
        for warning in &response.warnings {
            log::warn!("container \"{}\": {}", response.id, warning);
        }
        Ok(ContainerID::new(response.id)?)
    }

    /// Subscribes to the daemon-wide event stream.
    pub fn events(
        &self,
    ) -> impl Stream<Item = std::result::Result<EventMessage, bollard::errors::Error>> + Send + '_
    {
        self.docker.events(None::<EventsOptions<String>>)
    }
}

/// Starts created containers.
pub trait ContainerStarter {
    fn start_container(&self, id: &ContainerID) -> impl Future<Output = Result<()>> + Send;
}

impl ContainerStarter for DockerClient {
    async fn start_container(&self, id: &ContainerID) -> Result<()> {
        self.docker
            .start_container(id.as_str(), None::<StartContainerOptions<String>>)
            .await?;
        log::info!("Started container \"{}\"", id);
        Ok(())
    }
}

impl StatsSource for DockerClient {
    type Snapshot = Stats;

    fn subscribe(
        &self,
        container_id: &ContainerID,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<Stats> {
        let (tx, rx) = mpsc::channel(STATS_CHANNEL_CAPACITY);
        tokio::spawn(stream_stats(self.docker.clone(), container_id.clone(), cancel, tx));
        rx
    }
}

/// Pumps the daemon's statistics stream of one container into `tx`.
///
/// Ends when the stream ends or fails, when `cancel` fires or when `tx` is closed.
async fn stream_stats(
    docker: Docker,
    container_id: ContainerID,
    cancel: CancellationToken,
    tx: mpsc::Sender<Stats>,
) {
    let options = StatsOptions {
        stream: true,
        one_shot: false,
    };
    let mut stream = pin!(docker.stats(container_id.as_str(), Some(options)));
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return,
            next = stream.next() => next,
        };
        match next {
            Some(Ok(stats)) => {
                if tx.send(stats).await.is_err() {
                    return;
                }
            }
            Some(Err(err)) => {
                log::warn!(
                    "stats stream of container \"{}\" failed: {}",
                    container_id,
                    err
                );
                return;
            }
            None => return,
        }
    }
}

impl LifecycleClient for DockerClient {
    type Error = Error;

    async fn kill(&self, id: &ContainerID) -> Result<()> {
        self.docker
            .kill_container(id.as_str(), None::<KillContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn inspect(&self, id: &ContainerID) -> Result<ContainerID> {
        let response = self
            .docker
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await?;
        match response.id {
            Some(inspected) => Ok(ContainerID::new(inspected)?),
            None => Ok(id.clone()),
        }
    }

    async fn remove(&self, id: &ContainerID) -> Result<()> {
        self.docker
            .remove_container(id.as_str(), None::<RemoveContainerOptions>)
            .await?;
        Ok(())
    }
}
