use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;

use config::{CONTAINER_COUNT, Config};
use container::ContainerID;
use docker::{ContainerStarter, DockerClient};
use error::{Error, ResultOkLogExt};
use lifecycle::{LifecycleClient, RunOutcome, VerifyOptions};

/// Health Stats Repro: reproduces hanging Docker API calls for containers with health checks.
///
/// A run builds a throwaway image with a fast health check, starts two containers from it,
/// streams their statistics and the daemon events for a fixed window and finally checks
/// whether the daemon still answers lifecycle calls for them within a timeout. It is meant
/// to be started many times in parallel to make the race in the daemon likely.
pub mod config;
pub mod container;
pub mod docker;
pub mod error;
pub mod events;
pub mod fsutil;
pub mod image;
pub mod lifecycle;
pub mod stats;

// A run:
//  open events-<stamp> and stats-<stamp> -> subscribe to daemon events ->
//  build image -> create containers -> start containers ->
//  stream stats of all containers -> sleep for the observation window -> cancel streams ->
//  kill (optional), inspect, remove (optional) every container with a timeout
//
// A hung stats subscription is never awaited, its task is left behind until the process
// exits. Inspection is the call the daemon was seen hanging on.

/// Runs one reproduction attempt.
///
/// `started` qualifies the names of the log files written to [`Config::output_dir`].
///
/// # Returns
///
/// The verification results of all containers. Containers that failed verification are
/// reported through the outcome, not as an error.
///
/// # Errors
///
/// Returns an error if the log files cannot be opened or if the image cannot be built or a
/// container cannot be created or started. Containers that were already started are
/// verified before a start failure is returned.
pub async fn run(config: Config, started: DateTime<Local>) -> Result<RunOutcome, Error> {
    log::info!("| Config: stop container:\t{}", config.stop_container);
    log::info!("| Config: remove container:\t{}", config.remove_container);
    let options = VerifyOptions::from(&config);

    let stamp = fsutil::run_stamp(&started);
    let mut events_out =
        fsutil::open_log_file(fsutil::log_file_path(&config.output_dir, "events", &stamp))?;
    let mut stats_out =
        fsutil::open_log_file(fsutil::log_file_path(&config.output_dir, "stats", &stamp))?;

    let client = DockerClient::connect().map_err(Error::Connect)?;

    let cancel = CancellationToken::new();
    // stops the streams on early returns as well
    let _cancel_on_return = cancel.clone().drop_guard();

    let events_task = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            events::log_events(cancel, &mut events_out, client.events()).await;
        })
    };

    log::info!("Building docker image `{}` for test", config.image_name);
    let mtime = u64::try_from(started.timestamp()).unwrap_or_default();
    let context = image::build_context(&image::dockerfile(&config.image_sleep), mtime)?;
    client
        .build_image(&config.image_name, context)
        .await
        .map_err(|source| Error::BuildImage {
            image: config.image_name.clone(),
            source,
        })?;

    let mut containers = Vec::with_capacity(CONTAINER_COUNT);
    for _ in 0..CONTAINER_COUNT {
        let id = client
            .create_container(&config.image_name)
            .await
            .map_err(Error::CreateContainer)?;
        log::info!("Created container \"{}\"", id);
        containers.push(id);
    }

    start_all(&client, &containers, &options).await?;

    let stats_task = {
        let client = client.clone();
        let cancel = cancel.clone();
        let containers = containers.clone();
        tokio::spawn(async move {
            stats::log_stats(cancel, &mut stats_out, &client, &containers).await;
        })
    };

    log::info!("Waiting for {:?}", config.run_duration);
    tokio::time::sleep(config.run_duration).await;
    cancel.cancel();
    stats_task.await.ok_log();
    events_task.await.ok_log();

    Ok(lifecycle::verify_all(&client, &containers, &options).await)
}

/// Starts `containers` in order.
///
/// # Errors
///
/// Returns [`Error::StartContainer`] for the first container that fails to start. The
/// containers started before it are verified with `options` before the error is returned.
pub async fn start_all<C>(
    client: &C,
    containers: &[ContainerID],
    options: &VerifyOptions,
) -> Result<(), Error>
where
    C: ContainerStarter + LifecycleClient,
{
    for (running, id) in containers.iter().enumerate() {
        if let Err(source) = client.start_container(id).await {
            lifecycle::verify_all(client, &containers[..running], options).await;
            return Err(Error::StartContainer {
                id: id.clone(),
                source,
            });
        }
    }
    Ok(())
}

/// Logs the affected containers and prints a ready-to-run inspection command for each.
pub fn report(outcome: &RunOutcome) {
    if outcome.is_success() {
        log::info!("Run completed without affected containers");
        return;
    }

    let commands = outcome.inspection_commands();
    log::warn!("Run affected {} container(s):", commands.len());
    for (id, result) in outcome.results() {
        if let Err(err) = result {
            log::warn!("container \"{}\": {}", id, err);
        }
    }
    for command in commands {
        println!("{command}");
    }
}
