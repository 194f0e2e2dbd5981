use std::time::Duration;

use crate::config::Config;
use crate::container::ContainerID;

use super::{Call, Error, LifecycleClient, Result, RunOutcome};

/// Which calls to issue and how long each one may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    pub stop_container: bool,
    pub remove_container: bool,
    pub call_timeout: Duration,
}

impl From<&Config> for VerifyOptions {
    fn from(config: &Config) -> Self {
        Self {
            stop_container: config.stop_container,
            remove_container: config.remove_container,
            call_timeout: config.call_timeout,
        }
    }
}

/// Verifies that the daemon still answers lifecycle calls for `id`.
///
/// A failed kill is only logged. A failed or timed out inspect or remove is returned.
pub async fn verify_container<C>(
    client: &C,
    id: &ContainerID,
    options: &VerifyOptions,
) -> Result<()>
where
    C: LifecycleClient,
{
    if options.stop_container {
        if let Err(err) = bounded(Call::Kill, id, options.call_timeout, client.kill(id)).await {
            log::warn!("Could not stop container \"{}\": {}", id, err);
            log::info!("Will try to inspect container \"{}\"", id);
        }
    }

    let inspected = bounded(Call::Inspect, id, options.call_timeout, client.inspect(id))
        .await
        .inspect_err(|err| log::error!("Error inspecting container: {}", err))?;
    log::info!("Successfully inspected container \"{}\"", inspected);

    if options.remove_container {
        log::info!("Trying to remove container \"{}\"", inspected);
        bounded(Call::Remove, id, options.call_timeout, client.remove(id))
            .await
            .inspect_err(|err| log::error!("Could not remove container \"{}\": {}", id, err))?;
        log::info!("Removed container \"{}\"", inspected);
    }

    Ok(())
}

/// Verifies every container in turn. A failing container never stops the others.
pub async fn verify_all<C>(
    client: &C,
    ids: &[ContainerID],
    options: &VerifyOptions,
) -> RunOutcome
where
    C: LifecycleClient,
{
    let mut outcome = RunOutcome::default();
    for id in ids {
        let result = verify_container(client, id, options).await;
        outcome.record(id.clone(), result);
    }
    outcome
}

async fn bounded<T, E>(
    call: Call,
    id: &ContainerID,
    after: Duration,
    fut: impl Future<Output = std::result::Result<T, E>>,
) -> Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match tokio::time::timeout(after, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(Error::Call {
            call,
            id: id.clone(),
            source: Box::new(source),
        }),
        Err(_) => Err(Error::Timeout {
            call,
            id: id.clone(),
            after,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;
    use crate::lifecycle::EXIT_AFFECTED;

    #[derive(Debug, thiserror::Error)]
    #[error("no such container")]
    struct NotFound;

    #[derive(Default)]
    struct FakeClient {
        hung_inspect: HashSet<ContainerID>,
        failing_kill: HashSet<ContainerID>,
        failing_remove: HashSet<ContainerID>,
        calls: Mutex<Vec<(Call, ContainerID)>>,
    }

    impl FakeClient {
        fn calls(&self) -> Vec<(Call, ContainerID)> {
            self.calls.lock().unwrap().clone()
        }

        fn log(&self, call: Call, id: &ContainerID) {
            self.calls.lock().unwrap().push((call, id.clone()));
        }
    }

    impl LifecycleClient for FakeClient {
        type Error = NotFound;

        async fn kill(&self, id: &ContainerID) -> std::result::Result<(), NotFound> {
            self.log(Call::Kill, id);
            if self.failing_kill.contains(id) {
                return Err(NotFound);
            }
            Ok(())
        }

        async fn inspect(&self, id: &ContainerID) -> std::result::Result<ContainerID, NotFound> {
            self.log(Call::Inspect, id);
            if self.hung_inspect.contains(id) {
                std::future::pending::<()>().await;
            }
            Ok(id.clone())
        }

        async fn remove(&self, id: &ContainerID) -> std::result::Result<(), NotFound> {
            self.log(Call::Remove, id);
            if self.failing_remove.contains(id) {
                return Err(NotFound);
            }
            Ok(())
        }
    }

    fn container(id: &str) -> ContainerID {
        ContainerID::new(id).unwrap()
    }

    fn options(stop_container: bool, remove_container: bool) -> VerifyOptions {
        VerifyOptions {
            stop_container,
            remove_container,
            call_timeout: Duration::from_secs(15),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_all_healthy() {
        let client = FakeClient::default();
        let ids = [container("aaaa"), container("bbbb")];

        let outcome = verify_all(&client, &ids, &options(false, false)).await;

        assert!(outcome.is_success());
        assert_eq!(
            client.calls(),
            vec![(Call::Inspect, ids[0].clone()), (Call::Inspect, ids[1].clone())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_all_hung_inspect_marks_only_that_container() {
        let a = container("aaaa");
        let b = container("bbbb");
        let client = FakeClient {
            hung_inspect: HashSet::from([b.clone()]),
            ..Default::default()
        };

        let started = tokio::time::Instant::now();
        let outcome = verify_all(&client, &[a.clone(), b.clone()], &options(false, true)).await;

        assert!(started.elapsed() >= Duration::from_secs(15));
        assert_eq!(outcome.exit_code(), EXIT_AFFECTED);
        assert_eq!(outcome.affected().collect::<Vec<_>>(), vec![&b]);
        assert_eq!(outcome.inspection_commands(), vec!["# docker inspect bbbb"]);
        assert!(matches!(
            outcome.results()[1].1,
            Err(Error::Timeout {
                call: Call::Inspect,
                ..
            })
        ));
        assert_eq!(
            client.calls(),
            vec![
                (Call::Inspect, a.clone()),
                (Call::Remove, a),
                (Call::Inspect, b)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_container_failed_kill_still_inspects() {
        let id = container("aaaa");
        let client = FakeClient {
            failing_kill: HashSet::from([id.clone()]),
            ..Default::default()
        };

        verify_container(&client, &id, &options(true, false))
            .await
            .unwrap();

        assert_eq!(
            client.calls(),
            vec![(Call::Kill, id.clone()), (Call::Inspect, id)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_container_failed_remove() {
        let id = container("aaaa");
        let client = FakeClient {
            failing_remove: HashSet::from([id.clone()]),
            ..Default::default()
        };

        let err = verify_container(&client, &id, &options(false, true))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Call {
                call: Call::Remove,
                ..
            }
        ));
    }
}
