use std::process::ExitCode;

use health_stats_repro::config::Config;
use health_stats_repro::lifecycle::EXIT_SETUP_FAILURE;

/// Entry point for the health check stats reproduction harness.
///
/// One invocation builds the test image, runs two containers with health checks while
/// streaming their stats and the daemon events, and then checks whether the daemon still
/// answers for them.
///
/// Exits with `0` if every container answered, `1` if the run could not be set up and
/// `2` if at least one container was affected.
///
/// # Examples
///
/// ```bash
/// head -c 20 /dev/zero | xargs -0 -L1 -P0 ./health-stats-repro
/// ```
#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let started = chrono::Local::now();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::from(EXIT_SETUP_FAILURE);
        }
    };

    match health_stats_repro::run(config, started).await {
        Ok(outcome) => {
            health_stats_repro::report(&outcome);
            ExitCode::from(outcome.exit_code())
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(EXIT_SETUP_FAILURE)
        }
    }
}
