//! Post-observation verification of the containers of a run.
//!
//! After the observation window every container is (optionally) killed, inspected and
//! (optionally) removed. Each call is bounded by a timeout; a call that fails or does not
//! return in time marks the container as affected. Inspection is the check the daemon
//! defect shows up on.
mod error;
mod outcome;
mod verify;

use crate::container::ContainerID;

pub use error::{Call, Error, Result};
pub use outcome::{EXIT_AFFECTED, EXIT_SETUP_FAILURE, EXIT_SUCCESS, RunOutcome};
pub use verify::{VerifyOptions, verify_all, verify_container};

/// The container API calls needed to verify a container.
pub trait LifecycleClient {
    type Error: std::error::Error + Send + Sync + 'static;

    fn kill(
        &self,
        id: &ContainerID,
    ) -> impl Future<Output = std::result::Result<(), Self::Error>> + Send;

    /// Inspects the container and returns the id the daemon reported for it.
    fn inspect(
        &self,
        id: &ContainerID,
    ) -> impl Future<Output = std::result::Result<ContainerID, Self::Error>> + Send;

    fn remove(
        &self,
        id: &ContainerID,
    ) -> impl Future<Output = std::result::Result<(), Self::Error>> + Send;
}
