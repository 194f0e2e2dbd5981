use crate::container::ContainerID;

use super::Result;

/// No container was affected.
pub const EXIT_SUCCESS: u8 = 0;
/// The image could not be built or a container could not be created or started.
pub const EXIT_SETUP_FAILURE: u8 = 1;
/// At least one container failed its verification.
pub const EXIT_AFFECTED: u8 = 2;

/// The verification results of one run, in the order the containers were verified.
#[derive(Debug, Default)]
pub struct RunOutcome {
    results: Vec<(ContainerID, Result<()>)>,
}

impl RunOutcome {
    pub fn record(&mut self, id: ContainerID, result: Result<()>) {
        self.results.push((id, result));
    }

    pub fn results(&self) -> &[(ContainerID, Result<()>)] {
        &self.results
    }

    /// Returns the containers that failed their verification.
    pub fn affected(&self) -> impl Iterator<Item = &ContainerID> {
        self.results
            .iter()
            .filter(|(_, result)| result.is_err())
            .map(|(id, _)| id)
    }

    pub fn is_success(&self) -> bool {
        self.affected().next().is_none()
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            EXIT_SUCCESS
        } else {
            EXIT_AFFECTED
        }
    }

    /// Commands an operator can paste to look at the daemon state of affected containers.
    pub fn inspection_commands(&self) -> Vec<String> {
        self.affected()
            .map(|id| format!("# docker inspect {id}"))
            .collect()
    }
}
