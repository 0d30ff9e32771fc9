use attest_commit_reveal::CommitRevealError;
use attest_gossipers::GossiperError;
use attest_registry::RegistryError;
use attest_stake::StakeError;
use attest_verifiers::VerifierError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("stake error: {0}")]
    Stake(#[from] StakeError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("commit-reveal error: {0}")]
    CommitReveal(#[from] CommitRevealError),

    #[error("gossiper pool error: {0}")]
    Gossiper(#[from] GossiperError),

    #[error("verifier pool error: {0}")]
    Verifier(#[from] VerifierError),

    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("simulation error: {0}")]
    Simulation(String),
}
