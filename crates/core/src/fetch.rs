use tracing::debug;

use crate::model::{
    AvailableJobTypes, FlamencoVersion, ManagerSnapshot, SharedStorageLocation, SnapshotError,
    VariableAudience, WorkerTagList,
};

/// Failure reported by a [`ManagerApi`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be made at all, even after the transport's own
    /// retries. Typically nothing is listening on the configured port.
    #[error("max retries exceeded: {0}")]
    MaxRetries(String),
    /// Any other transport or HTTP level failure.
    #[error("{0}")]
    Http(String),
    /// The Manager answered, but with an error response.
    #[error("({status}) {message}")]
    Api { status: u16, message: String },
}

/// The part of the Manager's REST API needed to build a [`ManagerSnapshot`].
pub trait ManagerApi {
    fn get_version(&self) -> Result<FlamencoVersion, TransportError>;

    fn get_shared_storage(
        &self,
        audience: VariableAudience,
        platform: &str,
    ) -> Result<SharedStorageLocation, TransportError>;

    fn get_job_types(&self) -> Result<AvailableJobTypes, TransportError>;

    fn fetch_worker_tags(&self) -> Result<WorkerTagList, TransportError>;
}

/// Raised when the manager info could not be fetched from the Manager.
///
/// The `Display` text is what gets shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The low-level text is long and confusing, so it is kept out of the message.
    #[error("Manager cannot be reached")]
    Unreachable(#[source] TransportError),
    #[error("Manager cannot be reached: {0}")]
    Transport(#[source] TransportError),
    #[error("Manager returned inconsistent info: {0}")]
    Inconsistent(#[source] SnapshotError),
}

impl From<TransportError> for FetchError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::MaxRetries(_) => Self::Unreachable(e),
            _ => Self::Transport(e),
        }
    }
}

/// Platform name in the Manager's vocabulary ("linux", "windows", "darwin").
pub fn current_platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Fetches a complete snapshot for the current platform.
///
/// All four calls must succeed; the first failure aborts the fetch. Nothing is
/// cached here, that is up to the caller.
pub fn fetch<A: ManagerApi + ?Sized>(api: &A) -> Result<ManagerSnapshot, FetchError> {
    fetch_for_platform(api, current_platform())
}

/// Like [`fetch`], asking for the shared storage location of `platform`.
pub fn fetch_for_platform<A: ManagerApi + ?Sized>(
    api: &A,
    platform: &str,
) -> Result<ManagerSnapshot, FetchError> {
    debug!("fetching manager version");
    let version = api.get_version()?;
    debug!(platform, "fetching shared storage location");
    let shared_storage = api.get_shared_storage(VariableAudience::Users, platform)?;
    debug!("fetching job types");
    let job_types = api.get_job_types()?;
    debug!("fetching worker tags");
    let worker_tags = api.fetch_worker_tags()?;

    ManagerSnapshot::new(version, shared_storage, job_types, worker_tags)
        .map_err(FetchError::Inconsistent)
}
