use std::time::Duration;

use flamenco_sync_core::{
    AvailableJobTypes, FlamencoVersion, ManagerApi, SharedStorageLocation, TransportError,
    VariableAudience, WorkerTagList,
};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::ClientError;

/// Blocking REST client for one Flamenco Manager.
#[derive(Debug)]
pub struct HttpManagerClient {
    base_url: String,
    http: Client,
}

impl HttpManagerClient {
    /// `manager_url` is the Manager's root URL, e.g. `http://localhost:8080/`.
    pub fn new(manager_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("flamenco-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: manager_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let resp = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(TransportError::Api {
                status: status.as_u16(),
                message: api_message(status, &body),
            });
        }
        resp.json::<T>().map_err(classify)
    }
}

impl ManagerApi for HttpManagerClient {
    fn get_version(&self) -> Result<FlamencoVersion, TransportError> {
        self.get_json("/api/v3/version")
    }

    fn get_shared_storage(
        &self,
        audience: VariableAudience,
        platform: &str,
    ) -> Result<SharedStorageLocation, TransportError> {
        self.get_json(&format!(
            "/api/v3/configuration/shared-storage/{}/{}",
            audience.as_str(),
            platform
        ))
    }

    fn get_job_types(&self) -> Result<AvailableJobTypes, TransportError> {
        self.get_json("/api/v3/jobs/types")
    }

    fn fetch_worker_tags(&self) -> Result<WorkerTagList, TransportError> {
        self.get_json("/api/v3/worker-mgt/tags")
    }
}

/// A failed connect is the "nothing listening" case; everything else keeps its detail.
fn classify(e: reqwest::Error) -> TransportError {
    if e.is_connect() {
        TransportError::MaxRetries(e.to_string())
    } else {
        TransportError::Http(e.to_string())
    }
}

/// Error body the Manager sends along with non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn api_message(status: StatusCode, body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
        return err.message;
    }
    let reason = status.canonical_reason().unwrap_or("unknown status");
    let body = body.trim();
    if body.is_empty() {
        reason.to_string()
    } else {
        format!("{reason}: {body}")
    }
}
