use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::core::client::datastore::datastore_dto::{
    CommitRequest, CommitResponse, DsEntity, DsKey, LookupRequest, LookupResponse,
};
use crate::errors::{connection_error, transport_error, StoreError};

pub const DATASTORE_API_URL: &str = "https://datastore.googleapis.com";

/// Thin REST client for Cloud Datastore v1, or the local emulator.
#[derive(Debug, Clone)]
pub struct DatastoreClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    access_token: Option<String>,
}

impl DatastoreClient {
    /// Creates a client for `project_id`. No request is sent until the first call.
    pub fn new(
        project_id: &str,
        emulator_host: Option<&str>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        if project_id.trim().is_empty() {
            return Err(StoreError::Connection("project id must not be empty".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(connection_error)?;

        let base_url = match emulator_host {
            Some(host) => {
                debug!("Using Datastore emulator at {}", host);
                emulator_base_url(host)
            }
            None => DATASTORE_API_URL.to_string(),
        };

        Ok(Self {
            http,
            base_url,
            project_id: project_id.to_string(),
            access_token,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/v1/projects/{project}:{method}`
    pub fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1/projects/{}:{}",
            self.base_url,
            urlencoding::encode(&self.project_id),
            method
        )
    }

    /// Look up one key. `Ok(None)` when the store reports it missing.
    pub async fn lookup(&self, key: &DsKey) -> Result<Option<DsEntity>, StoreError> {
        let req = LookupRequest {
            keys: vec![key.clone()],
        };
        let resp: LookupResponse = self.post("lookup", &req).await?;

        if !resp.deferred.is_empty() {
            return Err(StoreError::Transport("lookup deferred by store".into()));
        }

        Ok(resp.found.into_iter().next().map(|r| r.entity))
    }

    /// Non-transactional upsert of a single entity.
    pub async fn upsert(&self, entity: DsEntity) -> Result<CommitResponse, StoreError> {
        let resp: CommitResponse = self.post("commit", &CommitRequest::upsert(entity)).await?;

        if resp
            .mutation_results
            .iter()
            .any(|r| r.conflict_detected == Some(true))
        {
            return Err(StoreError::Conflict("commit reported a conflicting write".into()));
        }

        Ok(resp)
    }

    async fn post<Req, Resp>(&self, method: &str, body: &Req) -> Result<Resp, StoreError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(method);
        let mut req = self.http.post(&url).json(body);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(transport_error)?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(StoreError::from_status(status, &text));
        }

        debug!("POST {} -> {}", url, status);
        resp.json::<Resp>()
            .await
            .map_err(|e| StoreError::Rejected(format!("Unreadable {} response: {}", method, e)))
    }
}

fn emulator_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}
