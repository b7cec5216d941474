//! Wire types for the Cloud Datastore REST v1 `lookup` and `commit` calls.
//! Only the fields this crate reads or writes are modeled.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsPartitionId {
    pub project_id: String,
    pub namespace_id: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsPathElement {
    pub kind: String,
    pub name: Option<String>,
    /// int64 encoded as a string on the wire
    pub id: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsKey {
    pub partition_id: Option<DsPartitionId>,
    #[serde(default)]
    pub path: Vec<DsPathElement>,
}

impl DsKey {
    /// Single-element named key, like a parentless `NameKey`.
    pub fn named(project_id: &str, kind: &str, name: &str) -> Self {
        Self {
            partition_id: Some(DsPartitionId {
                project_id: project_id.to_string(),
                namespace_id: None,
            }),
            path: vec![DsPathElement {
                kind: kind.to_string(),
                name: Some(name.to_string()),
                id: None,
            }],
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsValue {
    pub string_value: Option<String>,
    pub exclude_from_indexes: Option<bool>,
}

impl DsValue {
    pub fn string(v: impl Into<String>) -> Self {
        Self {
            string_value: Some(v.into()),
            exclude_from_indexes: None,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsEntity {
    pub key: Option<DsKey>,
    #[serde(default)]
    pub properties: BTreeMap<String, DsValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsEntityResult {
    pub entity: DsEntity,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupRequest {
    pub keys: Vec<DsKey>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    #[serde(default)]
    pub found: Vec<DsEntityResult>,
    #[serde(default)]
    pub missing: Vec<DsEntityResult>,
    #[serde(default)]
    pub deferred: Vec<DsKey>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DsMutation {
    pub upsert: Option<DsEntity>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub mode: String,
    pub mutations: Vec<DsMutation>,
}

impl CommitRequest {
    pub fn upsert(entity: DsEntity) -> Self {
        Self {
            mode: "NON_TRANSACTIONAL".into(),
            mutations: vec![DsMutation {
                upsert: Some(entity),
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsMutationResult {
    pub key: Option<DsKey>,
    pub version: Option<String>,
    pub conflict_detected: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    #[serde(default)]
    pub mutation_results: Vec<DsMutationResult>,
    pub index_updates: Option<i64>,
}
