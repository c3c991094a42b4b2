use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version information reported by the Manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlamencoVersion {
    /// Full version, e.g. "3.6-alpha0".
    pub version: String,
    /// Version without pre-release suffix.
    pub shortversion: String,
    /// Product name as shown to users, e.g. "Flamenco".
    pub name: String,
    /// Git hash the Manager was built from.
    pub git: String,
}

/// Who a shared storage location (or variable) is meant for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VariableAudience {
    Users,
    Workers,
}

impl VariableAudience {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Workers => "workers",
        }
    }
}

/// Location of the shared storage, as seen from one platform by one audience.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SharedStorageLocation {
    pub location: String,
    pub audience: VariableAudience,
    pub platform: String,
    #[serde(rename = "shamanEnabled")]
    pub shaman_enabled: bool,
}

/// Value type of a job setting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    String,
    Int32,
    Float,
    Bool,
    HashedFilePath,
}

/// Refinement of a string setting, mostly to pick a file browser widget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettingSubtype {
    FilePath,
    DirPath,
    FileName,
    HashedFilePath,
}

/// Where a job setting is shown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SettingVisibility {
    Visible,
    Hidden,
    Submission,
    Web,
}

/// One setting of a job type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableJobSetting {
    pub key: String,
    #[serde(rename = "type")]
    pub setting_type: SettingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<SettingSubtype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    /// Extra arguments for the UI property, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propargs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Python expression evaluated by the submitting client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval: Option<String>,
    #[serde(rename = "evalInfo", default, skip_serializing_if = "Option::is_none")]
    pub eval_info: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<SettingVisibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A job type the Manager accepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableJobType {
    /// Stable identifier, used for selections.
    pub name: String,
    pub label: String,
    pub settings: Vec<AvailableJobSetting>,
    /// Changes whenever the job type definition changes on the Manager.
    pub etag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// All job types known to the Manager, in Manager order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AvailableJobTypes {
    pub job_types: Vec<AvailableJobType>,
}

/// Tag restricting which workers may run a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerTag {
    /// Stable identifier, used for selections.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// All worker tags known to the Manager, in Manager order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerTagList {
    pub tags: Vec<WorkerTag>,
}

/// Raised when the parts of a snapshot do not form a consistent whole.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("job type {0:?} is listed more than once")]
    DuplicateJobType(String),
    #[error("worker tag {0:?} is listed more than once")]
    DuplicateWorkerTag(String),
}

/// Everything the add-on knows about one Manager.
///
/// This is the root object of the disk cache. A snapshot is replaced as a
/// whole on every refresh, never field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerSnapshot {
    version: FlamencoVersion,
    shared_storage: SharedStorageLocation,
    job_types: AvailableJobTypes,
    worker_tags: WorkerTagList,
}

impl ManagerSnapshot {
    /// Builds a snapshot, rejecting duplicate job type names and tag ids.
    pub fn new(
        version: FlamencoVersion,
        shared_storage: SharedStorageLocation,
        job_types: AvailableJobTypes,
        worker_tags: WorkerTagList,
    ) -> Result<Self, SnapshotError> {
        let mut seen = HashSet::new();
        for jt in &job_types.job_types {
            if !seen.insert(jt.name.as_str()) {
                return Err(SnapshotError::DuplicateJobType(jt.name.clone()));
            }
        }
        let mut seen = HashSet::new();
        for tag in &worker_tags.tags {
            if !seen.insert(tag.id.as_str()) {
                return Err(SnapshotError::DuplicateWorkerTag(tag.id.clone()));
            }
        }

        Ok(Self {
            version,
            shared_storage,
            job_types,
            worker_tags,
        })
    }

    pub fn version(&self) -> &FlamencoVersion {
        &self.version
    }

    pub fn shared_storage(&self) -> &SharedStorageLocation {
        &self.shared_storage
    }

    pub fn job_types(&self) -> &AvailableJobTypes {
        &self.job_types
    }

    pub fn worker_tags(&self) -> &WorkerTagList {
        &self.worker_tags
    }

    /// Looks up a job type by name.
    pub fn job_type(&self, name: &str) -> Option<&AvailableJobType> {
        self.job_types.job_types.iter().find(|jt| jt.name == name)
    }

    /// Looks up a worker tag by id.
    pub fn worker_tag(&self, id: &str) -> Option<&WorkerTag> {
        self.worker_tags.tags.iter().find(|t| t.id == id)
    }

    /// Human-readable one-liner, e.g. "Flamenco version 3.6 found".
    pub fn found_message(&self) -> String {
        format!("{} version {} found", self.version.name, self.version.version)
    }
}
