//! JSON document codec for [`ManagerSnapshot`].
//!
//! The cache document is a plain JSON object with one key per snapshot part.
//! Nothing in the JSON says which schema a nested object follows, so decoding
//! goes through [`TYPE_REGISTRY`]: every top-level key is bound to exactly one
//! [`ApiModel`] type and validated against it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::{
    AvailableJobTypes, FlamencoVersion, ManagerSnapshot, SharedStorageLocation, SnapshotError,
    WorkerTagList,
};

/// A schema-defined object received from the Manager.
pub trait ApiModel: Serialize + DeserializeOwned {
    /// Top-level key under which this object is stored in the cache document.
    const KEY: &'static str;
    /// Schema name, used in diagnostics.
    const SCHEMA: &'static str;

    /// Converts the object into its JSON mapping.
    fn to_mapping(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Validates a JSON mapping against this schema and converts it.
    fn from_mapping(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

impl ApiModel for FlamencoVersion {
    const KEY: &'static str = "flamenco_version";
    const SCHEMA: &'static str = "FlamencoVersion";
}

impl ApiModel for SharedStorageLocation {
    const KEY: &'static str = "shared_storage";
    const SCHEMA: &'static str = "SharedStorageLocation";
}

impl ApiModel for AvailableJobTypes {
    const KEY: &'static str = "job_types";
    const SCHEMA: &'static str = "AvailableJobTypes";
}

impl ApiModel for WorkerTagList {
    const KEY: &'static str = "worker_tags";
    const SCHEMA: &'static str = "WorkerTagList";
}

/// One binding of the type registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub key: &'static str,
    pub schema: &'static str,
}

const fn entry<T: ApiModel>() -> RegistryEntry {
    RegistryEntry {
        key: T::KEY,
        schema: T::SCHEMA,
    }
}

/// Top-level key to schema bindings of the cache document, in snapshot order.
pub const TYPE_REGISTRY: [RegistryEntry; 4] = [
    entry::<FlamencoVersion>(),
    entry::<SharedStorageLocation>(),
    entry::<AvailableJobTypes>(),
    entry::<WorkerTagList>(),
];

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("top-level value is not a JSON object")]
    NotAnObject,
    #[error("missing key {0:?}")]
    MissingKey(&'static str),
    #[error("{key:?} does not match schema {schema}: {source}")]
    Schema {
        key: &'static str,
        schema: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("inconsistent snapshot: {0}")]
    Inconsistent(#[from] SnapshotError),
}

/// Encodes a snapshot as a pretty-printed JSON document.
///
/// Only fails if the JSON serializer itself fails, which does not happen for
/// snapshots built through [`ManagerSnapshot::new`].
pub fn encode(snapshot: &ManagerSnapshot) -> serde_json::Result<Vec<u8>> {
    let mut doc = Map::new();
    put(&mut doc, snapshot.version())?;
    put(&mut doc, snapshot.shared_storage())?;
    put(&mut doc, snapshot.job_types())?;
    put(&mut doc, snapshot.worker_tags())?;
    serde_json::to_vec_pretty(&Value::Object(doc))
}

/// Decodes a JSON document produced by [`encode`].
///
/// All-or-nothing: any missing key or schema violation fails the whole decode.
pub fn decode(bytes: &[u8]) -> Result<ManagerSnapshot, DecodeError> {
    let doc: Value = serde_json::from_slice(bytes).map_err(DecodeError::Syntax)?;
    let Value::Object(mut doc) = doc else {
        return Err(DecodeError::NotAnObject);
    };

    let version = take::<FlamencoVersion>(&mut doc)?;
    let shared_storage = take::<SharedStorageLocation>(&mut doc)?;
    let job_types = take::<AvailableJobTypes>(&mut doc)?;
    let worker_tags = take::<WorkerTagList>(&mut doc)?;

    Ok(ManagerSnapshot::new(
        version,
        shared_storage,
        job_types,
        worker_tags,
    )?)
}

fn put<T: ApiModel>(doc: &mut Map<String, Value>, model: &T) -> serde_json::Result<()> {
    doc.insert(T::KEY.to_string(), model.to_mapping()?);
    Ok(())
}

fn take<T: ApiModel>(doc: &mut Map<String, Value>) -> Result<T, DecodeError> {
    let value = doc.remove(T::KEY).ok_or(DecodeError::MissingKey(T::KEY))?;
    T::from_mapping(value).map_err(|source| DecodeError::Schema {
        key: T::KEY,
        schema: T::SCHEMA,
        source,
    })
}
