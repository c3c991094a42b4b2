//! Integration tests for fetch, cache and refresh working together.

use std::cell::Cell;

use flamenco_sync_core::{
    fetch, fetch_for_platform, refresh, AvailableJobType, AvailableJobTypes, CacheStore,
    FetchError, FlamencoVersion, ManagerApi, ReportLevel, SceneSelections, Selection,
    SharedStorageLocation, TransportError, VariableAudience, WorkerTag, WorkerTagList,
    NO_SELECTION_ID, STATUS_PENDING,
};
use tempfile::tempdir;

/// Which remote call should fail, and how.
#[derive(Clone)]
enum Failure {
    None,
    Version(TransportError),
    SharedStorage(TransportError),
    JobTypes(TransportError),
    WorkerTags(TransportError),
}

struct FakeManager {
    version: &'static str,
    job_types: Vec<&'static str>,
    tags: Vec<(&'static str, &'static str)>,
    failure: Failure,
    calls: Cell<usize>,
    asked_platform: std::cell::RefCell<Option<(VariableAudience, String)>>,
}

impl FakeManager {
    fn new(job_types: &[&'static str], tags: &[(&'static str, &'static str)]) -> Self {
        Self {
            version: "3.6",
            job_types: job_types.to_vec(),
            tags: tags.to_vec(),
            failure: Failure::None,
            calls: Cell::new(0),
            asked_platform: Default::default(),
        }
    }

    fn failing(mut self, failure: Failure) -> Self {
        self.failure = failure;
        self
    }

    fn call(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl ManagerApi for FakeManager {
    fn get_version(&self) -> Result<FlamencoVersion, TransportError> {
        self.call();
        if let Failure::Version(e) = &self.failure {
            return Err(e.clone());
        }
        Ok(FlamencoVersion {
            version: self.version.into(),
            shortversion: self.version.into(),
            name: "Flamenco".into(),
            git: "deadbeef".into(),
        })
    }

    fn get_shared_storage(
        &self,
        audience: VariableAudience,
        platform: &str,
    ) -> Result<SharedStorageLocation, TransportError> {
        self.call();
        *self.asked_platform.borrow_mut() = Some((audience, platform.to_string()));
        if let Failure::SharedStorage(e) = &self.failure {
            return Err(e.clone());
        }
        Ok(SharedStorageLocation {
            location: "/mnt/flamenco".into(),
            audience,
            platform: platform.into(),
            shaman_enabled: false,
        })
    }

    fn get_job_types(&self) -> Result<AvailableJobTypes, TransportError> {
        self.call();
        if let Failure::JobTypes(e) = &self.failure {
            return Err(e.clone());
        }
        Ok(AvailableJobTypes {
            job_types: self
                .job_types
                .iter()
                .map(|name| AvailableJobType {
                    name: name.to_string(),
                    label: name.to_string(),
                    settings: vec![],
                    etag: "etag".into(),
                    description: None,
                })
                .collect(),
        })
    }

    fn fetch_worker_tags(&self) -> Result<WorkerTagList, TransportError> {
        self.call();
        if let Failure::WorkerTags(e) = &self.failure {
            return Err(e.clone());
        }
        Ok(WorkerTagList {
            tags: self
                .tags
                .iter()
                .map(|(id, name)| WorkerTag {
                    id: id.to_string(),
                    name: name.to_string(),
                    description: None,
                })
                .collect(),
        })
    }
}

fn scene(job_type: Option<&str>, tag: Option<&str>) -> SceneSelections {
    SceneSelections {
        job_type: job_type.map(Selection::new).unwrap_or_default(),
        worker_tag: tag.map(Selection::new).unwrap_or_default(),
    }
}

#[test]
fn fetch_asks_users_storage_for_given_platform() {
    let api = FakeManager::new(&["render"], &[]);
    let snap = fetch_for_platform(&api, "windows").unwrap();
    assert_eq!(snap.shared_storage().platform, "windows");
    assert_eq!(
        *api.asked_platform.borrow(),
        Some((VariableAudience::Users, "windows".to_string()))
    );
    assert_eq!(api.calls.get(), 4);
}

#[test]
fn fetch_fails_as_a_whole_on_any_single_failure() {
    let err = TransportError::Http("boom".into());
    for failure in [
        Failure::Version(err.clone()),
        Failure::SharedStorage(err.clone()),
        Failure::JobTypes(err.clone()),
        Failure::WorkerTags(err.clone()),
    ] {
        let api = FakeManager::new(&["render"], &[("gpu", "GPU")]).failing(failure);
        assert_eq!(
            fetch(&api).unwrap_err(),
            FetchError::Transport(TransportError::Http("boom".into()))
        );
    }
}

#[test]
fn fetch_stops_at_first_failure() {
    let api = FakeManager::new(&[], &[]).failing(Failure::Version(TransportError::MaxRetries(
        "connection refused".into(),
    )));
    assert!(fetch(&api).is_err());
    assert_eq!(api.calls.get(), 1);
}

#[test]
fn fetch_rejects_duplicate_tags() {
    let api = FakeManager::new(&[], &[("gpu", "GPU"), ("gpu", "Other GPU")]);
    assert!(matches!(fetch(&api), Err(FetchError::Inconsistent(_))));
}

#[test]
fn cold_start_refresh_keeps_valid_tag() {
    let dir = tempdir().unwrap();
    let store = CacheStore::in_dir(dir.path());
    let api = FakeManager::new(&["render", "simulate"], &[("gpu", "GPU")]);
    let mut scene = scene(None, Some("gpu"));
    let mut status = String::new();

    assert!(store.get_cached().is_none());
    let report = refresh(&api, &store, &mut scene, &mut status);

    assert_eq!(report.text, "Flamenco version 3.6 found");
    assert_eq!(report.level, ReportLevel::Info);
    assert_eq!(status, report.text);
    assert_eq!(scene.worker_tag.get(), Some("gpu"));
    assert!(scene.job_type.is_unset());

    // Persisted to disk as well as cached in memory.
    assert!(store.path().exists());
    let cached = store.peek().unwrap();
    assert_eq!(cached.job_types().job_types.len(), 2);
    store.clear();
    assert_eq!(store.get_cached().unwrap().as_ref(), cached.as_ref());
}

#[test]
fn vanished_tag_is_cleared_with_warning() {
    let dir = tempdir().unwrap();
    let store = CacheStore::in_dir(dir.path());
    let api = FakeManager::new(&["render"], &[("gpu", "GPU")]);
    let mut scene = scene(Some("render"), Some("cpu-only"));
    let mut status = String::new();

    let report = refresh(&api, &store, &mut scene, &mut status);

    assert_eq!(
        report.text,
        "Tag 'cpu-only' no longer available, choose another one"
    );
    assert_eq!(report.level, ReportLevel::Warning);
    assert!(scene.worker_tag.is_unset());
    assert_eq!(scene.job_type.get(), Some("render"));
}

#[test]
fn all_tags_choice_survives_refresh() {
    let dir = tempdir().unwrap();
    let store = CacheStore::in_dir(dir.path());
    let api = FakeManager::new(&["render"], &[("gpu", "GPU")]);
    let mut scene = scene(Some("render"), Some(NO_SELECTION_ID));
    let mut status = String::new();

    let report = refresh(&api, &store, &mut scene, &mut status);

    assert_eq!(report.level, ReportLevel::Info);
    assert_eq!(report.text, "Flamenco version 3.6 found");
    assert_eq!(scene.worker_tag.get(), Some(NO_SELECTION_ID));
}

#[test]
fn last_cleared_selection_wins_the_report() {
    let dir = tempdir().unwrap();
    let store = CacheStore::in_dir(dir.path());
    let api = FakeManager::new(&["render"], &[("gpu", "GPU")]);
    let mut scene = scene(Some("bake"), Some("cpu-only"));
    let mut status = String::new();

    let report = refresh(&api, &store, &mut scene, &mut status);

    assert_eq!(
        report.text,
        "Tag 'cpu-only' no longer available, choose another one"
    );
    assert_eq!(report.level, ReportLevel::Warning);
    assert!(scene.job_type.is_unset());
    assert!(scene.worker_tag.is_unset());
}

#[test]
fn cleared_job_type_alone_is_reported() {
    let dir = tempdir().unwrap();
    let store = CacheStore::in_dir(dir.path());
    let api = FakeManager::new(&["render"], &[("gpu", "GPU")]);
    let mut scene = scene(Some("bake"), Some("gpu"));
    let mut status = String::new();

    let report = refresh(&api, &store, &mut scene, &mut status);

    assert_eq!(
        report.text,
        "Job type 'bake' no longer available, choose another one"
    );
    assert_eq!(scene.worker_tag.get(), Some("gpu"));
}

#[test]
fn unreachable_manager_leaves_cache_and_selections_alone() {
    let dir = tempdir().unwrap();
    let store = CacheStore::in_dir(dir.path());

    let good = FakeManager::new(&["render"], &[("gpu", "GPU")]);
    let mut status = String::new();
    refresh(&good, &store, &mut scene(None, None), &mut status);
    let before = store.peek().unwrap();
    let disk_before = std::fs::read(store.path()).unwrap();

    let down = FakeManager::new(&[], &[]).failing(Failure::JobTypes(
        TransportError::MaxRetries("Connection refused (os error 111)".into()),
    ));
    let mut scene = scene(Some("bake"), Some("cpu-only"));
    let report = refresh(&down, &store, &mut scene, &mut status);

    assert_eq!(report.text, "Manager cannot be reached");
    assert_eq!(report.level, ReportLevel::Error);
    assert_eq!(status, "Manager cannot be reached");
    assert_eq!(store.peek().unwrap().as_ref(), before.as_ref());
    assert_eq!(std::fs::read(store.path()).unwrap(), disk_before);
    // No reconciliation happened.
    assert_eq!(scene.job_type.get(), Some("bake"));
    assert_eq!(scene.worker_tag.get(), Some("cpu-only"));
}

#[test]
fn api_error_text_is_reported() {
    let dir = tempdir().unwrap();
    let store = CacheStore::in_dir(dir.path());
    let api = FakeManager::new(&[], &[]).failing(Failure::WorkerTags(TransportError::Api {
        status: 500,
        message: "internal error".into(),
    }));
    let mut status = STATUS_PENDING.to_string();

    let report = refresh(&api, &store, &mut SceneSelections::default(), &mut status);

    assert_eq!(report.text, "Manager cannot be reached: (500) internal error");
    assert_eq!(report.level, ReportLevel::Error);
    assert!(store.peek().is_none());
    assert!(!store.path().exists());
}

#[test]
fn corrupt_disk_cache_is_replaced_by_refresh() {
    let dir = tempdir().unwrap();
    let store = CacheStore::in_dir(dir.path());
    std::fs::write(store.path(), b"{\"job_types\": []}").unwrap();
    assert!(store.get_cached().is_none());

    let api = FakeManager::new(&["render"], &[]);
    let report = refresh(&api, &store, &mut SceneSelections::default(), &mut String::new());
    assert_eq!(report.level, ReportLevel::Info);

    let fresh = CacheStore::in_dir(dir.path());
    assert_eq!(fresh.get_cached().unwrap().job_types().job_types[0].name, "render");
}
