use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::fetch::{fetch, ManagerApi};
use crate::reconcile::{reconcile, Selection, SelectionKind};

/// Severity of a [`Report`], mirroring what a UI operator can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReportLevel {
    Info,
    Warning,
    Error,
}

impl ReportLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a refresh, ready to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub text: String,
    pub level: ReportLevel,
}

impl Report {
    pub fn new(level: ReportLevel, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }
}

/// Selections a scene holds for the Manager's dynamic enumerations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSelections {
    #[serde(default, skip_serializing_if = "Selection::is_unset")]
    pub job_type: Selection,
    #[serde(default, skip_serializing_if = "Selection::is_unset")]
    pub worker_tag: Selection,
}

/// Text shown in the status line while a refresh is running.
pub const STATUS_PENDING: &str = "...";

/// Fetches Manager info, caches and persists it, and re-validates the scene's
/// selections against it.
///
/// `status_ping` is set to [`STATUS_PENDING`] on entry and to the report text
/// on return. When the fetch fails the cache and the selections are left
/// alone. When several selections had to be cleared, the last one's warning
/// becomes the report.
pub fn refresh<A: ManagerApi + ?Sized>(
    api: &A,
    store: &CacheStore,
    scene: &mut SceneSelections,
    status_ping: &mut String,
) -> Report {
    *status_ping = STATUS_PENDING.to_string();

    // Remember the old values, they may have disappeared from the Manager.
    let old_job_type = scene.job_type.get().map(str::to_owned);
    let old_tag = scene.worker_tag.get().map(str::to_owned);

    let snapshot = match store.update(|| fetch(api)) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            let report = Report::new(ReportLevel::Error, e.to_string());
            *status_ping = report.text.clone();
            return report;
        }
    };

    if let Err(e) = store.save_to_disk(&snapshot) {
        warn!("could not save Flamenco Manager info: {e}");
    }

    let mut report = Report::new(ReportLevel::Info, snapshot.found_message());
    info!("{}", report.text);

    let outcomes = [
        reconcile(
            SelectionKind::JobType,
            old_job_type.as_deref(),
            SelectionKind::JobType.candidates(&snapshot),
            &mut scene.job_type,
        ),
        reconcile(
            SelectionKind::WorkerTag,
            old_tag.as_deref(),
            SelectionKind::WorkerTag.candidates(&snapshot),
            &mut scene.worker_tag,
        ),
    ];
    for warning in outcomes.iter().filter_map(|o| o.warning()) {
        report = Report::new(ReportLevel::Warning, warning);
    }

    *status_ping = report.text.clone();
    report
}
