use serde::{Deserialize, Serialize};

use crate::items::NO_SELECTION_ID;
use crate::model::ManagerSnapshot;

/// Which dynamic enumeration a selection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    JobType,
    WorkerTag,
}

impl SelectionKind {
    /// Name used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::JobType => "Job type",
            Self::WorkerTag => "Tag",
        }
    }

    /// Identifiers a selection of this kind may take in `snapshot`.
    ///
    /// Worker tags also accept [`NO_SELECTION_ID`], the "All" choice.
    pub fn candidates(self, snapshot: &ManagerSnapshot) -> Vec<&str> {
        match self {
            Self::JobType => snapshot
                .job_types()
                .job_types
                .iter()
                .map(|jt| jt.name.as_str())
                .collect(),
            Self::WorkerTag => std::iter::once(NO_SELECTION_ID)
                .chain(snapshot.worker_tags().tags.iter().map(|t| t.id.as_str()))
                .collect(),
        }
    }
}

/// The user's choice in one dynamic enumeration.
///
/// `None` is the unset state. An empty string is treated as unset too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(Option<String>);

impl Selection {
    pub fn new(id: impl Into<String>) -> Self {
        Self(Some(id.into()))
    }

    pub fn get(&self) -> Option<&str> {
        self.0.as_deref().filter(|id| !id.is_empty())
    }

    pub fn is_unset(&self) -> bool {
        self.get().is_none()
    }

    pub fn set(&mut self, id: impl Into<String>) {
        self.0 = Some(id.into());
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }
}

/// What happened to one selection during a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing was selected, so there was nothing to check.
    Unaffected,
    /// The previous choice still exists and was restored.
    Restored(String),
    /// The previous choice disappeared; the selection was cleared.
    Cleared { stale: String, message: String },
}

impl Reconciliation {
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Cleared { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Re-validates `old` (captured before the refresh) against fresh `candidates`.
///
/// The selection is re-assigned when `old` is still a candidate and cleared
/// when it is not.
pub fn reconcile<'a>(
    kind: SelectionKind,
    old: Option<&str>,
    candidates: impl IntoIterator<Item = &'a str>,
    selection: &mut Selection,
) -> Reconciliation {
    let Some(old) = old.filter(|id| !id.is_empty()) else {
        return Reconciliation::Unaffected;
    };

    if candidates.into_iter().any(|c| c == old) {
        selection.set(old);
        return Reconciliation::Restored(old.to_string());
    }

    selection.clear();
    Reconciliation::Cleared {
        stale: old.to_string(),
        message: format!(
            "{} '{}' no longer available, choose another one",
            kind.label(),
            old
        ),
    }
}
