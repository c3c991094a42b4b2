//! Items for the UI's dynamic job type and worker tag enumerations.

use crate::model::ManagerSnapshot;

/// Identifier of the "nothing specific" item.
pub const NO_SELECTION_ID: &str = "-";

/// One entry of a dynamic enumeration: identifier, display name, tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumItem {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl EnumItem {
    fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Worker tag choices. "All" comes first and means no tag restriction.
pub fn worker_tag_items(snapshot: Option<&ManagerSnapshot>) -> Vec<EnumItem> {
    let Some(snapshot) = snapshot else {
        return vec![EnumItem::new(
            NO_SELECTION_ID,
            "-tags unknown-",
            "Refresh to load the available Worker tags from the Manager",
        )];
    };

    let mut items = vec![EnumItem::new(
        NO_SELECTION_ID,
        "All",
        "No specific tag assigned, any worker can handle this job",
    )];
    items.extend(snapshot.worker_tags().tags.iter().map(|tag| {
        EnumItem::new(&tag.id, &tag.name, tag.description.as_deref().unwrap_or(""))
    }));
    items
}

/// Job type choices, in Manager order.
pub fn job_type_items(snapshot: Option<&ManagerSnapshot>) -> Vec<EnumItem> {
    let Some(snapshot) = snapshot else {
        return vec![EnumItem::new(
            NO_SELECTION_ID,
            "-job types unknown-",
            "Refresh to load the available job types from the Manager",
        )];
    };

    snapshot
        .job_types()
        .job_types
        .iter()
        .map(|jt| EnumItem::new(&jt.name, &jt.label, jt.description.as_deref().unwrap_or("")))
        .collect()
}
