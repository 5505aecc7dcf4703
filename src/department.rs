//! Department domain model
//!
//! A `Department` is one node of the catalog taxonomy as seen during a sync
//! pass. Parents are held as shared read-only back-references so a node can
//! be walked up to its root; nodes never link to their children.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{NotSet, Set};

use crate::entity::department;
use crate::error::{AppError, AppResult};

/// Separator between ancestor ids in an absolute id
pub const ID_SEPARATOR: char = '_';

#[derive(Clone, Debug, PartialEq)]
pub struct Department {
    /// Absolute id, e.g. "3944_401121_134532"
    pub id: String,
    pub title: String,
    /// Absolute path, e.g. "Auto & Tires/Auto Body/Auto Paint"
    pub path: String,
    /// Direct ancestor, `None` for root departments
    pub parent: Option<Arc<Department>>,
    pub conflict_ids: Option<Vec<String>>,
    /// Last known good sync time
    pub updated_at: DateTime<Utc>,
}

impl Department {
    pub fn new(id: impl Into<String>, title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            path: path.into(),
            parent: None,
            conflict_ids: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_parent(mut self, parent: Option<Arc<Department>>) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_conflict_ids(mut self, ids: Vec<String>) -> Self {
        self.conflict_ids = Some(ids);
        self
    }

    /// Reject an empty primary key. Blank names and paths are stored as given.
    pub fn validate(&self) -> AppResult<()> {
        if self.id.trim().is_empty() {
            return Err(AppError::invalid_response("department id is empty"));
        }
        Ok(())
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_deref().map(|p| p.id.as_str())
    }

    /// Last segment of the absolute id
    pub fn relative_id(&self) -> &str {
        self.id.rsplit(ID_SEPARATOR).next().unwrap_or(&self.id)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Number of ancestors (0 for roots)
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// Walk from the direct parent up to the root
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: self.parent.as_deref(),
        }
    }

    /// Root first, then each descendant down to `self`. This is the order
    /// rows must be written in when the store enforces `parent_id`.
    pub fn lineage(&self) -> Vec<&Department> {
        let mut chain: Vec<&Department> = self.ancestors().collect();
        chain.reverse();
        chain.push(self);
        chain
    }

    pub fn to_active_model(&self) -> department::ActiveModel {
        department::ActiveModel {
            id: Set(self.id.clone()),
            title: Set(self.title.clone()),
            path: Set(self.path.clone()),
            parent_id: Set(self.parent_id().map(str::to_string)),
            conflict_ids: Set(self.conflict_ids.clone().map(Into::into)),
            updated_at: Set(self.updated_at),
        }
    }
}

/// Iterator over a department's ancestors, nearest first
pub struct Ancestors<'a> {
    next: Option<&'a Department>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Department;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}

/// Column changes for an existing department row. `updated_at` is always
/// refreshed and is not part of the change set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DepartmentUpdate {
    pub title: Option<String>,
    pub path: Option<String>,
    /// `Some(None)` clears the parent
    pub parent_id: Option<Option<String>>,
    /// `Some(None)` clears the list
    pub conflict_ids: Option<Option<Vec<String>>>,
}

impl DepartmentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn parent_id(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn conflict_ids(mut self, ids: Option<Vec<String>>) -> Self {
        self.conflict_ids = Some(ids);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.path.is_none()
            && self.parent_id.is_none()
            && self.conflict_ids.is_none()
    }

    /// Active model touching only the requested columns plus `updated_at`
    pub(crate) fn into_active_model(self, now: DateTime<Utc>) -> department::ActiveModel {
        department::ActiveModel {
            id: NotSet,
            title: self.title.map_or(NotSet, Set),
            path: self.path.map_or(NotSet, Set),
            parent_id: self.parent_id.map_or(NotSet, Set),
            conflict_ids: self
                .conflict_ids
                .map_or(NotSet, |ids| Set(ids.map(Into::into))),
            updated_at: Set(now),
        }
    }
}
