#![allow(dead_code)]

//! Change Ledger: the append-only record of every applied mutation.
//!
//! CRITICAL: entries are never removed. `undo` only flips `applied` to `false`; it is a
//! display filter and leaves the document as it is. `revert` is the separate,
//! compensating operation: it restores the section snapshot taken before the change.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cv::model::EditableSection;
use crate::patch::applier::AppliedPatch;
use crate::patch::error::PatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    FieldUpdated,
    ItemAdded,
    ItemRemoved,
    CategoryAdded,
    SkillAdded,
    SkillRemoved,
    SkillUpdated,
    AchievementAdded,
    AchievementEdited,
    AchievementRemoved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub section: String,
    pub description: String,
    pub applied: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangeLedger {
    entries: Vec<LedgerEntry>,
    #[serde(skip)]
    snapshots: HashMap<Uuid, EditableSection>,
    #[serde(skip)]
    reverted: HashSet<Uuid>,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an `applied: true` entry for a successful write and keeps the
    /// pre-write section for a later revert.
    pub fn record(&mut self, patch: AppliedPatch) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.push(LedgerEntry {
            id,
            kind: patch.kind,
            section: patch.section_id,
            description: patch.description,
            applied: true,
            created_at: Utc::now(),
        });
        self.snapshots.insert(id, patch.before);
        id
    }

    /// Flag-only undo. The entry stays in the ledger; the document is not touched.
    pub fn undo(&mut self, entry_id: Uuid) -> Result<&LedgerEntry, PatchError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or(PatchError::UnknownEntry(entry_id))?;
        entry.applied = false;
        Ok(entry)
    }

    /// The section snapshot to restore for reverting `entry_id`.
    ///
    /// Refused when any later, not-yet-reverted entry touched the same section, since
    /// restoring would also wipe that later change. Flag-only undone entries still
    /// count: their mutation is still in the document.
    pub fn revert_snapshot(&self, entry_id: Uuid) -> Result<&EditableSection, PatchError> {
        let position = self
            .entries
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or(PatchError::UnknownEntry(entry_id))?;
        if self.reverted.contains(&entry_id) {
            return Err(PatchError::AlreadyReverted(entry_id));
        }
        let section = &self.entries[position].section;
        if let Some(blocking) = self.entries[position + 1..]
            .iter()
            .find(|e| &e.section == section && !self.reverted.contains(&e.id))
        {
            return Err(PatchError::RevertBlocked {
                entry: entry_id,
                blocking: blocking.id,
            });
        }
        self.snapshots
            .get(&entry_id)
            .ok_or(PatchError::UnknownEntry(entry_id))
    }

    /// Marks an entry reverted once its snapshot has been restored. The snapshot is
    /// dropped: a reverted entry can never be reverted again.
    ///
    /// Snapshots of blocked entries are kept, since reverting the blocking change
    /// unblocks them.
    pub fn mark_reverted(&mut self, entry_id: Uuid) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == entry_id) {
            entry.applied = false;
            self.reverted.insert(entry_id);
            self.snapshots.remove(&entry_id);
        }
    }

    /// Number of pre-change snapshots still held for a possible revert.
    pub fn retained_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn get(&self, entry_id: Uuid) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.id == entry_id)
    }

    /// Entries still shown as applied.
    pub fn applied(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(|e| e.applied)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
