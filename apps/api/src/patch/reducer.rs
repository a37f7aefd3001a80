#![allow(dead_code)]

//! Editor reducer: the single entry point for every document mutation.
//!
//! `EditorState::dispatch` takes one [`Action`] and applies it in full before the next
//! one is looked at, so the document (and any score derived from it) always reflects
//! exactly the actions dispatched so far, in order. Failures never abort: each one is
//! reported as a `Skipped` outcome and produces no ledger entry.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cv::model::{Document, DEFAULT_ARRAY_FIELD};
use crate::cv::recommendation::Recommendation;
use crate::patch::applier::{apply_recommendation, AppliedPatch};
use crate::patch::edits;
use crate::patch::error::PatchError;
use crate::patch::ids::IdAllocator;
use crate::patch::ledger::ChangeLedger;

fn default_array_field() -> String {
    DEFAULT_ARRAY_FIELD.to_string()
}

/// Everything a user (or upstream analysis) can do to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    ApplyRecommendation {
        recommendation: Recommendation,
    },
    ApplyBatch {
        recommendations: Vec<Recommendation>,
    },
    AddSkill {
        skill: String,
        #[serde(default)]
        category: Option<String>,
    },
    RemoveSkill {
        skill: String,
    },
    AddAchievement {
        section: String,
        item: usize,
        #[serde(default = "default_array_field")]
        field: String,
        text: String,
    },
    EditAchievement {
        section: String,
        item: usize,
        #[serde(default = "default_array_field")]
        field: String,
        index: usize,
        text: String,
    },
    RemoveAchievement {
        section: String,
        item: usize,
        #[serde(default = "default_array_field")]
        field: String,
        index: usize,
    },
    AddItem {
        section: String,
    },
    RemoveItem {
        section: String,
        item: usize,
    },
    /// Flag-only: hides the entry as applied, leaves the document alone.
    Undo {
        entry_id: Uuid,
    },
    /// Compensating: restores the section as it was before the entry's change.
    Revert {
        entry_id: Uuid,
    },
}

/// Result of one action (or one recommendation of a batch).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Applied { entry_id: Uuid },
    Undone { entry_id: Uuid },
    Reverted { entry_id: Uuid },
    Skipped { reason: String },
}

impl ActionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied { .. })
    }
}

/// A document together with its ledger and id allocator.
#[derive(Debug, Clone)]
pub struct EditorState {
    pub document: Document,
    pub ledger: ChangeLedger,
    ids: IdAllocator,
}

impl EditorState {
    pub fn new(document: Document) -> Self {
        let ids = IdAllocator::for_document(&document);
        Self::with_ids(document, ids)
    }

    /// Fixed id seed, so replaying the same actions yields the same document.
    pub fn seeded(document: Document, seed: i64) -> Self {
        Self::with_ids(document, IdAllocator::seeded(seed))
    }

    fn with_ids(document: Document, ids: IdAllocator) -> Self {
        Self {
            document,
            ledger: ChangeLedger::new(),
            ids,
        }
    }

    /// Applies one action. A batch yields one outcome per recommendation, in order.
    pub fn dispatch(&mut self, action: Action) -> Vec<ActionOutcome> {
        match action {
            Action::ApplyRecommendation { recommendation } => {
                vec![self.apply_one(&recommendation)]
            }
            Action::ApplyBatch { recommendations } => {
                let outcomes: Vec<_> = recommendations.iter().map(|r| self.apply_one(r)).collect();
                let applied = outcomes.iter().filter(|o| o.is_applied()).count();
                info!(
                    "Applied {applied} of {} recommendations",
                    recommendations.len()
                );
                outcomes
            }
            Action::AddSkill { skill, category } => {
                let result = edits::add_skill(
                    &mut self.document,
                    &skill,
                    category.as_deref(),
                    &mut self.ids,
                );
                vec![self.commit(result)]
            }
            Action::RemoveSkill { skill } => {
                let result = edits::remove_skill(&mut self.document, &skill);
                vec![self.commit(result)]
            }
            Action::AddAchievement {
                section,
                item,
                field,
                text,
            } => {
                let result =
                    edits::add_array_entry(&mut self.document, &section, item, &field, &text);
                vec![self.commit(result)]
            }
            Action::EditAchievement {
                section,
                item,
                field,
                index,
                text,
            } => {
                let result = edits::edit_array_entry(
                    &mut self.document,
                    &section,
                    item,
                    &field,
                    index,
                    &text,
                );
                vec![self.commit(result)]
            }
            Action::RemoveAchievement {
                section,
                item,
                field,
                index,
            } => {
                let result =
                    edits::remove_array_entry(&mut self.document, &section, item, &field, index);
                vec![self.commit(result)]
            }
            Action::AddItem { section } => {
                let result = edits::add_item(&mut self.document, &section, &mut self.ids);
                vec![self.commit(result)]
            }
            Action::RemoveItem { section, item } => {
                let result = edits::remove_item(&mut self.document, &section, item);
                vec![self.commit(result)]
            }
            Action::Undo { entry_id } => vec![match self.ledger.undo(entry_id) {
                Ok(_) => ActionOutcome::Undone { entry_id },
                Err(e) => skipped(e),
            }],
            Action::Revert { entry_id } => vec![match self.revert(entry_id) {
                Ok(()) => ActionOutcome::Reverted { entry_id },
                Err(e) => skipped(e),
            }],
        }
    }

    fn apply_one(&mut self, recommendation: &Recommendation) -> ActionOutcome {
        let result = apply_recommendation(&mut self.document, recommendation, &mut self.ids);
        if let Err(e) = &result {
            debug!("Recommendation {} not applied: {e}", recommendation.id);
        }
        self.commit(result)
    }

    fn commit(&mut self, result: Result<AppliedPatch, PatchError>) -> ActionOutcome {
        match result {
            Ok(patch) => {
                debug!("Applied change to '{}': {}", patch.section_id, patch.description);
                ActionOutcome::Applied {
                    entry_id: self.ledger.record(patch),
                }
            }
            Err(e) => skipped(e),
        }
    }

    fn revert(&mut self, entry_id: Uuid) -> Result<(), PatchError> {
        let snapshot = self.ledger.revert_snapshot(entry_id)?.clone();
        match self
            .document
            .sections
            .iter_mut()
            .find(|s| s.id == snapshot.id)
        {
            Some(section) => *section = snapshot,
            None => return Err(PatchError::SectionNotFound(snapshot.id)),
        }
        self.ledger.mark_reverted(entry_id);
        info!("Reverted ledger entry {entry_id}");
        Ok(())
    }
}

fn skipped(error: PatchError) -> ActionOutcome {
    match &error {
        PatchError::MalformedPayload { .. } => warn!("Dropping change: {error}"),
        _ => debug!("Skipping change: {error}"),
    }
    ActionOutcome::Skipped {
        reason: error.to_string(),
    }
}

/// Pure reducer form: `(state, action) -> (state', outcomes)`.
pub fn reduce(mut state: EditorState, action: Action) -> (EditorState, Vec<ActionOutcome>) {
    let outcomes = state.dispatch(action);
    (state, outcomes)
}

/// Replays actions in order from a fresh, seeded state.
pub fn replay(document: Document, seed: i64, actions: impl IntoIterator<Item = Action>) -> EditorState {
    actions
        .into_iter()
        .fold(EditorState::seeded(document, seed), |state, action| {
            reduce(state, action).0
        })
}
