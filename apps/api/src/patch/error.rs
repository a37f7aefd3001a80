use thiserror::Error;
use uuid::Uuid;

/// Why a single action did not change the document.
///
/// None of these are fatal: the reducer reports them as a skipped outcome and moves
/// on to the next action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatchError {
    #[error("no section answers to '{0}'")]
    SectionNotFound(String),

    #[error("section '{section}' has no target for field '{field}'")]
    FieldNotFound { section: String, field: String },

    #[error("index {index} is out of range for '{section}' ({len} entries)")]
    IndexOutOfRange {
        section: String,
        index: usize,
        len: usize,
    },

    #[error("malformed payload for '{section}': {message}")]
    MalformedPayload { section: String, message: String },

    #[error("'{skill}' is already in the CV")]
    DuplicateSkill { skill: String },

    #[error("'{skill}' is not in the CV")]
    SkillNotFound { skill: String },

    #[error("ledger entry {0} does not exist")]
    UnknownEntry(Uuid),

    #[error("ledger entry {0} has already been reverted")]
    AlreadyReverted(Uuid),

    #[error("ledger entry {entry} cannot be reverted: later change {blocking} touched the same section")]
    RevertBlocked { entry: Uuid, blocking: Uuid },
}
