// Patch engine: resolves recommendation addresses, writes them into the document,
// and records every applied change in the append-only ledger.
// All mutation flows through `reducer::EditorState::dispatch`.

pub mod applier;
pub mod edits;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod reducer;
pub mod resolver;
