// Job-match scoring: job analysis hydration, per-skill classification, the
// 0–100 match score and the skills panel report.
// Scores are never stored; they are re-derived from the document on every read.

pub mod analysis;
pub mod classifier;
pub mod handlers;
pub mod report;
pub mod score;
