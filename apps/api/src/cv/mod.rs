// CV document layer: typed section model, hydration from analysis output,
// upstream recommendations, and the flat submission serialization.

pub mod hydrate;
pub mod model;
pub mod recommendation;
pub mod submission;
