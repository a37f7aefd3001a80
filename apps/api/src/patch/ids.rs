use chrono::Utc;

use crate::cv::model::{Document, SectionBody};

/// Hands out synthetic `<kind>_<n>` ids for new items and categories.
///
/// The counter starts at the current Unix time in milliseconds (or above the largest
/// numeric suffix already in the document) and only ever increases, so an id is never
/// handed out twice within a session, even after the item carrying it is deleted.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: i64,
}

impl IdAllocator {
    /// Deterministic allocator for replays and tests.
    pub fn seeded(seed: i64) -> Self {
        Self { next: seed }
    }

    pub fn for_document(document: &Document) -> Self {
        let now = Utc::now().timestamp_millis();
        let highest = existing_ids(document)
            .filter_map(|id| id.rsplit_once('_'))
            .filter_map(|(_, suffix)| suffix.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            next: now.max(highest + 1),
        }
    }

    pub fn allocate(&mut self, kind: &str) -> String {
        let id = format!("{kind}_{}", self.next);
        self.next += 1;
        id
    }
}

fn existing_ids(document: &Document) -> impl Iterator<Item = &str> {
    document.sections.iter().flat_map(|section| {
        let ids: Vec<&str> = match &section.body {
            SectionBody::List { items, .. } => items.iter().map(|i| i.id.as_str()).collect(),
            SectionBody::NestedList { categories } => {
                categories.iter().map(|c| c.id.as_str()).collect()
            }
            _ => Vec::new(),
        };
        ids
    })
}
