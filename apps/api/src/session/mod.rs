// Editing sessions: an in-memory store of documents under edit, and the HTTP
// handlers that drive them. Nothing here outlives the process.

pub mod handlers;
pub mod store;

pub use store::SessionStore;
