mod documents;
mod render;

pub use documents::{SqliteDocumentSession, SqliteDocumentStore};
