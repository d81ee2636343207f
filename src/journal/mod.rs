//! Session Journal (C4): append-only persistence and rehydration.

mod reader;
mod types;
mod writer;

pub use reader::{load, LoadedSession};
pub use types::{ContentPart, JournalConfig, JournalMessage, JournalRecord, MessageContent, MessageRole};
pub use writer::JournalWriter;
