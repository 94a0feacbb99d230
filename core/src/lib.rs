//! Game logic for an arithmetic practice game: level play, time challenges,
//! skill tracks and a mistake notebook.

pub mod catalog;
pub mod classify;
pub mod error;
pub mod generator;
pub mod notebook;
pub mod progress;
pub mod question;
pub mod records;
pub mod session;
pub mod store;

pub use error::{GameError, GenerateError, StoreError};
pub use question::{parse_answer, NumberRange, Operation, OperationKind, Question};
pub use store::{MemoryStore, RecordStore, SortSpec, Stored};
