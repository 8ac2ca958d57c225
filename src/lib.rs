//! Pocketdesk: notes, work logs and salary records kept in a local
//! key-value store, plus a few stateless calculators.
//!
//! Each record type lives in its own [`collection::PersistedCollection`]
//! under a fixed key, driven by a form-oriented
//! [`controller::CollectionController`]. Deletes go through a single
//! [`gate::ConfirmationGate`] owned by the [`workspace::Workspace`].

pub mod collection;
pub mod config;
pub mod controller;
pub mod crypto;
pub mod error;
pub mod gate;
pub mod notes;
pub mod record;
pub mod salary;
pub mod store;
pub mod tools;
pub mod view;
pub mod work_log;
pub mod workspace;

pub use collection::PersistedCollection;
pub use config::AppConfig;
pub use controller::{CollectionController, CollectionKind, DeleteRequest};
pub use error::{CollectionError, ConfigError, StoreError, ToolError, ValidationError};
pub use gate::{ConfirmationGate, Prompt};
pub use notes::{Note, NoteForm};
pub use salary::{SalaryForm, SalaryRecord};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use work_log::{WorkLog, WorkLogForm};
pub use workspace::Workspace;
