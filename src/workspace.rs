//! Wires the three collections, the shared confirmation gate and view state
//! onto one store.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::AppConfig;
use crate::controller::DeleteRequest;
use crate::error::{CollectionError, ConfigError};
use crate::gate::{ConfirmationGate, Prompt};
use crate::notes::{NoteController, NOTES_KEY};
use crate::salary::{SalaryController, SALARY_RECORDS_KEY};
use crate::store::KeyValueStore;
use crate::view::{Section, Theme, ViewState};
use crate::work_log::{WorkLogController, WORK_LOGS_KEY};

pub struct Workspace {
    store: Arc<dyn KeyValueStore>,
    pub notes: NoteController,
    pub work_logs: WorkLogController,
    pub salary: SalaryController,
    pub view: ViewState,
    gate: ConfirmationGate<DeleteRequest>,
}

/// What a confirmed delete did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmed {
    pub collection: &'static str,
    pub id: String,
    pub removed: bool,
}

impl Workspace {
    pub fn open(config: &AppConfig) -> Result<Self, ConfigError> {
        let store = config.build_store()?;
        Ok(Self::with_store(store, config.view.default_theme))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>, default_theme: Theme) -> Self {
        let workspace = Self {
            notes: NoteController::open(store.clone()),
            work_logs: WorkLogController::open(store.clone()),
            salary: SalaryController::open(store.clone()),
            view: ViewState::load(store.clone(), default_theme),
            gate: ConfirmationGate::new(),
            store,
        };
        info!(
            notes = workspace.notes.collection().len(),
            work_logs = workspace.work_logs.collection().len(),
            salary_records = workspace.salary.collection().len(),
            "workspace opened"
        );
        workspace
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn edit_note(&mut self, id: &str) -> bool {
        let found = self.notes.begin_edit(id);
        if found {
            self.view.switch_to(Section::Notepad);
        }
        found
    }

    pub fn edit_work_log(&mut self, id: &str) -> bool {
        let found = self.work_logs.begin_edit(id);
        if found {
            self.view.switch_to(Section::WorkFile);
        }
        found
    }

    pub fn edit_salary(&mut self, id: &str) -> bool {
        let found = self.salary.begin_edit(id);
        if found {
            self.view.switch_to(Section::Salary);
        }
        found
    }

    pub fn request_note_delete(&mut self, id: &str) {
        self.notes.delete(id, &mut self.gate);
    }

    pub fn request_work_log_delete(&mut self, id: &str) {
        self.work_logs.delete(id, &mut self.gate);
    }

    pub fn request_salary_delete(&mut self, id: &str) {
        self.salary.delete(id, &mut self.gate);
    }

    pub fn pending(&self) -> Option<&Prompt> {
        self.gate.pending()
    }

    pub fn gate(&self) -> &ConfirmationGate<DeleteRequest> {
        &self.gate
    }

    /// Runs the pending delete, if any, against the collection it targets.
    pub fn confirm(&mut self) -> Result<Option<Confirmed>, CollectionError> {
        let Some(request) = self.gate.confirm() else {
            return Ok(None);
        };
        let collection = request.collection();
        let id = request.id().to_string();
        let removed = match collection {
            NOTES_KEY => self.notes.apply_delete(request)?,
            WORK_LOGS_KEY => self.work_logs.apply_delete(request)?,
            SALARY_RECORDS_KEY => self.salary.apply_delete(request)?,
            other => {
                debug!(collection = other, "confirmed delete for unknown collection");
                false
            }
        };
        Ok(Some(Confirmed {
            collection,
            id,
            removed,
        }))
    }

    pub fn cancel(&mut self) {
        self.gate.cancel();
    }

    /// Re-reads every collection and the theme from the store.
    pub fn reload(&mut self) {
        self.notes.reload();
        self.work_logs.reload();
        self.salary.reload();
        let theme = self.view.theme();
        let section = self.view.section();
        self.view = ViewState::load(self.store.clone(), theme);
        self.view.switch_to(section);
    }
}
