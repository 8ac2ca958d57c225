use serde::{Deserialize, Serialize};

use crate::controller::{CollectionController, CollectionKind};
use crate::error::ValidationError;
use crate::record::{now_timestamp, Record};

pub const WORK_LOGS_KEY: &str = "workLogs";

const INVALID_ENTRY: &str = "Please fill all required fields with valid values";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkLog {
    pub id: String,
    pub date: String,
    pub hours: f64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub created: String,
}

impl Record for WorkLog {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkLogForm {
    pub date: String,
    pub hours: String,
    pub title: String,
    pub description: String,
}

impl Default for WorkLogForm {
    fn default() -> Self {
        Self {
            date: crate::tools::today_string(),
            hours: String::new(),
            title: String::new(),
            description: String::new(),
        }
    }
}

impl WorkLogForm {
    pub fn new(date: impl Into<String>, hours: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            hours: hours.into(),
            title: title.into(),
            description: String::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

pub struct WorkLogInput {
    date: String,
    hours: f64,
    title: String,
    description: String,
}

pub struct WorkLogs;

impl CollectionKind for WorkLogs {
    type Record = WorkLog;
    type Form = WorkLogForm;
    type Input = WorkLogInput;

    const KEY: &'static str = WORK_LOGS_KEY;
    const NOUN: &'static str = "work log";
    const TITLE: &'static str = "Work Log";

    fn validate(form: &WorkLogForm) -> Result<WorkLogInput, ValidationError> {
        let date = form.date.trim();
        if date.is_empty() {
            return Err(ValidationError::new("date", INVALID_ENTRY));
        }
        let title = form.title.trim();
        if title.is_empty() {
            return Err(ValidationError::new("title", INVALID_ENTRY));
        }
        let hours = match form.hours.trim().parse::<f64>() {
            Ok(hours) if hours.is_finite() && hours > 0.0 => hours,
            _ => return Err(ValidationError::new("hours", INVALID_ENTRY)),
        };
        Ok(WorkLogInput {
            date: date.to_string(),
            hours,
            title: title.to_string(),
            description: form.description.trim().to_string(),
        })
    }

    fn build(input: WorkLogInput, id: String, previous: Option<&WorkLog>) -> WorkLog {
        WorkLog {
            id,
            date: input.date,
            hours: input.hours,
            title: input.title,
            description: input.description,
            created: previous
                .map(|log| log.created.clone())
                .unwrap_or_else(now_timestamp),
        }
    }

    fn to_form(record: &WorkLog) -> WorkLogForm {
        WorkLogForm {
            date: record.date.clone(),
            hours: record.hours.to_string(),
            title: record.title.clone(),
            description: record.description.clone(),
        }
    }
}

pub type WorkLogController = CollectionController<WorkLogs>;

pub fn on_date(date: &str) -> impl Fn(&WorkLog) -> bool + Send + Sync + 'static {
    let date = date.trim().to_string();
    move |log: &WorkLog| log.date == date
}

impl CollectionController<WorkLogs> {
    /// Applies the date picker value; blank clears the filter.
    pub fn filter_date(&mut self, date: &str) {
        if date.trim().is_empty() {
            self.clear_filter();
        } else {
            self.set_filter(on_date(date));
        }
    }

    pub fn visible_hours(&self) -> f64 {
        self.visible().iter().map(|log| log.hours).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn logs() -> WorkLogController {
        WorkLogController::open(Arc::new(MemoryStore::new()))
    }

    fn field_of(form: WorkLogForm) -> &'static str {
        WorkLogs::validate(&form).err().map(|err| err.field).unwrap_or("ok")
    }

    #[test]
    fn hours_must_be_positive_finite_number() {
        assert_eq!(field_of(WorkLogForm::new("2024-01-10", "0", "x")), "hours");
        assert_eq!(field_of(WorkLogForm::new("2024-01-10", "-2", "x")), "hours");
        assert_eq!(field_of(WorkLogForm::new("2024-01-10", "abc", "x")), "hours");
        assert_eq!(field_of(WorkLogForm::new("2024-01-10", "inf", "x")), "hours");
        assert_eq!(field_of(WorkLogForm::new("2024-01-10", "NaN", "x")), "hours");
        assert_eq!(field_of(WorkLogForm::new("2024-01-10", "0.25", "x")), "ok");
    }

    #[test]
    fn date_and_title_are_required() {
        assert_eq!(field_of(WorkLogForm::new("", "1", "x")), "date");
        assert_eq!(field_of(WorkLogForm::new("2024-01-10", "1", " ")), "title");
    }

    #[test]
    fn blank_form_defaults_date_to_today() {
        let logs = logs();
        assert_eq!(logs.form().fields.date, crate::tools::today_string());
        assert!(logs.form().fields.hours.is_empty());
    }

    #[test]
    fn edit_round_trips_form_values() {
        let mut logs = logs();
        let id = logs
            .save(WorkLogForm::new("2024-02-01", "7.5", "Ops").description(" on call "))
            .unwrap();
        assert!(logs.begin_edit(&id));
        assert_eq!(
            logs.form().fields,
            WorkLogForm::new("2024-02-01", "7.5", "Ops").description("on call")
        );
    }

    #[test]
    fn date_filter_selects_exact_day() {
        let mut logs = logs();
        logs.save(WorkLogForm::new("2024-01-10", "8", "a")).unwrap();
        logs.save(WorkLogForm::new("2024-01-11", "2", "b")).unwrap();
        logs.save(WorkLogForm::new("2024-01-10", "1.5", "c")).unwrap();

        logs.filter_date("2024-01-10");
        assert_eq!(logs.visible().len(), 2);
        assert_eq!(logs.visible_hours(), 9.5);

        logs.filter_date("");
        assert_eq!(logs.visible().len(), 3);
        assert_eq!(logs.collection().len(), 3);
    }

    #[test]
    fn legacy_entries_without_description_load() {
        let store = Arc::new(MemoryStore::new());
        crate::store::KeyValueStore::set(
            store.as_ref(),
            WORK_LOGS_KEY,
            r#"[{"id":"1","date":"2024-01-10","hours":8,"title":"t","created":"c"}]"#,
        )
        .unwrap();
        let logs = WorkLogController::open(store);
        assert_eq!(logs.collection().list()[0].hours, 8.0);
        assert_eq!(logs.collection().list()[0].description, "");
    }
}
