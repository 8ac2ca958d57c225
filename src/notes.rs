use serde::{Deserialize, Serialize};

use crate::controller::{CollectionController, CollectionKind};
use crate::error::ValidationError;
use crate::record::{now_timestamp, Record};

pub const NOTES_KEY: &str = "notes";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created: String,
    pub updated: String,
}

impl Record for Note {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteForm {
    pub title: String,
    pub content: String,
}

impl NoteForm {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

pub struct NoteInput {
    title: String,
    content: String,
}

pub struct Notes;

impl CollectionKind for Notes {
    type Record = Note;
    type Form = NoteForm;
    type Input = NoteInput;

    const KEY: &'static str = NOTES_KEY;
    const NOUN: &'static str = "note";
    const TITLE: &'static str = "Note";

    fn validate(form: &NoteForm) -> Result<NoteInput, ValidationError> {
        let title = form.title.trim();
        if title.is_empty() {
            return Err(ValidationError::new("title", "Please enter both title and content"));
        }
        let content = form.content.trim();
        if content.is_empty() {
            return Err(ValidationError::new(
                "content",
                "Please enter both title and content",
            ));
        }
        Ok(NoteInput {
            title: title.to_string(),
            content: content.to_string(),
        })
    }

    fn build(input: NoteInput, id: String, previous: Option<&Note>) -> Note {
        let now = now_timestamp();
        Note {
            id,
            title: input.title,
            content: input.content,
            created: previous
                .map(|note| note.created.clone())
                .unwrap_or_else(|| now.clone()),
            updated: now,
        }
    }

    fn to_form(record: &Note) -> NoteForm {
        NoteForm::new(record.title.as_str(), record.content.as_str())
    }
}

pub type NoteController = CollectionController<Notes>;

/// Case-insensitive match on title or content. An empty query matches all.
pub fn matching(query: &str) -> impl Fn(&Note) -> bool + Send + Sync + 'static {
    let needle = query.trim().to_lowercase();
    move |note: &Note| {
        needle.is_empty()
            || note.title.to_lowercase().contains(needle.as_str())
            || note.content.to_lowercase().contains(needle.as_str())
    }
}

impl CollectionController<Notes> {
    /// Applies the search box value; blank clears the filter.
    pub fn search(&mut self, query: &str) {
        if query.trim().is_empty() {
            self.clear_filter();
        } else {
            self.set_filter(matching(query));
        }
    }
}
