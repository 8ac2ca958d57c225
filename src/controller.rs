//! Form-driven CRUD over one [`PersistedCollection`].
//!
//! A controller owns the form buffer for its module, the active view filter
//! and the render callback. Each module plugs in through [`CollectionKind`],
//! which supplies the storage key, validation rules and record assembly.

use std::sync::Arc;

use tracing::{debug, info};

use crate::collection::PersistedCollection;
use crate::error::{CollectionError, ValidationError};
use crate::gate::{ConfirmationGate, Prompt};
use crate::record::{new_id, Record};
use crate::store::KeyValueStore;

pub trait CollectionKind: Send + Sync + 'static {
    type Record: Record;
    /// Raw values as typed into the form.
    type Form: Clone + Default + Send + Sync + 'static;
    /// Form values that passed validation.
    type Input;

    /// Storage key for the whole collection.
    const KEY: &'static str;
    /// Lower-case name used in prompts, e.g. "work log".
    const NOUN: &'static str;
    /// Title-case name used in prompts, e.g. "Work Log".
    const TITLE: &'static str;

    fn validate(form: &Self::Form) -> Result<Self::Input, ValidationError>;

    /// Assembles the record to store. `previous` is the stored record when
    /// `id` is being re-saved; derived fields are computed here and frozen.
    fn build(input: Self::Input, id: String, previous: Option<&Self::Record>) -> Self::Record;

    fn to_form(record: &Self::Record) -> Self::Form;

    fn blank_form() -> Self::Form {
        Self::Form::default()
    }

    fn delete_prompt() -> Prompt {
        Prompt::new(
            format!("Delete {}", Self::TITLE),
            format!(
                "Are you sure you want to delete this {}? This action cannot be undone.",
                Self::NOUN
            ),
        )
        .confirm_label("Delete")
    }
}

/// A delete waiting in the app's [`ConfirmationGate`]. Only controllers can
/// create one, so removal always passes through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    collection: &'static str,
    id: String,
}

impl DeleteRequest {
    pub(crate) fn new(collection: &'static str, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn id(&self) -> &str {
        self.id.as_str()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormBuffer<F> {
    pub fields: F,
    editing: Option<String>,
}

impl<F> FormBuffer<F> {
    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_deref()
    }
}

pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
pub type Renderer<T> = Box<dyn FnMut(&[T]) + Send>;

pub struct CollectionController<K: CollectionKind> {
    collection: PersistedCollection<K::Record>,
    form: FormBuffer<K::Form>,
    filter: Option<Filter<K::Record>>,
    renderer: Option<Renderer<K::Record>>,
}

impl<K: CollectionKind> CollectionController<K> {
    pub fn open(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(PersistedCollection::open(store, K::KEY))
    }

    pub fn new(collection: PersistedCollection<K::Record>) -> Self {
        Self {
            collection,
            form: FormBuffer {
                fields: K::blank_form(),
                editing: None,
            },
            filter: None,
            renderer: None,
        }
    }

    pub fn collection(&self) -> &PersistedCollection<K::Record> {
        &self.collection
    }

    pub fn form(&self) -> &FormBuffer<K::Form> {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut K::Form {
        &mut self.form.fields
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.form.editing_id()
    }

    /// Validates `values`, upserts under the editing id (or a fresh one) and
    /// resets the form. Returns the id the record was stored under.
    ///
    /// On a validation or persistence failure the collection is unchanged and
    /// the form keeps `values` so the user can correct and retry.
    pub fn save(&mut self, values: K::Form) -> Result<String, CollectionError> {
        self.form.fields = values;
        let input = K::validate(&self.form.fields).map_err(|err| {
            debug!(key = K::KEY, field = err.field, "form rejected");
            err
        })?;
        let id = self.form.editing.clone().unwrap_or_else(new_id);
        let record = K::build(input, id.clone(), self.collection.find_by_id(id.as_str()));
        self.collection.upsert(record)?;
        info!(key = K::KEY, id = %id, "record saved");
        self.clear_form();
        self.refresh();
        Ok(id)
    }

    /// Saves whatever is currently in the form buffer.
    pub fn save_form(&mut self) -> Result<String, CollectionError> {
        let values = self.form.fields.clone();
        self.save(values)
    }

    /// Loads a stored record into the form. Unknown ids leave the form as is
    /// and return `false`.
    pub fn begin_edit(&mut self, id: &str) -> bool {
        let Some(record) = self.collection.find_by_id(id) else {
            debug!(key = K::KEY, id, "edit requested for missing record");
            return false;
        };
        self.form = FormBuffer {
            fields: K::to_form(record),
            editing: Some(id.to_string()),
        };
        true
    }

    pub fn clear_form(&mut self) {
        self.form = FormBuffer {
            fields: K::blank_form(),
            editing: None,
        };
    }

    /// Parks a delete of `id` in `gate`; nothing is removed until the gate is
    /// confirmed and the request handed to [`Self::apply_delete`].
    pub fn delete(&self, id: &str, gate: &mut ConfirmationGate<DeleteRequest>) {
        gate.request(DeleteRequest::new(K::KEY, id), K::delete_prompt());
    }

    /// Carries out a confirmed delete. Requests for another collection are
    /// ignored. A missing id is a silent no-op.
    pub fn apply_delete(&mut self, request: DeleteRequest) -> Result<bool, CollectionError> {
        if request.collection != K::KEY {
            return Ok(false);
        }
        let removed = self.collection.delete_by_id(request.id.as_str())?;
        if removed {
            info!(key = K::KEY, id = %request.id, "record deleted");
        }
        if self.form.editing.as_deref() == Some(request.id.as_str()) {
            self.clear_form();
        }
        self.refresh();
        Ok(removed)
    }

    pub fn set_filter(&mut self, predicate: impl Fn(&K::Record) -> bool + Send + Sync + 'static) {
        self.filter = Some(Box::new(predicate));
        self.refresh();
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
        self.refresh();
    }

    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    /// The filtered view over the stored order.
    pub fn visible(&self) -> Vec<K::Record> {
        match &self.filter {
            Some(predicate) => self
                .collection
                .list()
                .iter()
                .filter(|&record| predicate(record))
                .cloned()
                .collect(),
            None => self.collection.list().to_vec(),
        }
    }

    pub fn set_renderer(&mut self, renderer: impl FnMut(&[K::Record]) + Send + 'static) {
        self.renderer = Some(Box::new(renderer));
        self.refresh();
    }

    pub fn refresh(&mut self) {
        if self.renderer.is_none() {
            return;
        }
        let visible = self.visible();
        if let Some(render) = self.renderer.as_mut() {
            render(visible.as_slice());
        }
    }

    /// Re-reads the collection from the store and re-renders.
    pub fn reload(&mut self) {
        self.collection.reload();
        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    struct Tag {
        id: String,
        name: String,
        created: u32,
    }

    impl Record for Tag {
        fn id(&self) -> &str {
            self.id.as_str()
        }
    }

    struct Tags;

    impl CollectionKind for Tags {
        type Record = Tag;
        type Form = String;
        type Input = String;
        const KEY: &'static str = "tags";
        const NOUN: &'static str = "tag";
        const TITLE: &'static str = "Tag";

        fn validate(form: &String) -> Result<String, ValidationError> {
            let name = form.trim();
            if name.is_empty() {
                return Err(ValidationError::new("name", "Please enter a name"));
            }
            Ok(name.to_string())
        }

        fn build(input: String, id: String, previous: Option<&Tag>) -> Tag {
            Tag {
                id,
                name: input,
                created: previous.map(|p| p.created + 1).unwrap_or(0),
            }
        }

        fn to_form(record: &Tag) -> String {
            record.name.clone()
        }
    }

    fn controller() -> CollectionController<Tags> {
        CollectionController::open(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn invalid_form_mints_nothing() {
        let mut tags = controller();
        let err = tags.save("   ".to_string()).unwrap_err();
        assert!(err.is_validation());
        assert!(tags.collection().is_empty());
        assert_eq!(tags.form().fields, "   ");
        assert!(tags.editing_id().is_none());
    }

    #[test]
    fn save_then_edit_resaves_same_id() {
        let mut tags = controller();
        let id = tags.save("rust".to_string()).unwrap();
        assert_eq!(tags.form().fields, "");
        assert!(tags.begin_edit(&id));
        assert_eq!(tags.editing_id(), Some(id.as_str()));
        assert_eq!(tags.form().fields, "rust");
        let again = tags.save("rustlang".to_string()).unwrap();
        assert_eq!(again, id);
        assert_eq!(tags.collection().len(), 1);
        let stored = tags.collection().find_by_id(&id).unwrap();
        assert_eq!(stored.name, "rustlang");
        assert_eq!(stored.created, 1);
        assert!(tags.editing_id().is_none());
    }

    #[test]
    fn begin_edit_on_missing_id_is_noop() {
        let mut tags = controller();
        tags.form_mut().push_str("draft");
        assert!(!tags.begin_edit("missing"));
        assert_eq!(tags.form().fields, "draft");
    }

    #[test]
    fn delete_waits_for_gate() {
        let mut tags = controller();
        let mut gate = ConfirmationGate::new();
        let id = tags.save("a".to_string()).unwrap();
        tags.delete(&id, &mut gate);
        assert_eq!(tags.collection().len(), 1);
        assert_eq!(gate.pending().unwrap().title, "Delete Tag");

        gate.cancel();
        assert_eq!(tags.collection().len(), 1);

        tags.delete(&id, &mut gate);
        let request = gate.confirm().unwrap();
        assert!(tags.apply_delete(request).unwrap());
        assert!(tags.collection().is_empty());
    }

    #[test]
    fn delete_of_edited_record_clears_form() {
        let mut tags = controller();
        let mut gate = ConfirmationGate::new();
        let id = tags.save("a".to_string()).unwrap();
        tags.begin_edit(&id);
        tags.delete(&id, &mut gate);
        tags.apply_delete(gate.confirm().unwrap()).unwrap();
        assert!(tags.editing_id().is_none());
        assert_eq!(tags.form().fields, "");
    }

    #[test]
    fn foreign_requests_are_ignored() {
        let mut tags = controller();
        let id = tags.save("a".to_string()).unwrap();
        let foreign = DeleteRequest::new("notes", id.clone());
        assert!(!tags.apply_delete(foreign).unwrap());
        assert_eq!(tags.collection().len(), 1);
    }

    #[test]
    fn filter_is_a_pure_view() {
        let mut tags = controller();
        for name in ["alpha", "beta", "alphabet"] {
            tags.save(name.to_string()).unwrap();
        }
        let stored = tags.collection().list().to_vec();
        tags.set_filter(|tag| tag.name.starts_with("alpha"));
        assert_eq!(tags.visible().len(), 2);
        assert_eq!(tags.visible(), tags.visible());
        assert_eq!(tags.collection().list(), stored.as_slice());
        tags.clear_filter();
        assert_eq!(tags.visible(), stored);
    }

    #[test]
    fn renderer_sees_every_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut tags = controller();
        tags.set_renderer(move |visible| sink.lock().unwrap().push(visible.len()));
        tags.save("one".to_string()).unwrap();
        tags.save("two".to_string()).unwrap();
        tags.set_filter(|tag| tag.name == "one");
        tags.clear_filter();
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 1, 2]);
    }
}
