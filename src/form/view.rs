use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use serde_json::{Map, Value};

use super::controller::{FieldHandle, FieldKey, FormHandle, FormResult};
use super::encoding::{FormData, UrlSearchParams};
use super::files::{FileInputEvent, FileList};
use super::validation::{FieldLens, FormModel};

#[derive(Clone)]
pub struct FormSnapshot<T> {
    pub(super) form: FormHandle<T>,
    pub(super) values: T,
    pub(super) errors: BTreeMap<FieldKey, Option<String>>,
    pub(super) revision: u64,
}

impl<T> Debug for FormSnapshot<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSnapshot")
            .field("form", &self.form.inner.id)
            .field("values", &self.values)
            .field("errors", &self.errors)
            .field("revision", &self.revision)
            .finish()
    }
}

impl<T> FormSnapshot<T>
where
    T: FormModel,
{
    pub fn field<L>(&self, lens: L) -> FieldView<T, L>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        FieldView {
            current: lens.get(&self.values).clone(),
            default: lens.get(self.form.defaults()).clone(),
            error: self.errors.get(&key).cloned().flatten(),
            name: self.form.name(lens).to_string(),
            handle: self.form.field(lens),
        }
    }

    pub fn form(&self) -> &FormHandle<T> {
        &self.form
    }

    pub fn values(&self) -> &T {
        &self.values
    }

    pub fn defaults(&self) -> &T {
        self.form.defaults()
    }

    pub fn error(&self, key: FieldKey) -> Option<&str> {
        self.errors.get(&key).and_then(Option::as_deref)
    }

    pub fn errors(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        self.errors
            .iter()
            .filter_map(|(key, error)| error.as_deref().map(|error| (*key, error)))
    }

    pub fn is_valid(&self) -> bool {
        self.errors.values().all(Option::is_none)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.values.to_json_map())
    }

    pub fn to_form_data(&self) -> FormData {
        FormData::from_model(&self.values)
    }

    pub fn to_url_search_params(&self) -> UrlSearchParams {
        UrlSearchParams::from_model(&self.values)
    }

    pub fn reset_all(&self) -> FormResult<()> {
        self.form.reset_all()
    }
}

pub struct FieldView<T, L>
where
    L: FieldLens<T>,
{
    pub current: L::Value,
    pub default: L::Value,
    pub error: Option<String>,
    pub name: String,
    handle: FieldHandle<T, L>,
}

impl<T, L> Clone for FieldView<T, L>
where
    L: FieldLens<T>,
{
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
            default: self.default.clone(),
            error: self.error.clone(),
            name: self.name.clone(),
            handle: self.handle.clone(),
        }
    }
}

impl<T, L> Debug for FieldView<T, L>
where
    T: FormModel,
    L: FieldLens<T>,
    L::Value: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldView")
            .field("key", &self.handle.key())
            .field("current", &self.current)
            .field("default", &self.default)
            .field("error", &self.error)
            .field("name", &self.name)
            .finish()
    }
}

impl<T, L> FieldView<T, L>
where
    T: FormModel,
    L: FieldLens<T>,
{
    pub fn key(&self) -> FieldKey {
        self.handle.key()
    }

    pub fn handle(&self) -> &FieldHandle<T, L> {
        &self.handle
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.default
    }

    pub fn set(&self, value: L::Value) -> FormResult<()> {
        self.handle.set(value)
    }

    pub fn set_error(&self, error: Option<impl Into<String>>) -> FormResult<()> {
        self.handle.set_error(error)
    }

    pub fn clear_error(&self) -> FormResult<()> {
        self.handle.clear_error()
    }

    pub fn reset(&self) -> FormResult<()> {
        self.handle.reset()
    }

    pub fn get_files(&self) -> FormResult<Option<FileList>> {
        self.handle.get_files()
    }

    pub fn handle_file_event(&self, event: FileInputEvent) -> FormResult<()> {
        self.handle.handle_file_event(event)
    }
}

pub struct FormView<T> {
    snapshot: Option<FormSnapshot<T>>,
}

impl<T> Clone for FormView<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
        }
    }
}

impl<T> Debug for FormView<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormView")
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

impl<T> FormView<T>
where
    T: FormModel,
{
    pub(super) fn attached(snapshot: FormSnapshot<T>) -> Self {
        Self {
            snapshot: Some(snapshot),
        }
    }

    pub fn unattached() -> Self {
        Self { snapshot: None }
    }

    pub fn is_attached(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn snapshot(&self) -> Option<&FormSnapshot<T>> {
        self.snapshot.as_ref()
    }

    pub fn handle(&self) -> Option<&FormHandle<T>> {
        self.snapshot.as_ref().map(FormSnapshot::form)
    }

    pub fn field<L>(&self, lens: L) -> Option<FieldView<T, L>>
    where
        L: FieldLens<T>,
    {
        self.snapshot.as_ref().map(|snapshot| snapshot.field(lens))
    }

    pub fn reset_all(&self) -> FormResult<()> {
        match &self.snapshot {
            Some(snapshot) => snapshot.reset_all(),
            None => Ok(()),
        }
    }

    pub fn to_json(&self) -> Value {
        self.snapshot
            .as_ref()
            .map_or_else(|| Value::Object(Map::new()), FormSnapshot::to_json)
    }

    pub fn to_form_data(&self) -> FormData {
        self.snapshot
            .as_ref()
            .map(FormSnapshot::to_form_data)
            .unwrap_or_default()
    }

    pub fn to_url_search_params(&self) -> UrlSearchParams {
        self.snapshot
            .as_ref()
            .map(FormSnapshot::to_url_search_params)
            .unwrap_or_default()
    }
}

impl<T> Default for FormView<T>
where
    T: FormModel,
{
    fn default() -> Self {
        Self::unattached()
    }
}
