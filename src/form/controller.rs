use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::encoding::{FormData, UrlSearchParams};
use super::files::{FileInputEvent, FileList};
use super::names::{NameStrategy, generate_names};
use super::validation::{FieldLens, FieldValidator, FormConfig, FormModel};
use super::value::FieldValue;
use super::view::{FieldView, FormSnapshot};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for FormId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    pub name_strategy: NameStrategy,
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid multipart boundary: {0:?}")]
    InvalidBoundary(String),
}

pub type FormResult<T> = Result<T, FormError>;

pub(super) type ErasedValidator = Arc<dyn Any + Send + Sync>;
pub(super) type TypedValidator<T, L> = Arc<dyn FieldValidator<T, L>>;
type SubscriberFn<T> = Arc<dyn Fn(&FormSnapshot<T>) + Send + Sync>;

pub(super) struct FormState<T> {
    pub(super) values: T,
    pub(super) errors: BTreeMap<FieldKey, Option<String>>,
    pub(super) files: BTreeMap<FieldKey, FileList>,
    pub(super) file_text: BTreeMap<FieldKey, Vec<String>>,
    pub(super) revision: u64,
}

impl<T> FormState<T>
where
    T: FormModel,
{
    fn new(defaults: &T) -> Self {
        Self {
            values: defaults.clone(),
            errors: unset_errors::<T>(),
            files: BTreeMap::new(),
            file_text: BTreeMap::new(),
            revision: 0,
        }
    }
}

pub(super) struct FormInstance<T> {
    pub(super) id: FormId,
    pub(super) defaults: Arc<T>,
    pub(super) names: Arc<BTreeMap<FieldKey, String>>,
    validators: BTreeMap<FieldKey, ErasedValidator>,
    pub(super) state: RwLock<FormState<T>>,
    subscribers: RwLock<BTreeMap<u64, SubscriberFn<T>>>,
    next_subscriber: AtomicU64,
}

pub struct FormHandle<T> {
    pub(super) inner: Arc<FormInstance<T>>,
}

impl<T> Clone for FormHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Debug for FormHandle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormHandle")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

impl<T> FormHandle<T>
where
    T: FormModel,
{
    pub(super) fn new(defaults: T, config: &FormConfig<T>) -> Self {
        let id = FormId::next();
        let names = generate_names(T::field_keys(), config.options.name_strategy, id);
        let state = FormState::new(&defaults);
        tracing::debug!(form = %id, fields = T::field_keys().len(), "form instance created");
        Self {
            inner: Arc::new(FormInstance {
                id,
                defaults: Arc::new(defaults),
                names: Arc::new(names),
                validators: config.validators.clone(),
                state: RwLock::new(state),
                subscribers: RwLock::new(BTreeMap::new()),
                next_subscriber: AtomicU64::new(0),
            }),
        }
    }

    pub fn form_id(&self) -> FormId {
        self.inner.id
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn defaults(&self) -> &T {
        &self.inner.defaults
    }

    pub fn field<L>(&self, lens: L) -> FieldHandle<T, L>
    where
        L: FieldLens<T>,
    {
        FieldHandle {
            form: self.clone(),
            lens,
        }
    }

    pub fn name<L>(&self, lens: L) -> &str
    where
        L: FieldLens<T>,
    {
        self.inner
            .names
            .get(&lens.key())
            .map_or("", String::as_str)
    }

    pub fn revision(&self) -> FormResult<u64> {
        Ok(read_lock(&self.inner.state, "reading form revision")?.revision)
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<T>> {
        let state = read_lock(&self.inner.state, "creating form snapshot")?;
        Ok(self.snapshot_from(&state))
    }

    pub fn values(&self) -> FormResult<T> {
        Ok(read_lock(&self.inner.state, "reading form values")?
            .values
            .clone())
    }

    pub fn to_json(&self) -> FormResult<Value> {
        let state = read_lock(&self.inner.state, "serializing form to json")?;
        Ok(Value::Object(state.values.to_json_map()))
    }

    pub fn to_form_data(&self) -> FormResult<FormData> {
        let state = read_lock(&self.inner.state, "serializing form to form data")?;
        Ok(FormData::from_model(&state.values))
    }

    pub fn to_url_search_params(&self) -> FormResult<UrlSearchParams> {
        let state = read_lock(&self.inner.state, "serializing form to search params")?;
        Ok(UrlSearchParams::from_model(&state.values))
    }

    pub fn reset_all(&self) -> FormResult<()> {
        self.commit("resetting form", |state, defaults| {
            state.values = defaults.clone();
            state.errors = unset_errors::<T>();
            state.files.clear();
            state.file_text.clear();
        })?;
        tracing::debug!(form = %self.inner.id, "form reset to defaults");
        Ok(())
    }

    pub fn file_text<L>(&self, lens: L) -> FormResult<Option<Vec<String>>>
    where
        L: FieldLens<T>,
    {
        Ok(read_lock(&self.inner.state, "reading file text")?
            .file_text
            .get(&lens.key())
            .cloned())
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&FormSnapshot<T>) + Send + Sync + 'static,
    ) -> FormResult<Subscription> {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::SeqCst);
        write_lock(&self.inner.subscribers, "registering subscriber")?
            .insert(id, Arc::new(callback));

        let instance: Weak<FormInstance<T>> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(instance) = instance.upgrade() {
                let mut subscribers = match instance.subscribers.write() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                subscribers.remove(&id);
            }
        }))
    }

    pub fn subscriber_count(&self) -> FormResult<usize> {
        Ok(read_lock(&self.inner.subscribers, "counting subscribers")?.len())
    }

    pub(super) fn snapshot_from(&self, state: &FormState<T>) -> FormSnapshot<T> {
        FormSnapshot {
            form: self.clone(),
            values: state.values.clone(),
            errors: state.errors.clone(),
            revision: state.revision,
        }
    }

    fn commit<R>(
        &self,
        context: &'static str,
        mutate: impl FnOnce(&mut FormState<T>, &T) -> R,
    ) -> FormResult<R> {
        let (result, snapshot) = {
            let mut state = write_lock(&self.inner.state, context)?;
            let result = mutate(&mut state, &self.inner.defaults);
            state.revision = state.revision.wrapping_add(1);
            let listening =
                !read_lock(&self.inner.subscribers, "checking subscribers")?.is_empty();
            (result, listening.then(|| self.snapshot_from(&state)))
        };

        if let Some(snapshot) = snapshot {
            self.notify(&snapshot)?;
        }
        Ok(result)
    }

    fn notify(&self, snapshot: &FormSnapshot<T>) -> FormResult<()> {
        let subscribers = read_lock(&self.inner.subscribers, "notifying subscribers")?
            .values()
            .cloned()
            .collect::<Vec<_>>();
        tracing::trace!(
            form = %self.inner.id,
            revision = snapshot.revision,
            subscribers = subscribers.len(),
            "notifying form subscribers"
        );
        for subscriber in subscribers {
            subscriber(snapshot);
        }
        Ok(())
    }
}

pub struct FieldHandle<T, L> {
    form: FormHandle<T>,
    lens: L,
}

impl<T, L: Copy> Clone for FieldHandle<T, L> {
    fn clone(&self) -> Self {
        Self {
            form: self.form.clone(),
            lens: self.lens,
        }
    }
}

impl<T, L> Debug for FieldHandle<T, L>
where
    T: FormModel,
    L: FieldLens<T>,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldHandle")
            .field("form", &self.form.inner.id)
            .field("key", &self.lens.key())
            .finish()
    }
}

impl<T, L> PartialEq for FieldHandle<T, L>
where
    T: FormModel,
    L: FieldLens<T>,
{
    fn eq(&self, other: &Self) -> bool {
        self.same_target(other)
    }
}

impl<T, L> FieldHandle<T, L>
where
    T: FormModel,
    L: FieldLens<T>,
{
    pub fn key(&self) -> FieldKey {
        self.lens.key()
    }

    pub fn lens(&self) -> L {
        self.lens
    }

    pub fn form(&self) -> &FormHandle<T> {
        &self.form
    }

    pub fn same_target(&self, other: &Self) -> bool {
        self.form.ptr_eq(&other.form) && self.lens.key() == other.lens.key()
    }

    pub fn name(&self) -> &str {
        self.form.name(self.lens)
    }

    pub fn view(&self) -> FormResult<FieldView<T, L>> {
        Ok(self.form.snapshot()?.field(self.lens))
    }

    pub fn set(&self, value: L::Value) -> FormResult<()> {
        let verdict = self.run_validator(&value);
        self.form.commit("writing field value", |state, _| {
            self.write_value(state, value, verdict.clone());
        })?;
        self.trace_write(verdict);
        Ok(())
    }

    pub fn set_error(&self, error: Option<impl Into<String>>) -> FormResult<()> {
        let key = self.lens.key();
        let error = error.map(Into::into);
        self.form.commit("writing field error", |state, _| {
            state.errors.insert(key, error);
        })
    }

    pub fn clear_error(&self) -> FormResult<()> {
        self.set_error(None::<String>)
    }

    pub fn reset(&self) -> FormResult<()> {
        let key = self.lens.key();
        self.form.commit("resetting field", |state, defaults| {
            self.lens
                .set(&mut state.values, self.lens.get(defaults).clone());
            state.errors.insert(key, None);
            state.files.remove(&key);
            state.file_text.remove(&key);
        })
    }

    pub fn get_files(&self) -> FormResult<Option<FileList>> {
        Ok(read_lock(&self.form.inner.state, "reading field files")?
            .files
            .get(&self.lens.key())
            .cloned())
    }

    /// Applies a change event: the event text becomes the field value and any
    /// attached files are remembered for `get_files`.
    ///
    /// Text that does not parse as the field's value type leaves the value and
    /// error untouched; the files are still stored.
    pub fn handle_file_event(&self, event: FileInputEvent) -> FormResult<()> {
        let key = self.lens.key();
        let parsed = <L::Value as FieldValue>::parse_input(&event.value);
        if parsed.is_none() {
            tracing::debug!(
                form = %self.form.inner.id,
                field = %key,
                input = %event.value,
                "input text does not parse for field"
            );
        }
        if parsed.is_none() && event.files.is_none() {
            return Ok(());
        }

        let verdict = parsed.as_ref().and_then(|value| self.run_validator(value));
        self.form.commit("applying file input event", |state, _| {
            if let Some(value) = parsed {
                self.write_value(state, value, verdict.clone());
            }
            if let Some(files) = event.files {
                state.file_text.insert(key, files.names());
                state.files.insert(key, files);
            }
        })?;
        self.trace_write(verdict);
        Ok(())
    }

    // `None` when the field has no validator; validators run outside the
    // state lock.
    fn run_validator(&self, value: &L::Value) -> Option<Option<String>> {
        let validator = self
            .form
            .inner
            .validators
            .get(&self.lens.key())?
            .downcast_ref::<TypedValidator<T, L>>()?;
        Some(validator.validate(value, &self.form.inner.defaults))
    }

    fn write_value(&self, state: &mut FormState<T>, value: L::Value, verdict: Option<Option<String>>) {
        self.lens.set(&mut state.values, value);
        if let Some(error) = verdict {
            state.errors.insert(self.lens.key(), error);
        }
    }

    fn trace_write(&self, verdict: Option<Option<String>>) {
        let key = self.lens.key();
        tracing::trace!(form = %self.form.inner.id, field = %key, "field value written");
        if let Some(Some(error)) = verdict {
            tracing::debug!(form = %self.form.inner.id, field = %key, %error, "field failed validation");
        }
    }
}

#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn detach(mut self) {
        self.unsubscribe.take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

fn unset_errors<T: FormModel>() -> BTreeMap<FieldKey, Option<String>> {
    T::field_keys().iter().map(|key| (*key, None)).collect()
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
