use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::controller::{ErasedValidator, FieldKey, FormOptions, TypedValidator};
use super::names::NameStrategy;
use super::value::FieldValue;

pub trait FieldLens<T>: Copy + Send + Sync + 'static {
    type Value: FieldValue + Clone + PartialEq;

    fn key(self) -> FieldKey;
    fn get<'a>(self, model: &'a T) -> &'a Self::Value;
    fn set(self, model: &mut T, value: Self::Value);
}

pub trait FormModel: Clone + Send + Sync + 'static {
    type Fields;

    fn fields() -> Self::Fields;

    fn field_keys() -> &'static [FieldKey];

    fn visit_fields(&self, visitor: &mut dyn FnMut(FieldKey, &dyn FieldValue));

    fn field_strings(&self) -> Vec<(FieldKey, String)> {
        let mut entries = Vec::with_capacity(Self::field_keys().len());
        self.visit_fields(&mut |key, value| entries.push((key, value.to_form_string())));
        entries
    }

    fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        self.visit_fields(&mut |key, value| {
            map.insert(key.as_str().to_string(), value.to_json_value());
        });
        map
    }
}

/// Computes the error message for one field.
///
/// The second argument is the form's default value set, not the live values
/// of the other fields.
pub trait FieldValidator<T, L>: Send + Sync
where
    L: FieldLens<T>,
{
    fn validate(&self, value: &L::Value, defaults: &T) -> Option<String>;
}

impl<T, L, F> FieldValidator<T, L> for F
where
    L: FieldLens<T>,
    F: for<'a> Fn(&'a L::Value, &'a T) -> Option<String> + Send + Sync,
{
    fn validate(&self, value: &L::Value, defaults: &T) -> Option<String> {
        (self)(value, defaults)
    }
}

pub struct FormConfig<T> {
    pub(super) options: FormOptions,
    pub(super) validators: BTreeMap<FieldKey, ErasedValidator>,
    _model: PhantomData<fn() -> T>,
}

impl<T> Default for FormConfig<T> {
    fn default() -> Self {
        Self {
            options: FormOptions::default(),
            validators: BTreeMap::new(),
            _model: PhantomData,
        }
    }
}

impl<T> Clone for FormConfig<T> {
    fn clone(&self) -> Self {
        Self {
            options: self.options,
            validators: self.validators.clone(),
            _model: PhantomData,
        }
    }
}

impl<T> Debug for FormConfig<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormConfig")
            .field("options", &self.options)
            .field("validated_fields", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> FormConfig<T>
where
    T: FormModel,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate<L, V>(mut self, lens: L, validator: V) -> Self
    where
        L: FieldLens<T>,
        V: FieldValidator<T, L> + 'static,
    {
        let typed: TypedValidator<T, L> = Arc::new(validator);
        self.validators.insert(lens.key(), Arc::new(typed));
        self
    }

    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name_strategy(mut self, strategy: NameStrategy) -> Self {
        self.options.name_strategy = strategy;
        self
    }

    pub fn has_validator<L>(&self, lens: L) -> bool
    where
        L: FieldLens<T>,
    {
        self.validators.contains_key(&lens.key())
    }
}
