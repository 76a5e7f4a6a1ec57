#[cfg(feature = "gpui")]
mod app;
mod controller;
mod encoding;
mod files;
mod names;
mod provider;
mod validation;
mod value;
mod view;


pub use calmform_derive::FormModel;
pub use controller::{
    FieldHandle, FieldKey, FormError, FormHandle, FormId, FormOptions, FormResult, Subscription,
};
pub use encoding::{FormData, FormDataValue, UrlSearchParams, encode_uri_component};
pub use files::{FileEntry, FileInputEvent, FileList};
pub use names::NameStrategy;
pub use provider::{FormContext, FormProvider, FormScope, create_form};
pub use validation::{FieldLens, FieldValidator, FormConfig, FormModel};
pub use value::FieldValue;
pub use view::{FieldView, FormSnapshot, FormView};
