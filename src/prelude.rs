pub use crate::form::{
    FieldLens, FieldValue, FileEntry, FileInputEvent, FileList, FormConfig, FormContext,
    FormHandle, FormModel, FormOptions, FormProvider, FormResult, FormView, NameStrategy,
    create_form,
};
