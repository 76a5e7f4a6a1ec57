use std::collections::BTreeMap;

use super::controller::{FormHandle, FormResult};
use super::provider::{FormContext, FormProvider, FormScope};
use super::validation::FormModel;
use super::view::FormView;

// One entry per `create_form` pair, keyed by the pair's shared slot.
struct InstalledForms<T: FormModel> {
    scopes: BTreeMap<usize, FormScope<T>>,
}

impl<T: FormModel> Default for InstalledForms<T> {
    fn default() -> Self {
        Self {
            scopes: BTreeMap::new(),
        }
    }
}

impl<T: FormModel> gpui::Global for InstalledForms<T> {}

impl<T> FormProvider<T>
where
    T: FormModel,
{
    pub fn install(&self, default_value: T, cx: &mut gpui::App) -> FormResult<FormHandle<T>> {
        let scope = self.mount(default_value)?;
        let handle = scope.handle().clone();
        cx.default_global::<InstalledForms<T>>()
            .scopes
            .insert(self.slot_key(), scope);
        Ok(handle)
    }

    pub fn uninstall(&self, cx: &mut gpui::App) -> bool {
        if !cx.has_global::<InstalledForms<T>>() {
            return false;
        }
        cx.global_mut::<InstalledForms<T>>()
            .scopes
            .remove(&self.slot_key())
            .is_some()
    }
}

impl<T> FormContext<T>
where
    T: FormModel,
{
    pub fn read(&self, cx: &gpui::App) -> FormResult<FormView<T>> {
        let installed = cx
            .try_global::<InstalledForms<T>>()
            .and_then(|installed| installed.scopes.get(&self.slot_key()));
        match installed {
            Some(scope) => Ok(FormView::attached(scope.handle().snapshot()?)),
            None => self.view(),
        }
    }
}
