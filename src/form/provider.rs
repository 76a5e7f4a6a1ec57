use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::{Arc, RwLock};

use super::controller::{FormHandle, FormResult, read_lock, write_lock};
use super::validation::{FormConfig, FormModel};
use super::view::FormView;

type Slot<T> = Arc<RwLock<Option<FormHandle<T>>>>;

pub fn create_form<T>(config: FormConfig<T>) -> (FormContext<T>, FormProvider<T>)
where
    T: FormModel,
{
    let slot: Slot<T> = Arc::new(RwLock::new(None));
    (
        FormContext { slot: slot.clone() },
        FormProvider {
            config: Arc::new(config),
            slot,
        },
    )
}

pub struct FormContext<T> {
    slot: Slot<T>,
}

impl<T> Clone for FormContext<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> Debug for FormContext<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let attached = self
            .slot
            .read()
            .map(|slot| slot.as_ref().map(|handle| handle.inner.id))
            .ok()
            .flatten();
        f.debug_struct("FormContext")
            .field("attached", &attached)
            .finish()
    }
}

impl<T> FormContext<T>
where
    T: FormModel,
{
    pub fn handle(&self) -> FormResult<Option<FormHandle<T>>> {
        Ok(read_lock(&self.slot, "resolving form context")?.clone())
    }

    #[cfg(feature = "gpui")]
    pub(super) fn slot_key(&self) -> usize {
        slot_key(&self.slot)
    }

    pub fn is_attached(&self) -> FormResult<bool> {
        Ok(read_lock(&self.slot, "checking form context")?.is_some())
    }

    pub fn view(&self) -> FormResult<FormView<T>> {
        match self.handle()? {
            Some(handle) => Ok(FormView::attached(handle.snapshot()?)),
            None => Ok(FormView::unattached()),
        }
    }
}

pub struct FormProvider<T> {
    config: Arc<FormConfig<T>>,
    slot: Slot<T>,
}

impl<T> Clone for FormProvider<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            slot: self.slot.clone(),
        }
    }
}

impl<T> Debug for FormProvider<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T> FormProvider<T>
where
    T: FormModel,
{
    pub fn config(&self) -> &FormConfig<T> {
        &self.config
    }

    #[cfg(feature = "gpui")]
    pub(super) fn slot_key(&self) -> usize {
        slot_key(&self.slot)
    }

    pub fn mount(&self, default_value: T) -> FormResult<FormScope<T>> {
        let handle = FormHandle::new(default_value, &self.config);
        let previous = write_lock(&self.slot, "mounting form")?.replace(handle.clone());
        if let Some(previous) = previous {
            tracing::debug!(
                previous = %previous.form_id(),
                form = %handle.form_id(),
                "form remounted with new defaults"
            );
        } else {
            tracing::debug!(form = %handle.form_id(), "form mounted");
        }
        Ok(FormScope {
            handle,
            slot: self.slot.clone(),
        })
    }

    pub fn scope<R>(
        &self,
        default_value: T,
        children: impl FnOnce(&FormHandle<T>) -> R,
    ) -> FormResult<R> {
        let scope = self.mount(default_value)?;
        let result = children(scope.handle());
        scope.unmount()?;
        Ok(result)
    }
}

/// Keeps one mounted instance attached; dropping it detaches the instance
/// unless a later mount has already replaced it.
pub struct FormScope<T> {
    handle: FormHandle<T>,
    slot: Slot<T>,
}

impl<T> Debug for FormScope<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormScope")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl<T> FormScope<T>
where
    T: FormModel,
{
    pub fn handle(&self) -> &FormHandle<T> {
        &self.handle
    }

    pub fn unmount(self) -> FormResult<()> {
        let mut slot = write_lock(&self.slot, "unmounting form")?;
        detach(&mut slot, &self.handle);
        Ok(())
    }
}

impl<T> Deref for FormScope<T> {
    type Target = FormHandle<T>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<T> Drop for FormScope<T> {
    fn drop(&mut self) {
        let mut slot = match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        detach(&mut slot, &self.handle);
    }
}

fn detach<T>(slot: &mut Option<FormHandle<T>>, handle: &FormHandle<T>) {
    if slot
        .as_ref()
        .is_some_and(|attached| Arc::ptr_eq(&attached.inner, &handle.inner))
    {
        tracing::debug!(form = %handle.inner.id, "form unmounted");
        *slot = None;
    }
}

#[cfg(feature = "gpui")]
fn slot_key<T>(slot: &Slot<T>) -> usize {
    Arc::as_ptr(slot) as usize
}
