use std::sync::{Mutex, MutexGuard, PoisonError};

use stepform_gateway::{FormGateway, GatewayError};
use stepform_spec::{
    Field, FieldType, SchemaError, Step, next_step_order, sort_by_order, validate_step_against,
};
use tracing::{debug, warn};

use crate::error::BuilderError;
use crate::state::{BuilderState, EditTarget};

#[derive(Debug, Default)]
struct Inner {
    form_id: Option<String>,
    steps: Vec<Step>,
    state: BuilderState,
    saving: bool,
    generation: u64,
}

impl Inner {
    fn form_id(&self) -> Result<String, BuilderError> {
        self.form_id.clone().ok_or(BuilderError::NoFormSelected)
    }

    fn replace_steps(&mut self, mut steps: Vec<Step>) {
        sort_by_order(&mut steps);
        self.steps = steps;
    }

    // Only stored steps enter the listing.
    fn upsert(&mut self, saved: Step) -> Result<(), GatewayError> {
        if saved.id.as_deref().is_none_or(str::is_empty) {
            return Err(GatewayError::Decode("saved step has no _id".to_string()));
        }
        match self.steps.iter_mut().find(|step| step.id == saved.id) {
            Some(slot) => *slot = saved,
            None => self.steps.push(saved),
        }
        sort_by_order(&mut self.steps);
        Ok(())
    }
}

/// Editor for the steps of one form.
///
/// State lives behind a mutex that is released before every gateway call, so
/// a second `save` issued while the first is awaiting the gateway observes the
/// in-flight flag. Each `select_form` and `close` starts a new session
/// generation; a gateway response that returns into an older generation is
/// dropped with [`BuilderError::Stale`].
pub struct StepBuilder<G> {
    gateway: G,
    inner: Mutex<Inner>,
}

// Clears the in-flight flag when a save finishes, however it finishes.
struct SaveGuard<'a> {
    inner: &'a Mutex<Inner>,
    generation: u64,
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.generation == self.generation {
            inner.saving = false;
        }
    }
}

impl<G: FormGateway> StepBuilder<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn state(&self) -> BuilderState {
        self.lock().state.clone()
    }

    pub fn form_id(&self) -> Option<String> {
        self.lock().form_id.clone()
    }

    /// Listed steps, sorted by order.
    pub fn steps(&self) -> Vec<Step> {
        self.lock().steps.clone()
    }

    pub fn draft(&self) -> Option<Step> {
        self.lock().state.draft().cloned()
    }

    pub fn is_editing(&self) -> bool {
        self.lock().state.is_editing()
    }

    pub fn is_saving(&self) -> bool {
        self.lock().saving
    }

    /// Opens a form and loads its steps. A form without steps lists empty.
    pub async fn select_form(&self, form_id: &str) -> Result<Vec<Step>, BuilderError> {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.form_id = Some(form_id.to_string());
            inner.steps.clear();
            inner.state = BuilderState::Listing;
            inner.saving = false;
            inner.generation
        };
        debug!(form_id, generation, "selecting form");
        let fetched = self.gateway.list_steps(form_id).await;

        let mut inner = self.lock();
        ensure_current(&inner, generation, "list_steps")?;
        let steps =
            listing(fetched).inspect_err(|err| warn!(form_id, %err, "failed to load steps"))?;
        inner.replace_steps(steps);
        Ok(inner.steps.clone())
    }

    /// Refetches the selected form's steps. An open draft is kept.
    pub async fn refresh(&self) -> Result<Vec<Step>, BuilderError> {
        let (form_id, generation) = {
            let inner = self.lock();
            (inner.form_id()?, inner.generation)
        };
        let fetched = self.gateway.list_steps(&form_id).await;

        let mut inner = self.lock();
        ensure_current(&inner, generation, "list_steps")?;
        inner.replace_steps(listing(fetched)?);
        Ok(inner.steps.clone())
    }

    /// Starts a new draft with the next free order and one blank field.
    pub fn add_step(&self) -> Result<Step, BuilderError> {
        let mut inner = self.lock();
        inner.form_id()?;
        if inner.state.is_editing() {
            return Err(BuilderError::AlreadyEditing);
        }
        let draft = Step::draft(next_step_order(&inner.steps));
        inner.state = BuilderState::Editing {
            draft: draft.clone(),
            target: EditTarget::New,
        };
        Ok(draft)
    }

    /// Starts editing a copy of a listed step.
    pub fn edit_step(&self, step_id: &str) -> Result<Step, BuilderError> {
        let mut inner = self.lock();
        inner.form_id()?;
        if inner.state.is_editing() {
            return Err(BuilderError::AlreadyEditing);
        }
        let draft = inner
            .steps
            .iter()
            .find(|step| step.id.as_deref() == Some(step_id))
            .cloned()
            .ok_or_else(|| BuilderError::UnknownStep(step_id.to_string()))?;
        inner.state = BuilderState::Editing {
            draft: draft.clone(),
            target: EditTarget::Existing(step_id.to_string()),
        };
        Ok(draft)
    }

    /// Discards the draft.
    pub fn cancel_edit(&self) -> Result<(), BuilderError> {
        let mut inner = self.lock();
        if inner.saving {
            return Err(BuilderError::SaveInFlight);
        }
        if !inner.state.is_editing() {
            return Err(BuilderError::NotEditing);
        }
        inner.state = BuilderState::Listing;
        Ok(())
    }

    /// Applies `edit` to the draft. Refused while a save is in flight.
    pub fn edit_draft<R>(
        &self,
        edit: impl FnOnce(&mut Step) -> Result<R, SchemaError>,
    ) -> Result<R, BuilderError> {
        let mut inner = self.lock();
        if inner.saving {
            return Err(BuilderError::SaveInFlight);
        }
        match &mut inner.state {
            BuilderState::Editing { draft, .. } => Ok(edit(draft)?),
            _ => Err(BuilderError::NotEditing),
        }
    }

    pub fn set_title(&self, title: impl Into<String>) -> Result<(), BuilderError> {
        let title = title.into();
        self.edit_draft(|draft| {
            draft.title = title;
            Ok(())
        })
    }

    /// Blank descriptions are stored as absent.
    pub fn set_description(&self, description: impl Into<String>) -> Result<(), BuilderError> {
        let description = description.into();
        self.edit_draft(|draft| {
            draft.description = (!description.trim().is_empty()).then_some(description);
            Ok(())
        })
    }

    pub fn set_order(&self, order: u32) -> Result<(), BuilderError> {
        self.edit_draft(|draft| {
            draft.order = order;
            Ok(())
        })
    }

    pub fn add_field(&self) -> Result<(), BuilderError> {
        self.edit_draft(|draft| {
            draft.add_field();
            Ok(())
        })
    }

    pub fn remove_field(&self, index: usize) -> Result<Field, BuilderError> {
        self.edit_draft(|draft| draft.remove_field(index))
    }

    pub fn toggle_required(&self, index: usize) -> Result<bool, BuilderError> {
        self.edit_draft(|draft| draft.toggle_required(index))
    }

    pub fn set_field_type(&self, index: usize, kind: FieldType) -> Result<(), BuilderError> {
        self.edit_draft(|draft| draft.set_field_type(index, kind))
    }

    pub fn update_field(
        &self,
        index: usize,
        update: impl FnOnce(&mut Field),
    ) -> Result<(), BuilderError> {
        self.edit_draft(|draft| {
            update(draft.field_mut(index)?);
            Ok(())
        })
    }

    pub fn add_option(&self, field: usize) -> Result<(), BuilderError> {
        self.edit_draft(|draft| {
            draft.field_mut(field)?.add_option();
            Ok(())
        })
    }

    pub fn update_option(
        &self,
        field: usize,
        option: usize,
        value: impl Into<String>,
    ) -> Result<(), BuilderError> {
        let value = value.into();
        self.edit_draft(|draft| draft.field_mut(field)?.update_option(option, value))
    }

    pub fn remove_option(&self, field: usize, option: usize) -> Result<String, BuilderError> {
        self.edit_draft(|draft| draft.field_mut(field)?.remove_option(option))
    }

    /// Validates and persists the draft.
    ///
    /// Invalid drafts never reach the gateway. On gateway failure the draft
    /// stays open for another attempt. On success the builder returns to the
    /// listing, which is then refetched; a failed refetch only logs.
    pub async fn save(&self) -> Result<Step, BuilderError> {
        let (form_id, draft, target, generation) = {
            let mut inner = self.lock();
            if inner.saving {
                debug!("save rejected, another save is in flight");
                return Err(BuilderError::SaveInFlight);
            }
            let form_id = inner.form_id()?;
            let BuilderState::Editing { draft, target } = &inner.state else {
                return Err(BuilderError::NotEditing);
            };
            let report = validate_step_against(draft, &inner.steps);
            if !report.is_valid() {
                debug!(errors = report.errors.len(), "draft failed validation");
                return Err(BuilderError::Validation(report));
            }
            let pending = (form_id, draft.clone(), target.clone(), inner.generation);
            inner.saving = true;
            pending
        };
        let guard = SaveGuard {
            inner: &self.inner,
            generation,
        };

        let result = match &target {
            EditTarget::New => self.gateway.create_step(&form_id, &draft).await,
            EditTarget::Existing(step_id) => {
                self.gateway.update_step(&form_id, step_id, &draft).await
            }
        };

        let saved = {
            let mut inner = self.lock();
            ensure_current(&inner, generation, "save")?;
            let saved =
                result.inspect_err(|err| warn!(form_id = %form_id, %err, "failed to save step"))?;
            inner.upsert(saved.clone()).inspect_err(
                |err| warn!(form_id = %form_id, %err, "gateway returned an unstored step"),
            )?;
            inner.state = BuilderState::Listing;
            saved
        };
        drop(guard);
        debug!(form_id = %form_id, step_id = ?saved.id, "step saved");

        match self.gateway.list_steps(&form_id).await {
            Ok(steps) => {
                let mut inner = self.lock();
                if inner.generation == generation {
                    inner.replace_steps(steps);
                }
            }
            Err(err) => warn!(form_id = %form_id, %err, "refetch after save failed"),
        }
        Ok(saved)
    }

    /// Deletes a listed step. On failure the listing is left as it was.
    pub async fn delete_step(&self, step_id: &str) -> Result<(), BuilderError> {
        let (form_id, generation) = {
            let inner = self.lock();
            if inner.saving {
                return Err(BuilderError::SaveInFlight);
            }
            let form_id = inner.form_id()?;
            if !inner
                .steps
                .iter()
                .any(|step| step.id.as_deref() == Some(step_id))
            {
                return Err(BuilderError::UnknownStep(step_id.to_string()));
            }
            (form_id, inner.generation)
        };

        let result = self.gateway.delete_step(&form_id, step_id).await;
        {
            let mut inner = self.lock();
            ensure_current(&inner, generation, "delete_step")?;
            result.inspect_err(|err| {
                warn!(form_id = %form_id, step_id, %err, "failed to delete step");
            })?;
            inner
                .steps
                .retain(|step| step.id.as_deref() != Some(step_id));
            if matches!(
                inner.state.target(),
                Some(EditTarget::Existing(id)) if id == step_id
            ) {
                inner.state = BuilderState::Listing;
            }
        }

        match self.gateway.list_steps(&form_id).await {
            Ok(steps) => {
                let mut inner = self.lock();
                if inner.generation == generation {
                    inner.replace_steps(steps);
                }
            }
            Err(err) => warn!(form_id = %form_id, %err, "refetch after delete failed"),
        }
        Ok(())
    }

    /// Ends the session. Responses still in flight are discarded.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.form_id = None;
        inner.steps.clear();
        inner.state = BuilderState::Idle;
        inner.saving = false;
        debug!(generation = inner.generation, "builder closed");
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// A form the API has no steps for lists empty.
fn listing(fetched: Result<Vec<Step>, GatewayError>) -> Result<Vec<Step>, GatewayError> {
    match fetched {
        Err(err) if err.is_not_found() => Ok(Vec::new()),
        other => other,
    }
}

fn ensure_current(inner: &Inner, generation: u64, call: &str) -> Result<(), BuilderError> {
    if inner.generation == generation {
        Ok(())
    } else {
        warn!(call, generation, current = inner.generation, "discarding stale response");
        Err(BuilderError::Stale)
    }
}
