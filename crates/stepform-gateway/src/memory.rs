use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use stepform_spec::{Form, FormPatch, Step, slugify};
use tracing::debug;

use crate::{FormGateway, GatewayError};

/// Gateway call recorded by [`MemoryGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListForms,
    CreateForm,
    UpdateForm(String),
    DeleteForm(String),
    ListSteps(String),
    CreateStep(String),
    UpdateStep(String, String),
    DeleteStep(String, String),
}

impl GatewayCall {
    pub fn is_write(&self) -> bool {
        !matches!(self, GatewayCall::ListForms | GatewayCall::ListSteps(_))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    forms: Vec<Form>,
    steps: BTreeMap<String, Vec<Step>>,
    next_form: u64,
    next_step: u64,
    calls: Vec<GatewayCall>,
    fail_next: Option<GatewayError>,
}

/// In-process gateway with sequential ids (`f1`, `s1`, ...).
///
/// Every call is recorded, and [`MemoryGateway::fail_next`] makes the next
/// call fail with a chosen error.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    pub fn write_calls(&self) -> usize {
        self.lock().calls.iter().filter(|call| call.is_write()).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn fail_next(&self, error: GatewayError) {
        self.lock().fail_next = Some(error);
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, call: GatewayCall) -> Result<MutexGuard<'_, MemoryState>, GatewayError> {
        let mut state = self.lock();
        debug!(?call, "memory gateway call");
        state.calls.push(call);
        match state.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

impl MemoryState {
    fn form_mut(&mut self, id: &str) -> Result<&mut Form, GatewayError> {
        self.forms
            .iter_mut()
            .find(|form| form.id.as_deref() == Some(id))
            .ok_or_else(|| GatewayError::form_not_found(id))
    }

    fn steps_mut(&mut self, form_id: &str) -> Result<&mut Vec<Step>, GatewayError> {
        self.steps
            .get_mut(form_id)
            .ok_or_else(|| GatewayError::form_not_found(form_id))
    }
}

#[async_trait]
impl FormGateway for MemoryGateway {
    async fn list_forms(&self) -> Result<Vec<Form>, GatewayError> {
        let state = self.begin(GatewayCall::ListForms)?;
        Ok(state.forms.clone())
    }

    async fn create_form(&self, form: &Form) -> Result<Form, GatewayError> {
        let mut state = self.begin(GatewayCall::CreateForm)?;
        state.next_form += 1;
        let id = format!("f{}", state.next_form);
        let mut stored = form.clone();
        stored.id = Some(id.clone());
        if stored.slug.is_empty() {
            stored.slug = slugify(&stored.title);
        }
        state.forms.push(stored.clone());
        state.steps.insert(id, Vec::new());
        Ok(stored)
    }

    async fn update_form(&self, id: &str, patch: &FormPatch) -> Result<Form, GatewayError> {
        let mut state = self.begin(GatewayCall::UpdateForm(id.to_string()))?;
        let form = state.form_mut(id)?;
        form.apply(patch);
        Ok(form.clone())
    }

    async fn delete_form(&self, id: &str) -> Result<(), GatewayError> {
        let mut state = self.begin(GatewayCall::DeleteForm(id.to_string()))?;
        let before = state.forms.len();
        state.forms.retain(|form| form.id.as_deref() != Some(id));
        if state.forms.len() == before {
            return Err(GatewayError::form_not_found(id));
        }
        state.steps.remove(id);
        Ok(())
    }

    async fn list_steps(&self, form_id: &str) -> Result<Vec<Step>, GatewayError> {
        let mut state = self.begin(GatewayCall::ListSteps(form_id.to_string()))?;
        Ok(state.steps_mut(form_id)?.clone())
    }

    async fn create_step(&self, form_id: &str, step: &Step) -> Result<Step, GatewayError> {
        let mut state = self.begin(GatewayCall::CreateStep(form_id.to_string()))?;
        state.steps_mut(form_id)?;
        state.next_step += 1;
        let mut stored = step.clone();
        stored.id = Some(format!("s{}", state.next_step));
        state.steps_mut(form_id)?.push(stored.clone());
        Ok(stored)
    }

    async fn update_step(
        &self,
        form_id: &str,
        step_id: &str,
        step: &Step,
    ) -> Result<Step, GatewayError> {
        let mut state = self.begin(GatewayCall::UpdateStep(
            form_id.to_string(),
            step_id.to_string(),
        ))?;
        let slot = state
            .steps_mut(form_id)?
            .iter_mut()
            .find(|stored| stored.id.as_deref() == Some(step_id))
            .ok_or_else(|| GatewayError::step_not_found(step_id))?;
        *slot = step.clone();
        slot.id = Some(step_id.to_string());
        Ok(slot.clone())
    }

    async fn delete_step(&self, form_id: &str, step_id: &str) -> Result<(), GatewayError> {
        let mut state = self.begin(GatewayCall::DeleteStep(
            form_id.to_string(),
            step_id.to_string(),
        ))?;
        let steps = state.steps_mut(form_id)?;
        let before = steps.len();
        steps.retain(|stored| stored.id.as_deref() != Some(step_id));
        if steps.len() == before {
            return Err(GatewayError::step_not_found(step_id));
        }
        Ok(())
    }
}
