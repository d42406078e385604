use stepform_spec::{Step, StepId};

/// What a save of the current draft will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    New,
    Existing(StepId),
}

/// Builder lifecycle. A draft only exists while editing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BuilderState {
    /// No form selected, or the session was closed.
    #[default]
    Idle,
    Listing,
    Editing { draft: Step, target: EditTarget },
}

impl BuilderState {
    pub fn is_editing(&self) -> bool {
        matches!(self, BuilderState::Editing { .. })
    }

    pub fn draft(&self) -> Option<&Step> {
        match self {
            BuilderState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&EditTarget> {
        match self {
            BuilderState::Editing { target, .. } => Some(target),
            _ => None,
        }
    }
}
