//! Multi-step dialog state.
//!
//! A workflow is an ordered list of steps. Completion is not pushed step by
//! step; it is re-derived from external data (connection status, what the
//! backend reports) every time that data changes. If an earlier precondition
//! stops holding, its step reopens and becomes active again. Side effects
//! already performed against the ledger or backend are never undone here.

use std::fmt::Debug;

use crate::provider::SigningRequest;

/// A named step of a workflow, declared in order by [`WorkflowStep::ALL`].
pub trait WorkflowStep: Copy + Eq + Debug + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepStatus {
    pub complete: bool,
    pub error: Option<String>,
}

/// Result of one user-confirmed action within a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The user signed; carries the transaction hash.
    Signed(String),
    /// Nothing to sign, the backend already reports the step as done.
    AlreadyDone,
    /// The user declined or the request expired.
    Declined,
    /// The request could not be made. Carries a user-facing message.
    Failed(String),
}

impl StepOutcome {
    /// Wait for a signing request and classify its resolution.
    pub async fn from_request(request: SigningRequest) -> Self {
        match request.wait().await {
            Some(hash) => StepOutcome::Signed(hash),
            None => StepOutcome::Declined,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workflow<S: WorkflowStep> {
    steps: Vec<(S, StepStatus)>,
}

impl<S: WorkflowStep> Default for Workflow<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: WorkflowStep> Workflow<S> {
    pub fn new() -> Self {
        Self {
            steps: S::ALL
                .iter()
                .map(|step| (*step, StepStatus::default()))
                .collect(),
        }
    }

    /// First incomplete step in declared order; `None` once all are complete.
    pub fn active_step(&self) -> Option<S> {
        self.steps
            .iter()
            .find(|(_, status)| !status.complete)
            .map(|(step, _)| *step)
    }

    /// Position of the active step, or the step count when terminal.
    pub fn active_index(&self) -> usize {
        self.steps
            .iter()
            .position(|(_, status)| !status.complete)
            .unwrap_or(self.steps.len())
    }

    pub fn is_terminal(&self) -> bool {
        self.active_step().is_none()
    }

    pub fn status(&self, step: S) -> &StepStatus {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, status)| status)
            .unwrap_or_else(|| unreachable!("{step:?} is declared in WorkflowStep::ALL"))
    }

    pub fn steps(&self) -> impl Iterator<Item = (S, &StepStatus)> {
        self.steps.iter().map(|(step, status)| (*step, status))
    }

    pub fn set_error(&mut self, step: S, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(step = step.label(), %message, "workflow step failed");
        self.status_mut(step).error = Some(message);
    }

    pub fn clear_error(&mut self, step: S) {
        self.status_mut(step).error = None;
    }

    /// Re-derive every step's completion. Steps that became complete lose
    /// their error.
    pub fn evaluate(&mut self, mut is_complete: impl FnMut(S) -> bool) {
        for (step, status) in &mut self.steps {
            status.complete = is_complete(*step);
            if status.complete {
                status.error = None;
            }
        }
    }

    fn status_mut(&mut self, step: S) -> &mut StepStatus {
        self.steps
            .iter_mut()
            .find(|(s, _)| *s == step)
            .map(|(_, status)| status)
            .unwrap_or_else(|| unreachable!("{step:?} is declared in WorkflowStep::ALL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Step {
        One,
        Two,
        Three,
    }

    impl WorkflowStep for Step {
        const ALL: &'static [Self] = &[Step::One, Step::Two, Step::Three];

        fn label(self) -> &'static str {
            match self {
                Step::One => "one",
                Step::Two => "two",
                Step::Three => "three",
            }
        }
    }

    #[test]
    fn starts_at_first_step() {
        let workflow = Workflow::<Step>::new();
        assert_eq!(workflow.active_step(), Some(Step::One));
        assert_eq!(workflow.active_index(), 0);
        assert!(!workflow.is_terminal());
    }

    #[test]
    fn active_step_is_first_incomplete() {
        let mut workflow = Workflow::<Step>::new();
        workflow.evaluate(|step| step != Step::Two);
        assert_eq!(workflow.active_step(), Some(Step::Two));
    }

    #[test]
    fn invalidated_precondition_reopens_step() {
        let mut workflow = Workflow::<Step>::new();
        let mut done = vec![Step::One, Step::Two];
        workflow.evaluate(|step| done.contains(&step));
        assert_eq!(workflow.active_step(), Some(Step::Three));

        done.retain(|s| *s != Step::Two);
        workflow.evaluate(|step| done.contains(&step));
        assert_eq!(workflow.active_step(), Some(Step::Two));
    }

    #[test]
    fn terminal_when_all_complete() {
        let mut workflow = Workflow::<Step>::new();
        workflow.evaluate(|_| true);
        assert!(workflow.is_terminal());
        assert_eq!(workflow.active_index(), 3);
    }

    #[test]
    fn completion_clears_error() {
        let mut workflow = Workflow::<Step>::new();
        workflow.set_error(Step::One, "declined");
        workflow.evaluate(|_| false);
        assert_eq!(workflow.status(Step::One).error.as_deref(), Some("declined"));

        workflow.evaluate(|step| step == Step::One);
        assert_eq!(workflow.status(Step::One).error, None);
    }
}
