//! Renderer collaborator

use serde::Serialize;

use super::selection::ProviderChoice;
use super::step::Step;

/// What a renderer needs to draw one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub step: Step,
    pub number: usize,
    pub total: usize,
    pub selection: Option<ProviderChoice>,
    pub can_go_back: bool,
}

impl StepView {
    pub fn new(step: Step, selection: Option<ProviderChoice>) -> Self {
        Self {
            step,
            number: step.number().min(Step::total()),
            total: Step::total(),
            selection,
            can_go_back: !step.is_first(),
        }
    }
}

/// Draws the active step. Called only after the step has been persisted.
pub trait Renderer: Send {
    fn render(&mut self, view: &StepView);

    /// The user finished the wizard; tear down the UI
    fn finished(&mut self) {}
}

/// Renderer that draws nothing, for headless use
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _view: &StepView) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_progress() {
        let view = StepView::new(Step::Permissions, None);
        assert_eq!(view.number, 3);
        assert_eq!(view.total, 7);
        assert!(view.can_go_back);

        let first = StepView::new(Step::Welcome, None);
        assert!(!first.can_go_back);

        // Complete shares the last slot of the progress bar
        let done = StepView::new(Step::Complete, None);
        assert_eq!(done.number, done.total);
    }
}
