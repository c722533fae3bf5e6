//! Preview pane state
//!
//! Holds the last good render, the current failure (if any) and the mounted
//! sandbox. A failure never replaces the last good tree; it is shown next to
//! it until a later render succeeds.

use crate::preview::{PreviewResult, RenderError, RenderOutcome, Sandbox, TransformedSource, VisualTree};

#[derive(Debug, Default)]
pub struct PreviewState {
    last_good: Option<VisualTree>,
    last_good_version: Option<u64>,
    failure: Option<RenderError>,
    /// Most recent transform output sent to the renderer
    source: Option<TransformedSource>,
    /// Version of the render most recently requested
    requested: Option<u64>,
    mounted: Option<Sandbox>,
    discarded: u64,
}

impl PreviewState {
    /// Note that a render was requested for `version`
    pub fn request(&mut self, version: u64, source: TransformedSource) {
        self.requested = Some(version);
        self.source = Some(source);
    }

    /// Apply a render outcome
    ///
    /// Outcomes for any version other than `current_version` are dropped,
    /// disposing their sandbox. Returns whether the outcome was applied.
    pub fn accept(&mut self, outcome: RenderOutcome, current_version: u64) -> bool {
        if outcome.version != current_version {
            self.discarded += 1;
            tracing::debug!(
                stale = outcome.version,
                current = current_version,
                "discarding stale render"
            );
            return false;
        }
        if self.requested == Some(outcome.version) {
            self.requested = None;
        }

        match outcome.result {
            PreviewResult::Rendered(tree) => {
                if let Some(mut previous) = self.mounted.take() {
                    previous.dispose();
                }
                self.mounted = outcome.sandbox;
                self.last_good = Some(tree);
                self.last_good_version = Some(outcome.version);
                self.failure = None;
            }
            PreviewResult::Failed(error) => {
                tracing::debug!(version = outcome.version, %error, "preview failed");
                self.failure = Some(error);
            }
        }
        true
    }

    /// Latest state as a result: the failure if one is showing, else the last
    /// good tree
    pub fn result(&self) -> Option<PreviewResult> {
        match (&self.failure, &self.last_good) {
            (Some(e), _) => Some(PreviewResult::Failed(e.clone())),
            (None, Some(tree)) => Some(PreviewResult::Rendered(tree.clone())),
            (None, None) => None,
        }
    }

    pub fn last_good(&self) -> Option<&VisualTree> {
        self.last_good.as_ref()
    }

    pub fn last_good_version(&self) -> Option<u64> {
        self.last_good_version
    }

    pub fn failure(&self) -> Option<&RenderError> {
        self.failure.as_ref()
    }

    pub fn source(&self) -> Option<&TransformedSource> {
        self.source.as_ref()
    }

    pub fn mounted(&self) -> Option<&Sandbox> {
        self.mounted.as_ref()
    }

    /// Whether the most recent request has not been answered yet
    pub fn is_pending(&self) -> bool {
        self.requested.is_some()
    }

    /// Stale outcomes dropped so far
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::{transform, Renderer};

    fn render(renderer: &Renderer, version: u64, source: &str) -> RenderOutcome {
        renderer.render(version, &transform(source).code)
    }

    #[test]
    fn test_failure_keeps_last_good_tree() {
        let renderer = Renderer::standard();
        let mut state = PreviewState::default();
        assert!(state.accept(render(&renderer, 1, "const App = () => <p>ok</p>;"), 1));
        assert!(state.accept(
            render(&renderer, 2, "const App = () => { throw new Error('x'); };"),
            2
        ));
        assert_eq!(state.last_good().map(|t| t.text()), Some("ok".to_string()));
        assert_eq!(state.last_good_version(), Some(1));
        assert!(state.failure().is_some());
        assert!(matches!(state.result(), Some(PreviewResult::Failed(_))));
    }

    #[test]
    fn test_stale_outcome_is_discarded() {
        let renderer = Renderer::standard();
        let mut state = PreviewState::default();
        assert!(!state.accept(render(&renderer, 1, "const A = () => <p>old</p>;"), 2));
        assert_eq!(state.discarded(), 1);
        assert!(state.last_good().is_none());
    }

    #[test]
    fn test_new_success_replaces_mounted_sandbox() {
        let renderer = Renderer::standard();
        let mut state = PreviewState::default();
        state.accept(render(&renderer, 1, "const A = () => <p>1</p>;"), 1);
        let first = state.mounted().map(|s| s.id());
        state.accept(render(&renderer, 2, "const A = () => <p>2</p>;"), 2);
        let second = state.mounted().map(|s| s.id());
        assert!(first.is_some());
        assert_ne!(first, second);
    }
}
