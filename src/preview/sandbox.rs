//! Sandboxed rendering of transformed preview source
//!
//! Each render gets a fresh [`Sandbox`] identity. Everything user code
//! registers with the host scope (state slots, effects) is keyed by that
//! identity and torn down when the sandbox is disposed, which happens when
//! a newer render replaces it, when the render fails, or on drop.
//!
//! Failures never escape [`Renderer::render`]: syntax errors, thrown values,
//! missing identifiers and even panics inside the evaluator come back as a
//! [`PreviewResult::Failed`].

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::jsx::{self, ParseError};
use super::scope::{EffectHandle, HostScope, StandardScope};
use super::tree::{VisualNode, VisualTree};

/// A failure of user code, shown in the preview pane
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderError {
    #[error("SyntaxError: {message} (line {line})")]
    Syntax { message: String, line: usize },

    #[error("ReferenceError: {name} is not defined")]
    Reference { name: String },

    #[error("TypeError: {message}")]
    Type { message: String },

    #[error("RangeError: {message}")]
    Range { message: String },

    /// A value thrown by user code
    #[error("Error: {message}")]
    Thrown { message: String },

    #[error("Error: Nothing was rendered. Call render(<Component />) or declare a component.")]
    NoRender,

    /// The evaluator itself failed; user code is not at fault
    #[error("InternalError: {message}")]
    Internal { message: String },
}

impl From<ParseError> for RenderError {
    fn from(e: ParseError) -> Self {
        RenderError::Syntax {
            message: e.message,
            line: e.line,
        }
    }
}

/// Outcome of one render
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum PreviewResult {
    Rendered(VisualTree),
    Failed(RenderError),
}

impl PreviewResult {
    pub fn is_rendered(&self) -> bool {
        matches!(self, PreviewResult::Rendered(_))
    }

    pub fn tree(&self) -> Option<&VisualTree> {
        match self {
            PreviewResult::Rendered(tree) => Some(tree),
            PreviewResult::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RenderError> {
        match self {
            PreviewResult::Rendered(_) => None,
            PreviewResult::Failed(e) => Some(e),
        }
    }
}

/// Resources held by one successful render
///
/// Disposal cancels every effect the render scheduled and releases its state
/// slots. It runs at most once; dropping an undisposed sandbox disposes it.
pub struct Sandbox {
    id: u64,
    version: u64,
    scope: Arc<dyn HostScope>,
    effects: Vec<EffectHandle>,
    disposed: bool,
}

impl Sandbox {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Canonical source version this sandbox rendered
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn effects(&self) -> &[EffectHandle] {
        &self.effects
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for handle in self.effects.drain(..) {
            self.scope.cancel_effect(handle);
        }
        self.scope.release(self.id);
        tracing::debug!(sandbox = self.id, version = self.version, "sandbox disposed");
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sandbox")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("effects", &self.effects.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

/// Result of [`Renderer::render`], tagged with the version it was computed for
#[derive(Debug)]
pub struct RenderOutcome {
    pub version: u64,
    pub result: PreviewResult,
    /// Live sandbox of a successful render; `None` on failure
    pub sandbox: Option<Sandbox>,
}

/// Evaluates transformed source against a shared host scope
#[derive(Clone)]
pub struct Renderer {
    scope: Arc<dyn HostScope>,
    next_id: Arc<AtomicU64>,
}

impl Renderer {
    pub fn new(scope: Arc<dyn HostScope>) -> Self {
        Self {
            scope,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Renderer over a fresh [`StandardScope`]
    pub fn standard() -> Self {
        Self::new(Arc::new(StandardScope::new()))
    }

    pub fn scope(&self) -> &Arc<dyn HostScope> {
        &self.scope
    }

    /// Render `code` for canonical source `version`
    pub fn render(&self, version: u64, code: &str) -> RenderOutcome {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut effects = Vec::new();

        let evaluated = panic::catch_unwind(AssertUnwindSafe(
            || -> Result<Vec<VisualNode>, RenderError> {
                let program = jsx::parse(code)?;
                jsx::evaluate(&program, self.scope.as_ref(), id, &mut effects)
            },
        ));

        let outcome = match evaluated {
            Ok(Ok(nodes)) => Ok(nodes),
            Ok(Err(e)) => Err(e),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(sandbox = id, version, %message, "evaluator panicked");
                Err(RenderError::Internal { message })
            }
        };

        let mut sandbox = Sandbox {
            id,
            version,
            scope: Arc::clone(&self.scope),
            effects,
            disposed: false,
        };

        match outcome {
            Ok(nodes) => {
                tracing::debug!(
                    sandbox = id,
                    version,
                    nodes = nodes.len(),
                    effects = sandbox.effect_count(),
                    "render succeeded"
                );
                RenderOutcome {
                    version,
                    result: PreviewResult::Rendered(VisualTree::new(nodes)),
                    sandbox: Some(sandbox),
                }
            }
            Err(error) => {
                tracing::debug!(sandbox = id, version, %error, "render failed");
                sandbox.dispose();
                RenderOutcome {
                    version,
                    result: PreviewResult::Failed(error),
                    sandbox: None,
                }
            }
        }
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "evaluator panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer_with_scope() -> (Renderer, Arc<StandardScope>) {
        let scope = Arc::new(StandardScope::new());
        (Renderer::new(scope.clone()), scope)
    }

    #[test]
    fn test_successful_render_keeps_sandbox() {
        let (renderer, scope) = renderer_with_scope();
        let outcome = renderer.render(
            3,
            "const App = () => { useEffect(() => {}, []); return <p>hi</p>; };\nrender(<App />);",
        );
        assert_eq!(outcome.version, 3);
        assert!(outcome.result.is_rendered());
        let sandbox = outcome.sandbox.expect("sandbox for successful render");
        assert_eq!(sandbox.effect_count(), 1);
        assert_eq!(scope.active_effect_count(), 1);
        drop(sandbox);
        assert_eq!(scope.active_effect_count(), 0);
    }

    #[test]
    fn test_failed_render_releases_effects() {
        let (renderer, scope) = renderer_with_scope();
        let outcome = renderer.render(
            1,
            "const App = () => { useEffect(() => {}); throw new Error('nope'); };\nrender(<App />);",
        );
        assert!(outcome.sandbox.is_none());
        assert_eq!(
            outcome.result.error().map(|e| e.to_string()),
            Some("Error: nope".to_string())
        );
        assert_eq!(scope.active_effect_count(), 0);
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let renderer = Renderer::standard();
        let outcome = renderer.render(1, "const App = () => <div>;\n\nrender(<App />);");
        match outcome.result {
            PreviewResult::Failed(RenderError::Syntax { line, .. }) => assert!(line >= 1),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (renderer, scope) = renderer_with_scope();
        let outcome = renderer.render(
            1,
            "const App = () => { const [n] = useState(1); useEffect(() => {}); return <b>{n}</b>; };\nrender(<App />);",
        );
        let mut sandbox = outcome.sandbox.expect("sandbox");
        assert_eq!(scope.state_slot_count(), 1);
        sandbox.dispose();
        sandbox.dispose();
        assert_eq!(scope.active_effect_count(), 0);
        assert_eq!(scope.state_slot_count(), 0);
    }

    #[test]
    fn test_sandbox_ids_are_unique_across_clones() {
        let renderer = Renderer::standard();
        let clone = renderer.clone();
        let a = renderer.render(1, "render(<p />);").sandbox.expect("a");
        let b = clone.render(2, "render(<p />);").sandbox.expect("b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_error_messages_are_user_readable() {
        let reference = RenderError::Reference {
            name: "Widget".into(),
        };
        assert_eq!(reference.to_string(), "ReferenceError: Widget is not defined");
        assert!(!RenderError::NoRender.to_string().is_empty());
    }
}
