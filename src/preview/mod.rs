//! Live preview: source transform and sandboxed rendering
//!
//! ```text
//! canonical source ──transform──▶ preview source ──Renderer──▶ PreviewResult
//!                                                    │
//!                                        HostScope (elements, state, effects)
//! ```

pub mod jsx;
pub mod sandbox;
pub mod scope;
pub mod transform;
pub mod tree;

pub use sandbox::{PreviewResult, RenderError, RenderOutcome, Renderer, Sandbox};
pub use scope::{EffectHandle, EffectRequest, HostScope, StandardScope, StateSlot};
pub use transform::{count_render_calls, transform, RenderTarget, TransformedSource};
pub use tree::{Prop, PropValue, VisualNode, VisualTree};
