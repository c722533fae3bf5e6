//! Runtime module - the studio event loop
//!
//! This module drives the update loop outside of any UI toolkit:
//! - `studio` - owns the model, executes commands, runs the debounce timer
//!   and collects results from background renders and file reads
//! - `editor` - the editor widget seam (`EditorSurface`) and a headless
//!   implementation

pub mod editor;
pub mod studio;

pub use editor::{EditorSurface, HeadlessEditor};
pub use studio::Studio;
