//! Host capability object injected into every sandbox
//!
//! User code never reaches the host directly. Element construction, state
//! and effects all go through a [`HostScope`], so the renderer works against
//! any runtime that can provide these primitives.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::jsx::Value;
use super::tree::{Prop, VisualNode};

/// Identifies one state hook of one component instance in one sandbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateSlot {
    pub sandbox: u64,
    pub instance: u32,
    pub hook: u32,
}

/// An effect registered by user code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectRequest {
    pub sandbox: u64,
    /// Component that registered it
    pub component: String,
    /// Dependency count, `None` when the dependency list was omitted
    pub deps: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectHandle(pub u64);

/// The fixed capability set a sandbox evaluates against
pub trait HostScope: Send + Sync {
    /// Whether `name` is a global the host supplies (`React`, `useState`, ...)
    fn provides(&self, name: &str) -> bool;

    /// Construct a host element
    fn create_element(&self, tag: &str, props: Vec<Prop>, children: Vec<VisualNode>)
        -> VisualNode;

    /// Current value of a state slot, seeding it with `initial` on first use
    fn use_state(&self, slot: StateSlot, initial: Value) -> Value;

    fn schedule_effect(&self, request: EffectRequest) -> EffectHandle;

    /// Tear down an effect; unknown handles are ignored
    fn cancel_effect(&self, handle: EffectHandle);

    /// Drop all state held for a sandbox
    fn release(&self, _sandbox: u64) {}
}

/// Globals of the standard scope
const GLOBALS: &[&str] = &[
    "React",
    "useState",
    "useEffect",
    "useLayoutEffect",
    "useRef",
    "useMemo",
    "useCallback",
    "Fragment",
    "console",
    "Math",
    "JSON",
    "Date",
    "Number",
    "String",
    "Boolean",
    "Array",
    "Object",
    "Promise",
    "setTimeout",
    "setInterval",
    "clearTimeout",
    "clearInterval",
    "requestAnimationFrame",
    "fetch",
    "window",
    "document",
];

/// In-process scope backing the studio preview
#[derive(Debug, Default)]
pub struct StandardScope {
    next_effect: AtomicU64,
    effects: Mutex<HashMap<EffectHandle, EffectRequest>>,
    states: Mutex<HashMap<StateSlot, Value>>,
}

impl StandardScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles of effects that have been scheduled and not cancelled
    pub fn active_effects(&self) -> HashSet<EffectHandle> {
        lock(&self.effects).keys().copied().collect()
    }

    pub fn active_effect_count(&self) -> usize {
        lock(&self.effects).len()
    }

    pub fn state_slot_count(&self) -> usize {
        lock(&self.states).len()
    }
}

/// Lock ignoring poisoning; a panic inside user evaluation must not take the
/// scope down with it
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl HostScope for StandardScope {
    fn provides(&self, name: &str) -> bool {
        GLOBALS.contains(&name)
    }

    fn create_element(
        &self,
        tag: &str,
        props: Vec<Prop>,
        children: Vec<VisualNode>,
    ) -> VisualNode {
        VisualNode::Element {
            tag: tag.to_string(),
            props,
            children,
        }
    }

    fn use_state(&self, slot: StateSlot, initial: Value) -> Value {
        lock(&self.states).entry(slot).or_insert(initial).clone()
    }

    fn schedule_effect(&self, request: EffectRequest) -> EffectHandle {
        let handle = EffectHandle(self.next_effect.fetch_add(1, Ordering::Relaxed) + 1);
        tracing::trace!(
            sandbox = request.sandbox,
            component = %request.component,
            handle = handle.0,
            "effect scheduled"
        );
        lock(&self.effects).insert(handle, request);
        handle
    }

    fn cancel_effect(&self, handle: EffectHandle) {
        if lock(&self.effects).remove(&handle).is_some() {
            tracing::trace!(handle = handle.0, "effect cancelled");
        }
    }

    fn release(&self, sandbox: u64) {
        lock(&self.states).retain(|slot, _| slot.sandbox != sandbox);
    }
}
