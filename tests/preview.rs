//! Preview tests: transform plus sandboxed render, end to end
//!
//! Includes host scopes that count effects and one that panics, to check
//! the sandbox boundary.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use common::{published_model, send, THROWING_SOURCE, WIDGET_SOURCE};
use swatch::messages::{Msg, PreviewMsg};
use swatch::preview::jsx::Value;
use swatch::preview::{
    count_render_calls, transform, EffectHandle, EffectRequest, HostScope, Prop, PreviewResult,
    RenderError, RenderTarget, Renderer, StandardScope, StateSlot, VisualNode,
};

fn render(renderer: &Renderer, version: u64, source: &str) -> swatch::preview::RenderOutcome {
    renderer.render(version, &transform(source).code)
}

/// Standard scope that counts live effects
#[derive(Default)]
struct CountingScope {
    inner: StandardScope,
    scheduled: AtomicUsize,
    cancelled: Mutex<Vec<EffectHandle>>,
}

impl HostScope for CountingScope {
    fn provides(&self, name: &str) -> bool {
        self.inner.provides(name)
    }

    fn create_element(&self, tag: &str, props: Vec<Prop>, children: Vec<VisualNode>) -> VisualNode {
        self.inner.create_element(tag, props, children)
    }

    fn use_state(&self, slot: StateSlot, initial: Value) -> Value {
        self.inner.use_state(slot, initial)
    }

    fn schedule_effect(&self, request: EffectRequest) -> EffectHandle {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        self.inner.schedule_effect(request)
    }

    fn cancel_effect(&self, handle: EffectHandle) {
        self.cancelled.lock().unwrap().push(handle);
        self.inner.cancel_effect(handle);
    }

    fn release(&self, sandbox: u64) {
        self.inner.release(sandbox);
    }
}

/// Scope whose element constructor blows up
struct PanickingScope;

impl HostScope for PanickingScope {
    fn provides(&self, name: &str) -> bool {
        name == "React"
    }

    fn create_element(&self, tag: &str, _: Vec<Prop>, _: Vec<VisualNode>) -> VisualNode {
        panic!("host cannot build <{}>", tag);
    }

    fn use_state(&self, _: StateSlot, initial: Value) -> Value {
        initial
    }

    fn schedule_effect(&self, _: EffectRequest) -> EffectHandle {
        EffectHandle(0)
    }

    fn cancel_effect(&self, _: EffectHandle) {}
}

const TICKER_SOURCE: &str = r#"const Ticker = () => {
  const [count, setCount] = useState(0);
  useEffect(() => {
    const id = setInterval(() => setCount(1), 1000);
    return () => clearInterval(id);
  }, []);
  return <span className="text-gray-700">{count}</span>;
};
"#;

// ========================================================================
// Transform
// ========================================================================

#[test]
fn test_component_without_render_gets_one() {
    let out = transform(WIDGET_SOURCE);
    assert_eq!(out.target, RenderTarget::Component("Widget".into()));
    assert!(out.code.ends_with("render(<Widget />);"));
    assert_eq!(out.neutralized, 1);
}

#[test]
fn test_transform_always_leaves_one_render_call() {
    let inputs = [
        "",
        "let x = 1;",
        "const App = () => <div />;",
        "render(<A />);\nrender(<B />);\nrender(<C />);",
        "import x from 'y'",
        "const = = => (((",
        "// render(<App />)\nfunction helper() {}",
        "const App = () => { root.render(<p />); return null; };",
        "`",
        "/*",
        "const App = () => <p>Click to render (now)</p>;",
    ];
    for input in inputs {
        assert_eq!(count_render_calls(&transform(input).code), 1, "input: {:?}", input);
    }
}

#[test]
fn test_neutralized_imports_keep_line_numbers() {
    let source = "import React, {\n  useState,\n  useEffect,\n} from 'react';\nimport { motion } from 'framer-motion';\n\nconst App = () => <div />;\nrender(<App />);";
    let out = transform(source);
    assert_eq!(out.code.lines().count(), source.lines().count());
    assert_eq!(out.neutralized, 2);
    for (line, (before, after)) in source.lines().zip(out.code.lines()).enumerate() {
        if before.starts_with("const") || before.starts_with("render") {
            assert_eq!(before, after, "line {}", line + 1);
        }
    }
}

// ========================================================================
// Render
// ========================================================================

#[test]
fn test_widget_renders() {
    let renderer = Renderer::standard();
    let outcome = render(&renderer, 1, WIDGET_SOURCE);
    let tree = outcome.result.tree().expect("widget renders").clone();

    assert_eq!(tree.text().trim(), "Widget");
    let divs = tree.find_by_tag("div");
    assert_eq!(divs.len(), 1);
    assert_eq!(
        divs[0].prop("className").and_then(|v| v.as_str()),
        Some("bg-blue-500 text-white p-4")
    );
}

#[test]
fn test_conditional_early_return_renders_taken_branch() {
    let renderer = Renderer::standard();
    let source = "const App = () => {\n  if (true) {\n    return <p>x</p>;\n  }\n  return <p>y</p>;\n};";
    let outcome = render(&renderer, 1, source);
    let tree = outcome.result.tree().expect("component renders");
    assert_eq!(tree.text(), "x");

    let source = "const App = () => {\n  switch (mode) {\n    case 'a': return <p>a</p>;\n  }\n  return <p>y</p>;\n};";
    let outcome = render(&renderer, 2, source);
    assert_eq!(
        outcome.result.error(),
        Some(&RenderError::Type {
            message: "unsupported statement: switch".into()
        })
    );
}

#[test]
fn test_deeply_nested_source_fails_on_worker_thread() {
    let worker = std::thread::spawn(|| {
        let renderer = Renderer::standard();
        let jsx = format!("render({}{});", "<div>".repeat(1000), "</div>".repeat(1000));
        let parens = format!("render({}1{});", "(".repeat(1000), ")".repeat(1000));
        [jsx, parens]
            .iter()
            .enumerate()
            .map(|(i, source)| renderer.render(i as u64 + 1, source).result)
            .collect::<Vec<_>>()
    });
    let results = worker.join().expect("render thread survives");
    for result in results {
        match result {
            PreviewResult::Failed(RenderError::Syntax { message, .. }) => {
                assert_eq!(message, "Maximum nesting depth exceeded");
            }
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }
}

#[test]
fn test_throwing_component_fails_with_message() {
    let renderer = Renderer::standard();
    let outcome = render(&renderer, 1, THROWING_SOURCE);
    let error = outcome.result.error().expect("render fails").clone();
    assert_eq!(
        error,
        RenderError::Thrown {
            message: "render exploded".into()
        }
    );
    assert!(!error.to_string().is_empty());
    assert!(outcome.sandbox.is_none());
}

#[test]
fn test_failure_keeps_last_good_preview() {
    let mut model = published_model(WIDGET_SOURCE);
    let renderer = Renderer::standard();

    send(
        &mut model,
        Msg::Preview(PreviewMsg::Rendered(render(&renderer, 1, WIDGET_SOURCE))),
    );
    assert!(model.preview.last_good().is_some());

    send(&mut model, Msg::Pipeline(swatch::messages::PipelineMsg::PublishNow));
    send(
        &mut model,
        Msg::Preview(PreviewMsg::Rendered(render(&renderer, 2, THROWING_SOURCE))),
    );

    assert_eq!(model.preview.last_good_version(), Some(1));
    assert_eq!(
        model.preview.last_good().map(|t| t.text().trim().to_string()),
        Some("Widget".to_string())
    );
    assert!(matches!(
        model.preview.result(),
        Some(PreviewResult::Failed(RenderError::Thrown { .. }))
    ));

    // The next success clears the failure
    send(&mut model, Msg::Pipeline(swatch::messages::PipelineMsg::PublishNow));
    send(
        &mut model,
        Msg::Preview(PreviewMsg::Rendered(render(
            &renderer,
            3,
            "const App = () => <p>back</p>;",
        ))),
    );
    assert!(model.preview.failure().is_none());
    assert_eq!(model.preview.last_good_version(), Some(3));
}

#[test]
fn test_stale_render_never_replaces_newer_one() {
    let mut model = published_model("const A = () => <p>one</p>;");
    send(&mut model, Msg::Pipeline(swatch::messages::PipelineMsg::PublishNow));
    let renderer = Renderer::standard();

    // Version 2 finishes first, then the slow version 1 arrives
    let newer = render(&renderer, 2, "const A = () => <p>two</p>;");
    let older = render(&renderer, 1, "const A = () => <p>one</p>;");
    send(&mut model, Msg::Preview(PreviewMsg::Rendered(newer)));
    send(&mut model, Msg::Preview(PreviewMsg::Rendered(older)));

    assert_eq!(model.preview.last_good().map(|t| t.text()), Some("two".to_string()));
    assert_eq!(model.preview.discarded(), 1);
    assert_eq!(model.preview.mounted().map(|s| s.version()), Some(2));
}

// ========================================================================
// Sandbox isolation
// ========================================================================

#[test]
fn test_replaced_sandbox_cancels_its_effects() {
    let scope = Arc::new(CountingScope::default());
    let renderer = Renderer::new(scope.clone());
    let mut model = published_model(TICKER_SOURCE);

    let first = render(&renderer, 1, TICKER_SOURCE);
    let first_effects: Vec<EffectHandle> =
        first.sandbox.as_ref().expect("sandbox").effects().to_vec();
    assert_eq!(first_effects.len(), 1);
    send(&mut model, Msg::Preview(PreviewMsg::Rendered(first)));
    assert_eq!(scope.inner.active_effect_count(), 1);

    send(&mut model, Msg::Pipeline(swatch::messages::PipelineMsg::PublishNow));
    send(
        &mut model,
        Msg::Preview(PreviewMsg::Rendered(render(&renderer, 2, TICKER_SOURCE))),
    );

    assert_eq!(scope.scheduled.load(Ordering::SeqCst), 2);
    assert_eq!(*scope.cancelled.lock().unwrap(), first_effects);
    assert_eq!(scope.inner.active_effect_count(), 1);
    assert_eq!(scope.inner.state_slot_count(), 1);
}

#[test]
fn test_failed_render_leaves_no_effects_behind() {
    let scope = Arc::new(CountingScope::default());
    let renderer = Renderer::new(scope.clone());
    let source = "const App = () => {\n  useEffect(() => {});\n  return missing.value;\n};";

    let outcome = render(&renderer, 1, source);
    assert!(matches!(
        outcome.result,
        PreviewResult::Failed(RenderError::Reference { ref name }) if name == "missing"
    ));
    assert_eq!(scope.scheduled.load(Ordering::SeqCst), 1);
    assert_eq!(scope.inner.active_effect_count(), 0);
}

#[test]
fn test_state_is_not_shared_between_sandboxes() {
    let scope = Arc::new(StandardScope::new());
    let renderer = Renderer::new(scope.clone());
    let a = render(&renderer, 1, TICKER_SOURCE);
    let b = render(&renderer, 2, TICKER_SOURCE);
    assert_eq!(scope.state_slot_count(), 2);
    drop(a);
    assert_eq!(scope.state_slot_count(), 1);
    drop(b);
    assert_eq!(scope.state_slot_count(), 0);
}

#[test]
fn test_host_panic_becomes_internal_error() {
    let renderer = Renderer::new(Arc::new(PanickingScope));
    let outcome = renderer.render(1, "render(<div />);");
    match outcome.result {
        PreviewResult::Failed(RenderError::Internal { message }) => {
            assert!(message.contains("host cannot build <div>"));
        }
        other => panic!("expected internal error, got {:?}", other),
    }

    // The renderer stays usable
    let outcome = renderer.render(2, "render('text');");
    assert!(outcome.result.is_rendered());
}
