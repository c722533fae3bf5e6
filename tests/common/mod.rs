//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::time::Duration;

use swatch::commands::Cmd;
use swatch::config::StudioConfig;
use swatch::messages::Msg;
use swatch::model::{BufferSet, StudioModel};
use swatch::runtime::{HeadlessEditor, Studio};
use swatch::update::{publish_active, update};

/// A component without a render call
pub const WIDGET_SOURCE: &str = r#"import React, { useState } from 'react';

const Widget = () => (
  <div className="bg-blue-500 text-white p-4" style={{ borderColor: '#FF0000' }}>
    Widget
  </div>
);
"#;

/// A component that throws while rendering
pub const THROWING_SOURCE: &str = r#"const Broken = () => {
  throw new Error('render exploded');
};
"#;

/// Config with a given quiet period
pub fn test_config(debounce_ms: u64) -> StudioConfig {
    StudioConfig {
        debounce_ms,
        ..StudioConfig::default()
    }
}

/// Model holding a single `App.tsx` with the given text, nothing published
pub fn test_model(text: &str) -> StudioModel {
    StudioModel::with_buffers(test_config(300), BufferSet::new("App.tsx", text))
}

/// Model holding `text` with version 1 already published
pub fn published_model(text: &str) -> StudioModel {
    let mut model = test_model(text);
    publish_active(&mut model);
    model
}

/// Run a message through `update` and return the flattened commands
pub fn send(model: &mut StudioModel, msg: Msg) -> Vec<Cmd> {
    update(model, msg)
        .expect("update succeeds")
        .map(Cmd::flatten)
        .unwrap_or_default()
}

/// Headless studio with the given quiet period, after its first render
pub fn studio(debounce_ms: u64) -> (Studio, HeadlessEditor) {
    let (mut studio, editor) = Studio::headless(test_config(debounce_ms));
    settle(&mut studio);
    (studio, editor)
}

pub fn settle(studio: &mut Studio) {
    assert!(
        studio
            .run_until_idle(Duration::from_secs(10))
            .expect("loop runs"),
        "studio did not go idle"
    );
}

/// Ticket of the first `SchedulePublish` among `cmds`
pub fn scheduled_ticket(cmds: &[Cmd]) -> Option<u64> {
    cmds.iter().find_map(|c| match c {
        Cmd::SchedulePublish { ticket, .. } => Some(*ticket),
        _ => None,
    })
}

/// Version of the first `RunRender` among `cmds`
pub fn rendered_version(cmds: &[Cmd]) -> Option<u64> {
    cmds.iter().find_map(|c| match c {
        Cmd::RunRender { version, .. } => Some(*version),
        _ => None,
    })
}
