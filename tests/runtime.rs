//! Studio runtime tests
//!
//! Drive a headless studio through its public operations and check the
//! buffers, the canonical source, the preview and the editor widget.

mod common;

use std::time::Duration;

use common::{settle, studio, WIDGET_SOURCE};
use swatch::languages::LanguageMode;
use swatch::model::{FileId, DEFAULT_SOURCE};
use swatch::palette::TokenKind;

// ========================================================================
// Session start
// ========================================================================

#[test]
fn test_new_session_has_default_file() {
    let (studio, editor) = studio(10);
    let files = studio.list_files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "App.tsx");
    assert_eq!(files[0].mode, LanguageMode::TypeScript);

    assert_eq!(studio.active().text(), DEFAULT_SOURCE);
    assert_eq!(editor.text(), DEFAULT_SOURCE);
    assert_eq!(editor.file_id(), Some(studio.active().id));
    assert_eq!(studio.tokens().len(), 5);

    let tree = studio.preview().last_good().expect("default file renders");
    assert_eq!(tree.find_by_tag("button").len(), 1);
    assert!(tree.text().contains("Click Me"));
}

// ========================================================================
// Files
// ========================================================================

#[test]
fn test_import_makes_last_file_active() {
    let (mut studio, editor) = studio(10);
    let ids = studio
        .import_files(vec![
            ("Card.jsx", "const Card = () => <p>card</p>;"),
            ("Widget.tsx", WIDGET_SOURCE),
        ])
        .unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(studio.active().id, ids[1]);
    assert_eq!(studio.list_files().len(), 3);
    assert_eq!(studio.list_files()[1].mode, LanguageMode::JavaScript);

    // The switch published synchronously
    assert_eq!(studio.canonical().map(|c| c.file_id), Some(ids[1]));
    assert_eq!(editor.text(), WIDGET_SOURCE);

    settle(&mut studio);
    assert_eq!(
        studio.preview().last_good().map(|t| t.text().trim().to_string()),
        Some("Widget".to_string())
    );
}

#[test]
fn test_import_nothing_keeps_active_file() {
    let (mut studio, editor) = studio(10);
    let active = studio.active().id;
    let updates = editor.updates();
    let ids = studio.import_files(Vec::<(String, String)>::new()).unwrap();
    assert!(ids.is_empty());
    assert_eq!(studio.active().id, active);
    assert_eq!(editor.updates(), updates);
}

#[test]
fn test_set_active_switches_editor_and_preview() {
    let (mut studio, editor) = studio(10);
    let first = studio.active().id;
    studio
        .import_files(vec![("Other.tsx", "const Other = () => <p>other</p>;")])
        .unwrap();
    settle(&mut studio);

    studio.set_active(first).unwrap();
    assert_eq!(editor.file_id(), Some(first));
    assert_eq!(editor.text(), DEFAULT_SOURCE);
    settle(&mut studio);
    assert!(studio
        .preview()
        .last_good()
        .is_some_and(|t| t.text().contains("Hello World")));
}

#[test]
fn test_set_active_unknown_is_not_found() {
    let (mut studio, _editor) = studio(10);
    let version = studio.canonical().map(|c| c.version);
    let err = studio.set_active(FileId(404)).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "source file file-404 not found");
    assert_eq!(studio.canonical().map(|c| c.version), version);
}

#[test]
fn test_import_paths_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("Badge.tsx");
    std::fs::write(&good, "const Badge = () => <span className=\"bg-pink-300\">new</span>;").unwrap();
    let missing = dir.path().join("Missing.tsx");

    let (mut studio, _editor) = studio(10);
    studio.import_paths(vec![missing, good]).unwrap();
    settle(&mut studio);

    let files = studio.list_files();
    assert_eq!(files.len(), 2);
    assert_eq!(files[1].name, "Badge.tsx");
    assert_eq!(studio.active().id, files[1].id);
    assert_eq!(studio.tokens()[0].text, "bg-pink-300");
    assert_eq!(
        studio.preview().last_good().map(|t| t.text()),
        Some("new".to_string())
    );
}

// ========================================================================
// Edits
// ========================================================================

#[test]
fn test_edit_reaches_preview_after_quiet_period() {
    let (mut studio, editor) = studio(20);
    let updates = editor.updates();
    studio.edit("const App = () => <h2>edited</h2>;").unwrap();
    assert_eq!(studio.active().text(), "const App = () => <h2>edited</h2>;");
    settle(&mut studio);

    assert_eq!(
        studio.preview().last_good().map(|t| t.text()),
        Some("edited".to_string())
    );
    // Edits come from the editor, so nothing is pushed back into it
    assert_eq!(editor.updates(), updates);
}

#[test]
fn test_broken_edit_keeps_previous_preview() {
    let (mut studio, _editor) = studio(10);
    let before = studio.preview().last_good().cloned();
    studio.edit("const App = () => <div>;").unwrap();
    settle(&mut studio);

    assert_eq!(studio.preview().last_good().cloned(), before);
    let failure = studio.preview().failure().expect("syntax error shown");
    assert!(failure.to_string().starts_with("SyntaxError"));
}

// ========================================================================
// Substitution
// ========================================================================

#[test]
fn test_substitute_active_file_republishes() {
    let (mut studio, editor) = studio(10);
    let id = studio.active().id;
    let version = studio.canonical().map(|c| c.version).unwrap();

    let replaced = studio.substitute(id, "bg-blue-500", "bg-red-500").unwrap();
    assert_eq!(replaced, 1);
    assert_eq!(studio.canonical().map(|c| c.version), Some(version + 1));
    assert!(editor.text().contains("bg-red-500"));
    assert!(!studio.tokens().iter().any(|t| t.text == "bg-blue-500"));

    settle(&mut studio);
    let tree = studio.preview().last_good().expect("renders");
    let divs = tree.find_by_tag("div");
    assert!(divs[0]
        .prop("className")
        .and_then(|v| v.as_str())
        .is_some_and(|c| c.starts_with("bg-red-500")));
}

#[test]
fn test_substitute_inactive_file_does_not_publish() {
    let (mut studio, _editor) = studio(10);
    let first = studio.active().id;
    studio
        .import_files(vec![("B.tsx", "const B = () => <p>b</p>;")])
        .unwrap();
    let version = studio.canonical().map(|c| c.version);

    assert_eq!(studio.substitute(first, "#fff", "#000").unwrap(), 1);
    assert_eq!(studio.canonical().map(|c| c.version), version);
    assert!(studio.model().buffers.get(first).unwrap().text().contains("#000"));
}

#[test]
fn test_substitute_unknown_file() {
    let (mut studio, _editor) = studio(10);
    assert!(studio
        .substitute(FileId(12), "#fff", "#000")
        .is_err_and(|e| e.is_not_found()));
}

#[test]
fn test_select_and_apply_color() {
    let (mut studio, editor) = studio(10);
    assert!(!studio.select_token("bg-purple-500").unwrap());
    assert!(studio.select_token("bg-green-500").unwrap());

    let variants = studio.variants();
    assert!(variants.contains(&"bg-purple-500".to_string()));
    assert!(!variants.contains(&"bg-green-500".to_string()));

    assert_eq!(studio.apply_color("bg-purple-500").unwrap(), 1);
    assert!(editor.text().contains("bg-purple-500"));
    let token = studio
        .tokens()
        .iter()
        .find(|t| t.text == "bg-purple-500")
        .expect("new token detected");
    assert_eq!(token.kind, TokenKind::UtilityClass);

    // The selection is consumed
    assert_eq!(studio.apply_color("bg-pink-500").unwrap(), 0);
}

// ========================================================================
// Environment
// ========================================================================

#[test]
fn test_editor_environment_comes_from_config() {
    let (studio, _editor) = studio(10);
    let env = studio.editor_environment();
    assert_eq!(env.worker_url("typescript"), "./ts.worker.js");
    assert_eq!(env.worker_url("json"), "./editor.worker.js");
}

#[test]
fn test_run_until_idle_with_nothing_to_do() {
    let (mut studio, _editor) = studio(10);
    assert!(studio.is_idle());
    assert!(studio.run_until_idle(Duration::from_millis(1)).unwrap());
    assert_eq!(studio.pump().unwrap(), 0);
}
