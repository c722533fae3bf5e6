//! CLI session report tests

mod common;

use clap::Parser;
use common::{settle, studio};
use swatch::cli::{AppliedReplacement, CliArgs, SessionReport};

#[test]
fn test_text_report_lists_files_tokens_and_preview() {
    let (studio, _editor) = studio(10);
    let text = SessionReport::collect(&studio, Vec::new()).to_text();

    assert!(text.contains("* file-1"));
    assert!(text.contains("App.tsx"));
    assert!(text.contains("tokens (v1):"));
    assert!(text.contains("bg-green-700"));
    assert!(text.contains("<button class=\"bg-green-500"));
    assert!(text.contains("--- source ---"));
}

#[test]
fn test_json_report_shape() {
    let (mut studio, _editor) = studio(10);
    let id = studio.active().id;
    let replaced = studio.substitute(id, "#ccc", "#333").unwrap();
    settle(&mut studio);

    let args = CliArgs::parse_from(["swatch", "--replace", "#ccc=#333"]);
    let applied = args
        .replacements
        .into_iter()
        .map(|replacement| AppliedReplacement {
            replacement,
            replaced,
        })
        .collect();
    let report = SessionReport::collect(&studio, applied);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["version"], 2);
    assert_eq!(json["active"], 1);
    assert_eq!(json["replacements"][0]["old"], "#ccc");
    assert_eq!(json["replacements"][0]["replaced"], 1);
    assert_eq!(json["files"][0]["mode"], "typescript");
    assert_eq!(json["preview"]["status"], "rendered");
    assert!(json["source"].as_str().unwrap().contains("#333"));
}

#[test]
fn test_report_shows_failure() {
    let (mut studio, _editor) = studio(10);
    studio.edit("const App = () => { throw new Error('boom'); };").unwrap();
    settle(&mut studio);

    let report = SessionReport::collect(&studio, Vec::new());
    assert!(report.to_text().contains("preview failed: Error: boom"));
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["preview"]["status"], "failed");
    assert_eq!(json["preview"]["value"]["kind"], "thrown");
}
