//! Source-to-preview transformation
//!
//! Turns an editor buffer into a script the sandbox can evaluate:
//! - module declarations (`import`, `require`, `export`) are neutralized,
//!   since dependencies come from the host scope
//! - exactly one top-level `render(...)` call is left in place, synthesized
//!   when the source has none
//!
//! The transform is total. It works on text and a comment/string mask, never
//! on a parse tree, so malformed input still comes out with a render call and
//! all diagnosis is left to the renderer.

use std::sync::OnceLock;

use regex::bytes::Regex as BytesRegex;
use regex::{Captures, Regex};
use serde::Serialize;

/// Render call appended when no component declaration can be found
pub const FALLBACK_RENDER: &str = "render(() => <div>Preview not available</div>);";

/// What the render call in the transformed source points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum RenderTarget {
    /// The source already rendered something
    Existing,
    /// A synthetic call for a detected component
    Component(String),
    /// A synthetic call for the placeholder component
    Fallback,
}

/// Output of [`transform`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedSource {
    pub code: String,
    pub target: RenderTarget,
    /// Module declarations rewritten into comments
    pub neutralized: usize,
}

/// Transform raw source into evaluable preview source
pub fn transform(source: &str) -> TransformedSource {
    let (mut code, neutralized) = neutralize_modules(source);

    let mask = code_mask(&code);
    let calls = render_call_sites(&mask);

    let target = if calls.is_empty() {
        if let Some(closer) = unclosed_literal(&code) {
            code.push('\n');
            code.push_str(closer);
        }
        let target = match detect_component(&mask) {
            Some(name) => {
                code.push_str(&format!("\n\nrender(<{} />);", name));
                RenderTarget::Component(name)
            }
            None => {
                code.push_str("\n\n");
                code.push_str(FALLBACK_RENDER);
                RenderTarget::Fallback
            }
        };
        tracing::debug!(?target, "appended synthetic render call");
        target
    } else {
        // Keep the last call; earlier ones become `void(...)` expressions.
        // Ranges are rewritten back to front so offsets stay valid.
        for &start in calls[..calls.len() - 1].iter().rev() {
            code.replace_range(start..start + "render".len(), "void");
        }
        RenderTarget::Existing
    };

    TransformedSource {
        code,
        target,
        neutralized,
    }
}

/// Number of top-level render invocations in `code`
pub fn count_render_calls(code: &str) -> usize {
    render_call_sites(&code_mask(code)).len()
}

// ============================================================================
// Code mask
// ============================================================================

/// Copy of `source` with comments and string literals blanked to spaces
///
/// Newlines survive so line structure is unchanged, and byte offsets line up
/// with the source. Single and double quoted strings end at the end of their
/// line; an unterminated quote (an apostrophe in JSX text) is ordinary code.
pub(crate) fn code_mask(source: &str) -> Vec<u8> {
    let bytes = source.as_bytes();
    let mut mask = bytes.to_vec();
    let mut i = 0;

    while i < bytes.len() {
        match literal_at(bytes, i) {
            Some((end, _)) => {
                for b in &mut mask[i..end] {
                    if *b != b'\n' {
                        *b = b' ';
                    }
                }
                i = end;
            }
            None => i += 1,
        }
    }

    mask
}

/// Text that closes a comment or template literal left open at the end
fn unclosed_literal(source: &str) -> Option<&'static str> {
    let bytes = source.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match literal_at(bytes, i) {
            Some((_, Some(closer))) => return Some(closer),
            Some((end, None)) => i = end,
            None => i += 1,
        }
    }
    None
}

/// Comment or string literal starting at byte `i`
///
/// Returns where it ends, plus its closing text when it runs to the end of
/// input unterminated.
fn literal_at(bytes: &[u8], i: usize) -> Option<(usize, Option<&'static str>)> {
    let next = bytes.get(i + 1).copied();
    match bytes[i] {
        b'/' if next == Some(b'/') => {
            Some((find_byte(bytes, i, b'\n').unwrap_or(bytes.len()), None))
        }
        b'/' if next == Some(b'*') => Some(match find_seq(bytes, i + 2, b"*/") {
            Some(p) => (p + 2, None),
            None => (bytes.len(), Some("*/")),
        }),
        q @ (b'\'' | b'"') => line_string_end(bytes, i, q).map(|end| (end, None)),
        b'`' => Some(match template_end(bytes, i) {
            Some(end) => (end, None),
            None => (bytes.len(), Some("`")),
        }),
        _ => None,
    }
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..].iter().position(|b| *b == needle).map(|p| p + from)
}

fn find_seq(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn line_string_end(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'\n' => return None,
            b if b == quote => return Some(j + 1),
            _ => j += 1,
        }
    }
    None
}

fn template_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'`' => return Some(j + 1),
            _ => j += 1,
        }
    }
    None
}

/// Brace depth at every byte of the mask
fn brace_depths(mask: &[u8]) -> Vec<u32> {
    let mut depth: u32 = 0;
    mask.iter()
        .map(|b| {
            let here = depth;
            match *b {
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            here
        })
        .collect()
}

// ============================================================================
// Module declarations
// ============================================================================

struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

struct ModulePattern {
    regex: fn() -> &'static Regex,
    rewrite: fn(&Captures) -> String,
    counts_as_import: bool,
}

fn import_from_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^([ \t]*)import\s+([^;'"]+?)\s+from\s*['"]([^'"\n]+)['"][ \t]*;?"#)
            .expect("import pattern is valid")
    })
}

fn import_bare_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^([ \t]*)import\s*['"]([^'"\n]+)['"][ \t]*;?"#)
            .expect("side-effect import pattern is valid")
    })
}

fn require_binding_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)^([ \t]*)(?:const|let|var)\s+([^=;]+?)\s*=\s*require\s*\(\s*['"]([^'"\n]+)['"]\s*\)[ \t]*;?"#,
        )
        .expect("require pattern is valid")
    })
}

fn require_bare_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^([ \t]*)require\s*\(\s*['"]([^'"\n]+)['"]\s*\)[ \t]*;?"#)
            .expect("bare require pattern is valid")
    })
}

fn export_decl_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^([ \t]*)export[ \t]+(?:default[ \t]+)?(const|let|var|function|class|async)\b")
            .expect("export declaration pattern is valid")
    })
}

fn export_default_expr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^([ \t]*)export[ \t]+default[ \t]+(\(|[A-Za-z_$][\w$]*[ \t]*=>)")
            .expect("export default expression pattern is valid")
    })
}

fn export_default_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^([ \t]*)export[ \t]+default[ \t]+([A-Za-z_$][\w$]*)[ \t]*;?[ \t]*$")
            .expect("export default name pattern is valid")
    })
}

fn export_list_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^([ \t]*)export\s*\{([^}]*)\}[ \t]*;?")
            .expect("export list pattern is valid")
    })
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Patterns in priority order; earlier patterns win overlapping matches
fn module_patterns() -> [ModulePattern; 8] {
    [
        ModulePattern {
            regex: import_from_regex,
            rewrite: |c| {
                format!(
                    "{}// Import for {} from {} is provided",
                    &c[1],
                    collapse_ws(&c[2]),
                    &c[3]
                )
            },
            counts_as_import: true,
        },
        ModulePattern {
            regex: import_bare_regex,
            rewrite: |c| format!("{}// Import of {} is provided", &c[1], &c[2]),
            counts_as_import: true,
        },
        ModulePattern {
            regex: require_binding_regex,
            rewrite: |c| {
                format!(
                    "{}// Import for {} from {} is provided",
                    &c[1],
                    collapse_ws(&c[2]),
                    &c[3]
                )
            },
            counts_as_import: true,
        },
        ModulePattern {
            regex: require_bare_regex,
            rewrite: |c| format!("{}// Import of {} is provided", &c[1], &c[2]),
            counts_as_import: true,
        },
        ModulePattern {
            regex: export_decl_regex,
            rewrite: |c| format!("{}{}", &c[1], &c[2]),
            counts_as_import: false,
        },
        ModulePattern {
            regex: export_default_name_regex,
            rewrite: |c| format!("{}// export default {}", &c[1], &c[2]),
            counts_as_import: false,
        },
        ModulePattern {
            regex: export_default_expr_regex,
            rewrite: |c| format!("{}const DefaultExport = {}", &c[1], &c[2]),
            counts_as_import: false,
        },
        ModulePattern {
            regex: export_list_regex,
            rewrite: |c| format!("{}// export {{ {} }}", &c[1], collapse_ws(&c[2])),
            counts_as_import: false,
        },
    ]
}

/// Rewrite module declarations found in code positions
///
/// Returns the new text and how many import/require declarations were
/// neutralized. Replacements that swallow newlines pad with `//` lines so
/// every following line keeps its number.
fn neutralize_modules(source: &str) -> (String, usize) {
    let mask = code_mask(source);
    let mut edits: Vec<Edit> = Vec::new();
    let mut imports = 0;

    for pattern in module_patterns() {
        for caps in (pattern.regex)().captures_iter(source) {
            let (Some(whole), Some(indent)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let keyword = indent.end();
            // Keyword must be real code, not inside a comment or string
            if mask.get(keyword) != source.as_bytes().get(keyword) {
                continue;
            }
            if edits
                .iter()
                .any(|e| whole.start() < e.end && e.start < whole.end())
            {
                continue;
            }
            let mut replacement = (pattern.rewrite)(&caps);
            for _ in 0..whole.as_str().matches('\n').count() {
                replacement.push_str("\n//");
            }
            if pattern.counts_as_import {
                imports += 1;
            }
            edits.push(Edit {
                start: whole.start(),
                end: whole.end(),
                replacement,
            });
        }
    }

    if edits.is_empty() {
        return (source.to_string(), 0);
    }

    edits.sort_by_key(|e| e.start);
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in &edits {
        out.push_str(&source[cursor..edit.start]);
        out.push_str(&edit.replacement);
        cursor = edit.end;
    }
    out.push_str(&source[cursor..]);

    tracing::debug!(imports, edits = edits.len(), "neutralized module declarations");
    (out, imports)
}

// ============================================================================
// Render calls and component detection
// ============================================================================

fn render_call_regex() -> &'static BytesRegex {
    static RE: OnceLock<BytesRegex> = OnceLock::new();
    RE.get_or_init(|| BytesRegex::new(r"\brender\(").expect("render call pattern is valid"))
}

/// Byte offsets of top-level `render(` invocations
///
/// Method calls (`root.render(`) and definitions (`function render(`) are
/// not invocations of the entry point.
fn render_call_sites(mask: &[u8]) -> Vec<usize> {
    render_call_regex()
        .find_iter(mask)
        .map(|m| m.start())
        .filter(|&start| {
            let before = mask[..start].trim_ascii_end();
            !before.ends_with(b".") && !before.ends_with(b"function")
        })
        .collect()
}

fn component_regex() -> &'static BytesRegex {
    static RE: OnceLock<BytesRegex> = OnceLock::new();
    RE.get_or_init(|| {
        BytesRegex::new(
            r"\b(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=;]*)?=\s*(?:async\s+)?(?:\([^()]*\)|[A-Za-z_$][\w$]*)\s*=>|\bfunction\s+([A-Za-z_$][\w$]*)\s*\(",
        )
        .expect("component pattern is valid")
    })
}

/// Pick the component a synthetic render call should mount
///
/// Among top-level declarations: `App` if present, otherwise the last
/// capitalized one (roots tend to be declared after their children),
/// otherwise the first arrow or function of any case.
fn detect_component(mask: &[u8]) -> Option<String> {
    let depths = brace_depths(mask);
    let names: Vec<String> = component_regex()
        .captures_iter(mask)
        .filter(|c| c.get(0).is_some_and(|m| depths[m.start()] == 0))
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        .collect();

    if names.iter().any(|n| n == "App") {
        return Some("App".to_string());
    }
    names
        .iter()
        .rev()
        .find(|n| n.starts_with(|c: char| c.is_ascii_uppercase()))
        .or_else(|| names.first())
        .cloned()
}
