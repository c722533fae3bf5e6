//! Shared helpers for benchmarks

/// A component of roughly `components` sibling cards, each with a few color
/// tokens and an inline style
#[allow(dead_code)]
pub fn make_source(components: usize) -> String {
    let mut out = String::from("import React, { useState } from 'react';\n\n");
    for i in 0..components {
        out.push_str(&format!(
            "const Card{i} = ({{ title }}) => (\n  <div className=\"bg-blue-{shade} text-gray-900 border-slate-200 p-4\" style={{{{ color: '#ff{i:04x}', background: 'rgba(0, 0, 0, 0.{d})' }}}}>\n    <h2 className=\"text-emerald-600\">{{title}}</h2>\n  </div>\n);\n\n",
            i = i,
            shade = [100, 300, 500, 700, 900][i % 5],
            d = i % 10,
        ));
    }
    out.push_str("const App = () => (\n  <main>\n");
    for i in 0..components {
        out.push_str(&format!("    <Card{i} title=\"Card {i}\" />\n", i = i));
    }
    out.push_str("  </main>\n);\n");
    out
}
