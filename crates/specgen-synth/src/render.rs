//! Source renderers
//!
//! A [`SourceRenderer`] prints IR as target-language text. Renderers own
//! all target syntax (braces, string escaping, attribute syntax); the IR
//! carries none of it.

use crate::ir::{Attribute, Class, Method, SourceUnit, Statement};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Prints source units as text
pub trait SourceRenderer: Send + Sync {
    /// Extension of generated files, without the dot
    fn file_extension(&self) -> &'static str;

    /// Render a unit
    fn render(&self, unit: &SourceUnit) -> String;

    /// File name for a unit: `<ClassName>.<ext>`
    fn file_name(&self, unit: &SourceUnit) -> String {
        let stem = unit
            .class_name()
            .map_or("Generated", |name| name.as_str());
        format!("{stem}.{}", self.file_extension())
    }
}

/// Supported target languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    /// C#
    #[default]
    CSharp,
}

impl TargetLanguage {
    /// Build the renderer
    #[must_use]
    pub fn renderer(self) -> Arc<dyn SourceRenderer> {
        match self {
            Self::CSharp => Arc::new(CSharpRenderer::default()),
        }
    }
}

/// C# renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSharpRenderer {
    indent: &'static str,
}

impl Default for CSharpRenderer {
    fn default() -> Self {
        Self { indent: "    " }
    }
}

impl SourceRenderer for CSharpRenderer {
    fn file_extension(&self) -> &'static str {
        "cs"
    }

    fn render(&self, unit: &SourceUnit) -> String {
        let mut out = CodeWriter::new(self.indent);

        out.line("// <auto-generated>");
        out.line(&format!(
            "//     Generated by specgen from specification {}.",
            string_literal(&unit.source_name)
        ));
        out.line("//     Changes to this file are lost when the output is regenerated.");
        out.line("// </auto-generated>");
        out.line(&format!("namespace {}", unit.namespace.name));
        out.open();

        for import in &unit.namespace.imports {
            out.line(&format!("using {};", import.namespace));
        }

        for class in &unit.namespace.classes {
            out.blank();
            self.render_class(&mut out, class);
        }

        out.close();
        out.finish()
    }
}

impl CSharpRenderer {
    fn render_class(&self, out: &mut CodeWriter, class: &Class) {
        out.line(&format!("public class {}", class.name));
        out.open();

        for (index, method) in class.methods.iter().enumerate() {
            if index > 0 {
                out.blank();
            }
            self.render_method(out, method);
        }

        out.close();
    }

    fn render_method(&self, out: &mut CodeWriter, method: &Method) {
        for attribute in &method.attributes {
            out.line(&render_attribute(attribute));
        }
        out.line(&format!("public void {}()", method.name));
        out.open();

        for statement in &method.body {
            match statement {
                Statement::RunScenario {
                    specification,
                    scenario,
                } => out.line(&format!(
                    "Scenario.CreateRunner({}, {}).Run();",
                    string_literal(specification),
                    string_literal(scenario)
                )),
            }
        }

        out.close();
    }
}

fn render_attribute(attribute: &Attribute) -> String {
    format!("[{}()]", attribute.attribute_type.qualified_name())
}

/// Quote and escape a C# regular string literal
fn string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for c in value.chars() {
        match c {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            '\0' => literal.push_str("\\0"),
            // Line terminators in C# source, but not control characters
            '\u{2028}' => literal.push_str("\\u2028"),
            '\u{2029}' => literal.push_str("\\u2029"),
            c if c.is_control() => literal.push_str(&format!("\\u{:04x}", c as u32)),
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}

/// Indentation-aware line buffer
struct CodeWriter {
    buf: String,
    depth: usize,
    indent: &'static str,
}

impl CodeWriter {
    fn new(indent: &'static str) -> Self {
        Self {
            buf: String::new(),
            depth: 0,
            indent,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buf.push_str(self.indent);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn open(&mut self) {
        self.line("{");
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    fn finish(self) -> String {
        self.buf
    }
}
