//! Injected collaborator traits: URI-template expansion and diagnostics.
//!
//! Both are capabilities the engine consumes but does not own. The provided
//! defaults cover tests and simple hosts; real deployments inject their own
//! implementations (an RFC 6570 expander, a structured diagnostics pipeline).

use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Variables for URI-template expansion.
pub type TemplateVars = BTreeMap<String, String>;

/// Expands URI templates.
pub trait TemplateExpander: Send + Sync {
    /// Expands `template` with the given variables.
    fn expand(&self, template: &str, vars: &TemplateVars) -> String;
}

/// A minimal expander performing `{name}` substitution.
///
/// Covers simple path templates only; hosts needing full RFC 6570 semantics
/// (query expansion, exploded lists, ...) inject their own implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleExpander;

impl TemplateExpander for SimpleExpander {
    fn expand(&self, template: &str, vars: &TemplateVars) -> String {
        let mut expanded = template.to_string();
        for (name, value) in vars {
            expanded = expanded.replace(&format!("{{{name}}}"), value);
        }
        expanded
    }
}

/// Receives non-fatal link-usage diagnostics.
pub trait DiagnosticsSink: Send + Sync {
    /// Reports a warning.
    fn warn(&self, message: &str);
}

/// Routes diagnostics to `tracing::warn!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Records diagnostics in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded messages in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn warn(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
