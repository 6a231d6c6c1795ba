//! Analyzer finding model and wire decoding.
//!
//! The analysis engine is an external, text-in/findings-out oracle: it
//! receives the concatenated virtual document (plus a fixed language tag) and
//! answers with findings whose 1-based line/column ranges are measured
//! against exactly the text it was sent, `\n` terminators only. This module
//! defines the finding model and parses the small JSON subset we need from
//! the analyzer response, without committing to a full protocol-types
//! dependency.
//!
//! Findings are immutable and never cached beyond a single projection call.

use notebook_core::{TextPosition, TextRange};
use serde_json::{Value, json};

/// Language/kind tag sent with every analysis request. The analyzer uses it
/// to select the notebook-aware analysis mode (cell-boundary delimiters are
/// only recognized in this mode).
pub const NOTEBOOK_LANGUAGE_ID: &str = "ipython";

/// The synchronous pre-step of an analysis round: the exact payload handed to
/// the analyzer transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisInput {
    /// Uri of the notebook the text was built from.
    pub notebook_uri: String,
    /// Language/kind tag recognized by the analyzer.
    pub language_id: String,
    /// The concatenated virtual document.
    pub text: String,
}

impl AnalysisInput {
    /// Encode the request payload.
    pub fn to_value(&self) -> Value {
        json!({
            "uri": self.notebook_uri,
            "language": self.language_id,
            "text": self.text,
        })
    }
}

/// A diagnostic produced against the virtual document's coordinate space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Absolute range in the virtual document (1-based lines).
    pub range: TextRange,
    /// Human-readable message.
    pub message: String,
    /// Rule identifier (e.g. `"python:S1481"`).
    pub rule_key: String,
    /// Optional severity tag, passed through verbatim.
    pub severity: Option<String>,
    /// Secondary location chains explaining the issue.
    pub flows: Vec<Flow>,
    /// Suggested fixes, as virtual-document edit batches.
    pub quick_fixes: Vec<QuickFix>,
}

/// One chain of secondary locations attached to a finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow {
    /// The chain's locations, in analyzer order.
    pub locations: Vec<FlowLocation>,
}

/// A single secondary location inside a [`Flow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowLocation {
    /// Absolute range in the virtual document.
    pub range: TextRange,
    /// Optional step message.
    pub message: Option<String>,
}

/// A suggested fix: one atomic batch of virtual-document edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickFix {
    /// Human-readable fix description.
    pub message: String,
    /// The edits making up the fix. They may land in different cells.
    pub edits: Vec<QuickFixEdit>,
}

/// A single edit of a [`QuickFix`], in virtual-document coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickFixEdit {
    /// The range to replace.
    pub range: TextRange,
    /// Replacement text.
    pub new_text: String,
}

fn range_from_value(value: &Value) -> Option<TextRange> {
    let coord = |key: &str| value.get(key).and_then(Value::as_u64);
    Some(TextRange::new(
        TextPosition::new(coord("startLine")? as u32, coord("startOffset")? as u32),
        TextPosition::new(coord("endLine")? as u32, coord("endOffset")? as u32),
    ))
}

impl Finding {
    /// Parse a finding-shaped JSON value. Returns `None` when the mandatory
    /// fields (`textRange`, `ruleKey`) are missing or malformed.
    pub fn from_value(value: &Value) -> Option<Self> {
        let range = range_from_value(value.get("textRange")?)?;
        let rule_key = value.get("ruleKey").and_then(Value::as_str)?.to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let severity = value
            .get("severity")
            .and_then(Value::as_str)
            .map(str::to_string);
        let flows = value
            .get("flows")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Flow::from_value).collect())
            .unwrap_or_default();
        let quick_fixes = value
            .get("quickFixes")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(QuickFix::from_value).collect())
            .unwrap_or_default();

        Some(Self {
            range,
            message,
            rule_key,
            severity,
            flows,
            quick_fixes,
        })
    }
}

impl Flow {
    /// Parse a flow-shaped JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let locations = value
            .get("locations")?
            .as_array()?
            .iter()
            .filter_map(FlowLocation::from_value)
            .collect();
        Some(Self { locations })
    }
}

impl FlowLocation {
    /// Parse a flow-location-shaped JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let range = range_from_value(value.get("textRange")?)?;
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self { range, message })
    }
}

impl QuickFix {
    /// Parse a quick-fix-shaped JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let message = value.get("message").and_then(Value::as_str)?.to_string();
        let edits = value
            .get("edits")?
            .as_array()?
            .iter()
            .filter_map(QuickFixEdit::from_value)
            .collect();
        Some(Self { message, edits })
    }
}

impl QuickFixEdit {
    /// Parse a quick-fix-edit-shaped JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let range = range_from_value(value.get("textRange")?)?;
        let new_text = value
            .get("newText")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        Some(Self { range, new_text })
    }
}

/// Parse a JSON array of finding values, skipping malformed entries.
pub fn findings_from_value(value: &Value) -> Vec<Finding> {
    value
        .as_array()
        .map(|arr| arr.iter().filter_map(Finding::from_value).collect())
        .unwrap_or_default()
}
