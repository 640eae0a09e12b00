//! Per-letter inspection reports.

use crate::config::OutputFormat;
use letter_wire::{LegacyMessage, Letter, ParamOrder, ValidationErrors};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};

/// Longest body excerpt shown in text reports
const BODY_PREVIEW_CHARS: usize = 48;

/// Decoded values the inspector knows how to report and re-encode
pub trait Inspect {
    /// Kind line or legacy `type` header
    fn kind_label(&self) -> String;
    /// Params or legacy headers
    fn fields(&self) -> &HashMap<String, String>;
    /// Raw body
    fn body(&self) -> &[u8];
    /// Structural validation result
    fn check(&self) -> Result<(), ValidationErrors>;
    /// Write the canonical wire form
    fn encode<W: Write>(&self, writer: &mut W, order: ParamOrder) -> io::Result<()>;
}

impl Inspect for Letter {
    fn kind_label(&self) -> String {
        self.kind.to_string()
    }

    fn fields(&self) -> &HashMap<String, String> {
        &self.params
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn check(&self) -> Result<(), ValidationErrors> {
        self.validate()
    }

    fn encode<W: Write>(&self, writer: &mut W, order: ParamOrder) -> io::Result<()> {
        self.write_with(writer, order)
    }
}

impl Inspect for LegacyMessage {
    fn kind_label(&self) -> String {
        self.message_type().to_string()
    }

    fn fields(&self) -> &HashMap<String, String> {
        &self.header
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn check(&self) -> Result<(), ValidationErrors> {
        self.validate()
    }

    fn encode<W: Write>(&self, writer: &mut W, order: ParamOrder) -> io::Result<()> {
        self.write_with(writer, order)
    }
}

/// Summary of one decoded letter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LetterReport {
    /// 1-based position in the stream
    pub index: u64,
    /// Canonical kind spelling
    pub kind: String,
    /// Params in key order
    pub params: BTreeMap<String, String>,
    /// Body, lossily decoded as UTF-8
    pub body: String,
    /// Body length in bytes
    pub body_len: usize,
    /// Every validation error, empty when valid
    pub errors: Vec<String>,
}

impl LetterReport {
    /// Build the report for the `index`-th value of the stream
    pub fn new<T: Inspect>(index: u64, value: &T) -> Self {
        let errors = match value.check() {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        };

        Self {
            index,
            kind: value.kind_label(),
            params: value
                .fields()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            body: String::from_utf8_lossy(value.body()).into_owned(),
            body_len: value.body().len(),
            errors,
        }
    }

    /// Whether the letter passed validation
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Render as a single line
    pub fn render(&self, output: OutputFormat) -> anyhow::Result<String> {
        match output {
            OutputFormat::Json => Ok(serde_json::to_string(self)?),
            OutputFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={:?}", k, v))
            .collect::<Vec<_>>()
            .join(" ");

        let mut preview: String = self.body.chars().take(BODY_PREVIEW_CHARS).collect();
        if self.body.chars().count() > BODY_PREVIEW_CHARS {
            preview.push('…');
        }

        let status = if self.is_valid() {
            "ok".to_string()
        } else {
            format!("invalid: {}", self.errors.join("; "))
        };

        format!(
            "#{} {} [{}] body({}B)={:?} {}",
            self.index, self.kind, params, self.body_len, preview, status
        )
    }
}
