//! Collects audit trace lines in emission order.
//!
//! Every calculation step appends a [`CalcLine`] through a builder, and
//! the recorder mints sequential `line-N` ids. Ids restart at 1 for
//! every engine invocation, so they are stable within one trace but not
//! across traces.
//!
//! # Example
//!
//! ```
//! use jptax_core::calculations::recorder::TraceRecorder;
//! use jptax_core::models::Section;
//! use rust_decimal_macros::dec;
//!
//! let mut trace = TraceRecorder::new();
//! trace
//!     .calc(Section::Deduction, "基礎控除")
//!     .expression("年度ルール")
//!     .result(dec!(480000))
//!     .result_key("deduction.basic")
//!     .push();
//!
//! let lines = trace.into_lines();
//! assert_eq!(lines[0].id, "line-1");
//! ```

use rust_decimal::Decimal;

use crate::models::{CalcLine, DisplayKind, Section, Term};

#[derive(Debug)]
pub struct TraceRecorder {
    lines: Vec<CalcLine>,
    next_id: u32,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            next_id: 1,
        }
    }

    /// Starts a calculation line carrying a result amount.
    pub fn calc(&mut self, section: Section, title: impl Into<String>) -> LineBuilder<'_> {
        LineBuilder::new(self, section, title.into(), DisplayKind::Calc)
    }

    /// Starts an informational line. Its result stays empty unless the
    /// builder sets one.
    pub fn info(&mut self, section: Section, title: impl Into<String>) -> LineBuilder<'_> {
        LineBuilder::new(self, section, title.into(), DisplayKind::Info)
    }

    pub fn into_lines(self) -> Vec<CalcLine> {
        self.lines
    }
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LineBuilder<'a> {
    recorder: &'a mut TraceRecorder,
    section: Section,
    title: String,
    display: DisplayKind,
    expression: String,
    terms: Vec<Term>,
    result: Option<Decimal>,
    result_key: Option<String>,
    notes: Vec<String>,
    warnings: Vec<String>,
}

impl<'a> LineBuilder<'a> {
    fn new(
        recorder: &'a mut TraceRecorder,
        section: Section,
        title: String,
        display: DisplayKind,
    ) -> Self {
        Self {
            recorder,
            section,
            title,
            display,
            expression: String::new(),
            terms: Vec::new(),
            result: None,
            result_key: None,
            notes: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = expression.into();
        self
    }

    pub fn term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    pub fn terms(mut self, terms: impl IntoIterator<Item = Term>) -> Self {
        self.terms.extend(terms);
        self
    }

    pub fn result(mut self, value: Decimal) -> Self {
        self.result = Some(value);
        self
    }

    pub fn result_key(mut self, key: impl Into<String>) -> Self {
        self.result_key = Some(key.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Mints the line id and appends the line to the recorder.
    pub fn push(self) {
        let id = format!("line-{}", self.recorder.next_id);
        self.recorder.next_id += 1;
        self.recorder.lines.push(CalcLine {
            id,
            section: self.section,
            title: self.title,
            expression: self.expression,
            terms: self.terms,
            display: self.display,
            result: self.result,
            result_key: self.result_key,
            notes: self.notes,
            warnings: self.warnings,
        });
    }
}
