use crate::config::EmitterConfig;
use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
use crate::output::{JsonFormatter, OutputFormat};
use anyhow::Result;
use quadflow_core::{FlowReport, NullCheckReport};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::marker::PhantomData;

/// A per-method analysis result that can be printed and serialized.
pub trait Report: Serialize + fmt::Display {
    fn method(&self) -> &str;
}

impl Report for FlowReport {
    fn method(&self) -> &str {
        &self.method
    }
}

impl Report for NullCheckReport {
    fn method(&self) -> &str {
        &self.method
    }
}

pub struct ReportEmitter<R> {
    config: EmitterConfig,
    _report: PhantomData<fn(&R)>,
}

impl<R: Report> ReportEmitter<R> {
    pub fn new(config: EmitterConfig) -> Self {
        Self {
            config,
            _report: PhantomData,
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Emits the reports of several methods. JSON output is a single array.
    pub fn emit_all<W: Write>(&self, reports: &[R], writer: &mut W) -> EmitResult {
        match self.config.format {
            OutputFormat::Text => {
                let context = EmitContext::from_config(&self.config);
                for report in reports {
                    self.emit_text(report, writer, &context)?;
                }
                Ok(())
            }
            OutputFormat::Json => {
                JsonFormatter::format_object(writer, reports, self.config.pretty_json)
            }
        }
    }

    pub fn emit_all_to_string(&self, reports: &[R]) -> Result<String> {
        let mut buffer = Vec::new();
        self.emit_all(reports, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn emit_text<W: Write>(
        &self,
        report: &R,
        writer: &mut W,
        context: &EmitContext,
    ) -> EmitResult {
        if self.config.method_headers {
            EmitHelper::write_header(writer, context, &format!("Method: {}", report.method()))?;
        }
        EmitHelper::write_lines(writer, &report.to_string())
    }
}

impl<R: Report> Default for ReportEmitter<R> {
    fn default() -> Self {
        Self::new(EmitterConfig::default())
    }
}

impl<R: Report> Emitter for ReportEmitter<R> {
    type Item = R;

    fn emit<W: Write>(&self, item: &R, writer: &mut W, context: &mut EmitContext) -> EmitResult {
        match self.config.format {
            OutputFormat::Text => self.emit_text(item, writer, context),
            OutputFormat::Json => {
                JsonFormatter::format_object(writer, item, self.config.pretty_json)
            }
        }
    }

    fn emit_to_string(&self, item: &R) -> Result<String> {
        let mut buffer = Vec::new();
        let mut context = EmitContext::from_config(&self.config);
        self.emit(item, &mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quadflow_core::QuadId;

    fn report() -> NullCheckReport {
        NullCheckReport {
            method: "foo".to_string(),
            redundant: vec![QuadId(3), QuadId(11)],
        }
    }

    #[test]
    fn test_text_matches_display() {
        let emitter = ReportEmitter::default();
        assert_eq!(emitter.emit_to_string(&report()).unwrap(), "foo 3 11\n");
    }

    #[test]
    fn test_method_header() {
        let emitter = ReportEmitter::new(EmitterConfig::default().with_method_headers(true));
        assert_eq!(
            emitter.emit_to_string(&report()).unwrap(),
            "Method: foo\nfoo 3 11\n"
        );
    }

    #[test]
    fn test_compact_json() {
        let config = EmitterConfig {
            pretty_json: false,
            ..EmitterConfig::json()
        };
        let emitter = ReportEmitter::new(config);
        assert_eq!(
            emitter.emit_to_string(&report()).unwrap(),
            "{\"method\":\"foo\",\"redundant\":[3,11]}\n"
        );
    }
}
