use crate::config::EmitterConfig;
use anyhow::Result;
use colored::Colorize;
use std::io::Write;

pub type EmitResult = Result<()>;

#[derive(Debug, Clone, Default)]
pub struct EmitContext {
    pub use_colors: bool,
}

impl EmitContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EmitterConfig) -> Self {
        Self {
            use_colors: config.use_colors,
        }
    }
}

pub trait Emitter {
    type Item;

    fn emit<W: Write>(
        &self,
        item: &Self::Item,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult;

    fn emit_to_string(&self, item: &Self::Item) -> Result<String> {
        let mut buffer = Vec::new();
        let mut context = EmitContext::new();
        self.emit(item, &mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct EmitHelper;

impl EmitHelper {
    pub fn write_line<W: Write>(writer: &mut W, text: &str) -> EmitResult {
        writeln!(writer, "{}", text)?;
        Ok(())
    }

    pub fn write_lines<W: Write>(writer: &mut W, text: &str) -> EmitResult {
        for line in text.lines() {
            Self::write_line(writer, line)?;
        }
        Ok(())
    }

    /// Section header, cyan when the context allows colors.
    pub fn write_header<W: Write>(writer: &mut W, context: &EmitContext, text: &str) -> EmitResult {
        if context.use_colors {
            Self::write_line(writer, &text.cyan().to_string())
        } else {
            Self::write_line(writer, text)
        }
    }
}
