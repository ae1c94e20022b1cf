use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format_object<W: Write, T: Serialize + ?Sized>(
        writer: &mut W,
        obj: &T,
        pretty: bool,
    ) -> Result<()> {
        if pretty {
            serde_json::to_writer_pretty(&mut *writer, obj)?;
        } else {
            serde_json::to_writer(&mut *writer, obj)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}
