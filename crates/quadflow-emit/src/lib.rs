/*! Write analysis reports out as text or JSON.
 *
 * The text form is line-for-line what the reports print through `Display`, so output can be diffed
 * against expected files. JSON carries the same facts for tools that would rather not parse text.
 */

pub mod config;
pub mod emitter;
pub mod output;
pub mod report_emitter;

pub use config::EmitterConfig;
pub use emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
pub use output::{JsonFormatter, OutputFormat};
pub use report_emitter::{Report, ReportEmitter};
