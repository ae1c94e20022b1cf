/*! CFG rewrites run ahead of an analysis.
 *
 * Rewrites collect every site from an unmodified snapshot of the graph before changing anything, so
 * blocks they create are never revisited.
 */

mod materialize;

pub use materialize::{materialize_null_checks, MaterializeStats};
