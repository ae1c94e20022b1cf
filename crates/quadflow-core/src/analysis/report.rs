use super::flow::FactTable;
use super::lattice::{DataflowFact, SetFact};
use crate::quad::QuadId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Facts rendered as sorted element lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRow {
    pub id: QuadId,
    #[serde(rename = "in")]
    pub in_fact: Vec<String>,
    #[serde(rename = "out")]
    pub out_fact: Vec<String>,
}

/// Entry, per-quad and exit facts of one method.
///
/// `Display` produces the line format
/// ```text
/// entry: [..]
/// <id> in:  [..]
/// <id> out: [..]
/// exit: [..]
/// ```
/// with one `in`/`out` pair per quad in ascending id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowReport {
    pub method: String,
    pub entry: Vec<String>,
    pub rows: Vec<FactRow>,
    pub exit: Vec<String>,
}

impl FlowReport {
    pub fn from_table<T>(method: impl Into<String>, table: &FactTable<SetFact<T>>) -> Self
    where
        T: Ord + Clone + fmt::Debug + fmt::Display,
        SetFact<T>: DataflowFact,
    {
        Self {
            method: method.into(),
            entry: table.entry().map(render).unwrap_or_default(),
            rows: table
                .rows()
                .map(|(id, in_fact, out_fact)| FactRow {
                    id,
                    in_fact: render(in_fact),
                    out_fact: render(out_fact),
                })
                .collect(),
            exit: table.exit().map(render).unwrap_or_default(),
        }
    }

    pub fn row(&self, id: QuadId) -> Option<&FactRow> {
        self.rows.iter().find(|row| row.id == id)
    }
}

fn render<T: Ord + Clone + fmt::Display>(fact: &SetFact<T>) -> Vec<String> {
    fact.iter().map(ToString::to_string).collect()
}

struct Bracketed<'a>(&'a [String]);

impl fmt::Display for Bracketed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl fmt::Display for FlowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "entry: {}", Bracketed(&self.entry))?;
        for row in &self.rows {
            writeln!(f, "{} in:  {}", row.id, Bracketed(&row.in_fact))?;
            writeln!(f, "{} out: {}", row.id, Bracketed(&row.out_fact))?;
        }
        write!(f, "exit: {}", Bracketed(&self.exit))
    }
}

/// Redundant null checks of one method, printed as `<method> <id0> <id1> ...`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullCheckReport {
    pub method: String,
    pub redundant: Vec<QuadId>,
}

impl fmt::Display for NullCheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.method)?;
        for id in &self.redundant {
            write!(f, " {}", id)?;
        }
        Ok(())
    }
}
