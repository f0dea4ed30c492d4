//! Terminal rendering for listings, help pages, outcomes and errors.

use std::fmt::Write as _;

use console::style;

use super::error::DispatchError;
use super::{ListingEntry, Outcome};
use crate::tools::ToolOutput;

pub fn banner() -> String {
    format!("{}", style("🔧 Factotum — Your Personal Assistant").bold().blue())
}

pub fn listing(entries: &[ListingEntry]) -> String {
    let mut out = format!("{}\n", style("🧩 Available tasks:").bold().cyan());
    for entry in entries {
        let _ = writeln!(out, "• {} — {}", style(&entry.id).bold().green(), entry.description);
    }
    out
}

pub fn help(id: &str, text: &str) -> String {
    format!("🧩 {} documentation:\n\n{}", style(id).bold().cyan(), text)
}

pub fn completed(output: &ToolOutput) -> String {
    format!("{}", style(format!("✅ {}", output.content)).green())
}

pub fn outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Listing(entries) => listing(entries),
        Outcome::Help { id, text } => help(id, text),
        Outcome::Completed { output, .. } => completed(output),
    }
}

pub fn error(err: &DispatchError) -> String {
    let mut out = format!("{}", style(format!("❌ {err}")).bold().red());
    if let Some(hint) = err.hint() {
        let _ = write!(out, "\n   {}", style(hint).dim());
    }
    out
}
