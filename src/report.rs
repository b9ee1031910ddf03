//! Plain-text reports of a [`ParseResult`].
//!
//! One line per entry, in stored order. Writer errors propagate unchanged.

use crate::applier::ParseResult;
use crate::pair::PairSet;
use std::io::{self, Write};

/// Writes each pair as `first <-> second`.
pub fn write_pairs<W: Write>(pairs: &PairSet, out: &mut W) -> io::Result<()> {
    for pair in pairs {
        writeln!(out, "{pair}")?;
    }
    Ok(())
}

/// Writes the pairs the semantic description disabled.
pub fn write_disabled_pairs<W: Write>(result: &ParseResult, out: &mut W) -> io::Result<()> {
    write_pairs(&result.disabled, out)
}

/// Writes the pairs that were registered on the model.
pub fn write_added_pairs<W: Write>(result: &ParseResult, out: &mut W) -> io::Result<()> {
    write_pairs(&result.added, out)
}

pub fn write_diagnostics<W: Write>(result: &ParseResult, out: &mut W) -> io::Result<()> {
    for diagnostic in &result.diagnostics {
        writeln!(out, "{diagnostic}")?;
    }
    Ok(())
}
