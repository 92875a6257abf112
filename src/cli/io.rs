//! JSON output for CLI commands
//!
//! Every command prints a single JSON object to stdout. Logs go to stderr.

use std::io::{self, Write};

use serde::Serialize;

use super::errors::CliResult;

/// Write a JSON document to stdout
pub fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    write_json_to(&mut stdout, value)?;
    stdout.flush()?;
    Ok(())
}

/// Write a JSON document followed by a newline
pub fn write_json_to<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
