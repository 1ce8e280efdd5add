//! Check command: parse a timesheet and show what it contains.
//!
//! Makes no remote calls; useful for fixing a document before reconciling.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use tsr_core::parse_document;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Path to the timesheet document.
    pub file: PathBuf,

    /// Emit parsed entries as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &CheckArgs) -> Result<()> {
    let document = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let parsed = parse_document(&document);

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&parsed.entries)?)?;
        return Ok(());
    }

    for entry in &parsed.entries {
        let scope = match &entry.task {
            Some(task) => format!("{} / {task}", entry.project),
            None => entry.project.clone(),
        };
        writeln!(
            writer,
            "{} {}..{} {scope}: {}",
            entry.date,
            entry.start.format("%H:%M"),
            entry.end.format("%H:%M"),
            entry.description
        )?;
    }
    if !parsed.skips.is_empty() {
        writeln!(writer, "Skipped:")?;
        for skip in &parsed.skips {
            writeln!(writer, "- line {}: {} ({})", skip.line, skip.text, skip.cause)?;
        }
    }
    writeln!(
        writer,
        "{} entries, {} skipped",
        parsed.entries.len(),
        parsed.skips.len()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    fn write_doc(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("timesheet.txt");
        fs::write(&path, contents).unwrap();
        (temp, path)
    }

    #[test]
    fn check_renders_entries_and_skips() {
        let (_temp, path) = write_doc(
            "\
# date 290125
    timesheet
        Centurion
            9.00 - 12.00 Software design
            99.00 - 12.00 Impossible
        LandCruiser
            Field support
                13.00 - 14.5 Site visit prep
",
        );

        let mut output = Vec::new();
        run(
            &mut output,
            &CheckArgs {
                file: path,
                json: false,
            },
        )
        .unwrap();
        let output = String::from_utf8(output).unwrap();

        assert_snapshot!(output, @r"
        2025-01-29 09:00..12:00 Centurion: Software design
        2025-01-29 13:00..14:30 LandCruiser / Field support: Site visit prep
        Skipped:
        - line 5: 99.00 - 12.00 Impossible (malformed time range)
        2 entries, 1 skipped
        ");
    }

    #[test]
    fn check_emits_json_entries() {
        let (_temp, path) = write_doc(
            "\
# date 290125
    timesheet
        Centurion
            9.00 - 12.00 Software design
",
        );

        let mut output = Vec::new();
        run(
            &mut output,
            &CheckArgs {
                file: path,
                json: true,
            },
        )
        .unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed[0]["project"], "Centurion");
        assert_eq!(parsed[0]["task"], serde_json::Value::Null);
        assert_eq!(parsed[0]["description"], "Software design");
        assert_eq!(parsed[0]["start"], "2025-01-29T09:00:00");
    }
}
