//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;
use packinfo_core::PackInfo;
use std::path::Path;
use std::path::PathBuf;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn is_heading(line: &str) -> bool {
        line.starts_with("----- ")
            || line.starts_with("Compatible (")
            || line.starts_with("Unknown (")
            || line.starts_with("Incompatible (")
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_pack_info(&self, info: &PackInfo) -> Result<()> {
        // Run disagreements are already logged by the core; --quiet keeps the
        // report itself.
        let mut buffer = Vec::new();
        info.render(&mut buffer)?;
        let text = String::from_utf8_lossy(&buffer);

        for line in text.lines() {
            if self.use_colors && Self::is_heading(line) {
                self.term.write_line(&style(line).bold().to_string())?;
            } else {
                self.term.write_line(line)?;
            }
        }

        Ok(())
    }

    fn format_cltools_result(&self, vistrails_dir: &Path, written: &[PathBuf]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let summary = format!(
            "Wrote {} CLTools module(s) to {}",
            written.len(),
            vistrails_dir.display()
        );
        if self.use_colors {
            self.term
                .write_line(&format!("{} {summary}", style("✓").green().bold()))?;
        } else {
            self.term.write_line(&summary)?;
        }

        if self.verbose {
            for path in written {
                self.term.write_line(&format!("  {}", path.display()))?;
            }
        }

        Ok(())
    }

    fn format_replay(&self, directory: &Path, commands: &[String], executed: bool) -> Result<()> {
        if !executed {
            // A dry run exists to show the plan, even with --quiet.
            for command in commands {
                self.term.write_line(command)?;
            }
            return Ok(());
        }
        if self.quiet {
            return Ok(());
        }

        let summary = format!(
            "Replayed {} step(s) in {}",
            commands.len(),
            directory.display()
        );
        if self.use_colors {
            self.term
                .write_line(&format!("{} {summary}", style("✓").green().bold()))?;
        } else {
            self.term.write_line(&summary)?;
        }
        if self.verbose {
            for command in commands {
                self.term.write_line(&format!("  {command}"))?;
            }
        }
        Ok(())
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        // Warnings go to stderr so the report on stdout stays parseable.
        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = term.write_line(&format!("WARNING: {message}"));
        }
    }
}
