//! Human-readable run log written next to the group files.

use std::path::Path;
use tracing::debug;

use crate::error::{KcellError, KcellResult};

/// Accumulates the diagnostic log of a run.
///
/// Every line is echoed as a `debug` event so the log is visible without
/// opening the diag file.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    lines: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line.
    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        let line = line.into();
        debug!(target: "kcell::diag", "{}", line);
        self.lines.push(line);
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    /// Append a `----title----` banner.
    pub fn section(&mut self, title: &str) -> &mut Self {
        self.line(format!("----------------{}----------------", title))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines joined with newlines, with a trailing newline.
    pub fn as_text(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> KcellResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.as_text()).map_err(|e| KcellError::write(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_layout() {
        let mut diag = Diagnostics::new();
        diag.line("Minimum NOx emission: 1000 mole/hr")
            .blank()
            .section("Matches");

        assert_eq!(diag.len(), 3);
        assert_eq!(
            diag.as_text(),
            "Minimum NOx emission: 1000 mole/hr\n\n----------------Matches----------------\n"
        );
    }

    #[test]
    fn test_empty() {
        let diag = Diagnostics::new();
        assert!(diag.is_empty());
        assert_eq!(diag.as_text(), "");
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.diag");

        let mut diag = Diagnostics::new();
        diag.line("one").line("two");
        diag.write_to(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("run.diag");
        assert!(matches!(
            Diagnostics::new().write_to(&path),
            Err(KcellError::Write { .. })
        ));
    }
}
