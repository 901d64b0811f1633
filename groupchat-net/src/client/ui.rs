//! The synchronous terminal interface, kept behind a trait so the
//! reader/writer tasks depend only on its contract, not on stdio
//! specifically.

use std::io::{self, BufRead, Write};

/// How a line appended to the transcript should be presented. Grounded on
/// the distinction the original client drew between system notices, chat
/// messages, and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    System,
    Chat,
    Error,
}

pub trait Ui: Send {
    /// Updates a persistent status line (e.g. "connected", "key exchange in
    /// progress").
    fn status(&mut self, text: &str);

    /// Appends one line to the scrolling transcript.
    fn append(&mut self, severity: Severity, text: &str);

    /// Blocks for one line of user input, or `None` on EOF.
    fn read_line(&mut self) -> Option<String>;

    /// Low-volume diagnostic output, distinct from the user-facing
    /// transcript.
    fn debug(&mut self, text: &str);
}

/// A plain stdio `Ui`: status lines and transcript both go to stdout,
/// prefixed by severity; input comes from stdin.
pub struct StdioUi {
    stdin: io::BufReader<io::Stdin>,
}

impl Default for StdioUi {
    fn default() -> Self {
        Self {
            stdin: io::BufReader::new(io::stdin()),
        }
    }
}

impl Ui for StdioUi {
    fn status(&mut self, text: &str) {
        println!("-- {text} --");
    }

    fn append(&mut self, severity: Severity, text: &str) {
        let prefix = match severity {
            Severity::System => "*",
            Severity::Chat => " ",
            Severity::Error => "!",
        };
        println!("{prefix} {text}");
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.stdin.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
            Err(_) => None,
        }
    }

    fn debug(&mut self, text: &str) {
        let _ = writeln!(io::stderr(), "[debug] {text}");
    }
}
