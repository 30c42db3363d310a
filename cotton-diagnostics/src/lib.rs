// Diagnostic rendering for the Cotton toolchain.
// Turns byte spans into file:line:column locations and prints
// Rust-style error messages with the offending source line.

use colored::Colorize;
use std::fmt;

/// Source code location resolved from a byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

impl Location {
    pub fn from_span(file: &str, source: &str, span: std::ops::Range<usize>) -> Self {
        let start = span.start.min(source.len());
        let before = &source[..start];
        let line = before.chars().filter(|&c| c == '\n').count() + 1;
        let column = before
            .rfind('\n')
            .map_or(before.len() + 1, |pos| before.len() - pos);
        let length = span.end.saturating_sub(span.start).max(1);

        Self {
            file: file.to_string(),
            line,
            column,
            length,
        }
    }

    pub fn unknown() -> Self {
        Self {
            file: "<unknown>".to_string(),
            line: 0,
            column: 0,
            length: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Level::Error => write!(f, "{}", "error".red().bold()),
            Level::Warning => write!(f, "{}", "warning".yellow().bold()),
            Level::Note => write!(f, "{}", "note".cyan().bold()),
            Level::Help => write!(f, "{}", "help".green().bold()),
        }
    }
}

/// Structured diagnostic message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: std::ops::Range<usize>,
    pub notes: Vec<(String, std::ops::Range<usize>)>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(message: String, span: std::ops::Range<usize>) -> Self {
        Self {
            level: Level::Error,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String, span: std::ops::Range<usize>) -> Self {
        self.notes.push((note, span));
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Format the diagnostic against its source text, Rust-style.
    pub fn format(&self, file: &str, source: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}: {}\n", self.level, self.message.bold()));

        let loc = Location::from_span(file, source, self.span.clone());
        output.push_str(&format!(" {} {}\n", "-->".cyan().bold(), loc));
        output.push_str(&render_snippet(source, &loc));

        for (note, span) in &self.notes {
            let loc = Location::from_span(file, source, span.clone());
            output.push_str(&format!(
                "{}: {} ({})\n",
                Level::Note,
                note,
                loc
            ));
            output.push_str(&render_snippet(source, &loc));
        }

        if let Some(help) = &self.help {
            output.push_str(&format!("{}: {}\n", Level::Help, help));
        }

        output
    }
}

fn render_snippet(source: &str, loc: &Location) -> String {
    let Some(line_text) = source.lines().nth(loc.line.saturating_sub(1)) else {
        return String::new();
    };
    let gutter = format!("{:>4} | ", loc.line);
    let mut out = format!("{}{}\n", gutter.cyan().bold(), line_text);
    let caret_pad = " ".repeat(gutter.len() + loc.column.saturating_sub(1));
    let carets = "^".repeat(loc.length.min(line_text.len().max(1)));
    out.push_str(&format!("{}{}\n", caret_pad, carets.red().bold()));
    out
}

/// Closest match to `name` among `candidates`, for "did you mean" hints.
/// Only reasonably similar names are suggested.
pub fn suggest_similar<'a>(
    name: &str,
    candidates: impl Iterator<Item = &'a str>,
) -> Option<&'a str> {
    candidates
        .map(|c| (strsim::jaro_winkler(name, c), c))
        .filter(|(score, _)| *score > 0.85)
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_span() {
        let source = "first line\nsecond line\nthird";
        let loc = Location::from_span("test.ctn", source, 11..17);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 1);
        assert_eq!(loc.length, 6);
    }

    #[test]
    fn test_location_mid_line() {
        let source = "x = 15;";
        let loc = Location::from_span("test.ctn", source, 4..6);
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 5);
    }

    #[test]
    fn test_suggest_similar() {
        let names = ["println", "printf", "velocity"];
        assert_eq!(
            suggest_similar("printl", names.iter().copied()),
            Some("println")
        );
        assert_eq!(suggest_similar("zzz", names.iter().copied()), None);
    }
}
