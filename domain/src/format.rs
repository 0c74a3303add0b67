//! Output formatting for model replies.
//!
//! The formatter converts raw model text into one of several presentation
//! encodings. The mode is carried as a plain string in the variable bag
//! (`format` key) and parsed case-insensitively; unrecognized modes fall
//! back to plain text.

use serde::{Deserialize, Serialize};

/// Fence markers recognized (and stripped) at the start of a reply.
const FENCE_MARKERS: [&str; 3] = ["```markdown", "```md", "```"];

/// Presentation encoding for a formatted model reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Body re-wrapped in a uniform ```` ```markdown ```` fence
    Markdown,
    /// First line wrapped in bold-cyan escape codes
    Ansi,
    /// Fences stripped, trimmed (default)
    Plain,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Plain
    }
}

impl OutputFormat {
    /// Parse a mode string case-insensitively. Anything unrecognized
    /// (including the empty string) is [`OutputFormat::Plain`].
    pub fn parse(mode: &str) -> Self {
        match mode.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Self::Markdown,
            "ansi" => Self::Ansi,
            _ => Self::Plain,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Ansi => "ansi",
            Self::Plain => "plain",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strip one leading fence marker and one trailing ```` ``` ````, trimmed.
fn strip_fences(text: &str) -> String {
    let mut body = text.trim();
    for marker in FENCE_MARKERS {
        if let Some(rest) = body.strip_prefix(marker) {
            body = rest;
            break;
        }
    }
    body = body.trim_end();
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim().to_string()
}

/// Format raw model text for presentation.
pub fn format_output(text: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Markdown => format!("```markdown\n{}\n```", strip_fences(text)),
        OutputFormat::Ansi => {
            if text.is_empty() {
                return text.to_string();
            }
            let mut lines = text.lines();
            let first = lines.next().unwrap_or("");
            let mut out = format!("\x1b[1;36m{}\x1b[0m", first);
            for line in lines {
                out.push('\n');
                out.push_str(line);
            }
            out
        }
        OutputFormat::Plain => strip_fences(text),
    }
}
