//! Directive scanning
//!
//! Source files and cache files carry processing instructions in comments
//! that occupy a whole line:
//!
//! ```text
//! /*# include: ../shared/common.js?v=2 */
//! /*# reference: /srv/www/js/common.js | /js/common.js */
//! /*# configuration: {"minify_scripts":true} */
//! ```
//!
//! Names are matched case-insensitively. A line with anything after the
//! closing `*/` is plain text.

use regex::Regex;

use crate::error::Result;

// The value may not contain `*/`, so a trailing comment after the
// directive keeps the line from matching.
const DIRECTIVE_PATTERN: &str = r"^\s*/\*#\s*([A-Za-z]+)\s*:\s*((?:[^*]|\*+[^*/])*?)\s*\*/\s*$";

/// Marker appended to an include directive whose target does not exist.
pub const FILE_NOT_FOUND_MARKER: &str = "/* File not found */";

/// A recognized processing instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    /// Inline another file; `target` still carries any `?query` suffix
    Include { target: &'a str },
    /// Register a dependency without inlining it
    Reference { absolute: &'a str, relative: &'a str },
    /// Fingerprint the surrounding content was produced under
    Configuration { fingerprint: &'a str },
    Unknown { name: &'a str, value: &'a str },
}

/// One scanned source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Text(&'a str),
    Directive {
        directive: Directive<'a>,
        /// The full original line
        raw: &'a str,
    },
}

/// Line scanner for directive comments. Build once and share.
#[derive(Debug, Clone)]
pub struct DirectiveParser {
    pattern: Regex,
}

impl DirectiveParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(DIRECTIVE_PATTERN)?,
        })
    }

    /// Classify a single line.
    pub fn parse_line<'a>(&self, line: &'a str) -> Line<'a> {
        let Some(captures) = self.pattern.captures(line) else {
            return Line::Text(line);
        };
        let (Some(name), Some(value)) = (captures.get(1), captures.get(2)) else {
            return Line::Text(line);
        };
        let name = name.as_str();
        let value = value.as_str();

        let directive = if name.eq_ignore_ascii_case("include") {
            Directive::Include { target: value }
        } else if name.eq_ignore_ascii_case("reference") {
            let (absolute, relative) = split_reference(value);
            Directive::Reference { absolute, relative }
        } else if name.eq_ignore_ascii_case("configuration") {
            Directive::Configuration { fingerprint: value }
        } else {
            Directive::Unknown { name, value }
        };

        Line::Directive {
            directive,
            raw: line,
        }
    }

    /// Scan text line by line.
    pub fn scan<'p, 'a>(&'p self, text: &'a str) -> impl Iterator<Item = Line<'a>> + 'p
    where
        'a: 'p,
    {
        text.lines().map(move |line| self.parse_line(line))
    }
}

fn split_reference(value: &str) -> (&str, &str) {
    match value.rsplit_once('|') {
        Some((absolute, relative)) => (absolute.trim(), relative.trim()),
        None => (value.trim(), value.trim()),
    }
}

/// Render a directive comment line.
pub fn format_directive(name: &str, value: &str) -> String {
    format!("/*# {}: {} */", name, value)
}

/// Escape markup-significant sequences. Applying it twice changes nothing.
pub fn escape_markup(text: &str) -> String {
    text.replace('<', "&lt;").replace("/>", "/&gt;")
}
