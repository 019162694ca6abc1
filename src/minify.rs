//! Minification strategies
//!
//! Each asset kind has its own [`Minify`] implementation. The strategies are
//! collected in an immutable [`Minifiers`] registry that is built once and
//! shared by every asset in a resolution context.
//!
//! The bundled minifiers are conservative line-level passes; callers needing
//! a full parser-based minifier can plug one in through [`Minifiers::new`].

use std::fmt;

/// A source-to-source minifier.
pub trait Minify: Send + Sync + fmt::Debug {
    fn minify(&self, source: &str) -> String;
}

/// Drops blank lines, whole-line `//` comments and indentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptMinifier;

impl Minify for ScriptMinifier {
    fn minify(&self, source: &str) -> String {
        source
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Strips `/* */` comments and collapses whitespace runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleMinifier;

impl Minify for StyleMinifier {
    fn minify(&self, source: &str) -> String {
        let mut without_comments = String::with_capacity(source.len());
        let mut rest = source;
        while let Some(start) = rest.find("/*") {
            without_comments.push_str(&rest[..start]);
            match rest[start + 2..].find("*/") {
                Some(end) => rest = &rest[start + 2 + end + 2..],
                None => {
                    rest = "";
                }
            }
        }
        without_comments.push_str(rest);

        let mut out = String::with_capacity(without_comments.len());
        let mut pending_space = false;
        for ch in without_comments.chars() {
            if ch.is_whitespace() {
                pending_space = true;
                continue;
            }
            if pending_space && !out.is_empty() && !is_style_punctuation(ch) && !out.ends_with(is_style_punctuation) {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        }
        out
    }
}

fn is_style_punctuation(ch: char) -> bool {
    matches!(ch, '{' | '}' | ';' | ':' | ',' | '>')
}

/// Minifier registry, one strategy per asset kind.
#[derive(Debug)]
pub struct Minifiers {
    script: Box<dyn Minify>,
    style: Box<dyn Minify>,
}

impl Default for Minifiers {
    fn default() -> Self {
        Self::new(Box::new(ScriptMinifier), Box::new(StyleMinifier))
    }
}

impl Minifiers {
    pub fn new(script: Box<dyn Minify>, style: Box<dyn Minify>) -> Self {
        Self { script, style }
    }

    pub fn script(&self) -> &dyn Minify {
        self.script.as_ref()
    }

    pub fn style(&self) -> &dyn Minify {
        self.style.as_ref()
    }
}
