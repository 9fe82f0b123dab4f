//! Canonical forms for example input values.
//!
//! Values arrive as text cut out of documentation: possibly quoted, possibly
//! followed by a `# comment`, possibly a multi-line block. Everything here
//! reduces that text to what the action would actually receive, or reports
//! [`Normalized::Skip`] when the value depends on a runtime expression that
//! cannot be known statically.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static EXPRESSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\$\{\{(.*?)\}\}").unwrap());

static LITERAL_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^'(?:[^']|'')*'$").unwrap());

static LITERAL_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:0[xX][0-9a-fA-F]+|0[oO][0-7]+|(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)$")
        .unwrap()
});

static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$").unwrap());

const LITERAL_KEYWORDS: &[&str] = &["true", "false", "null", "NaN", "Infinity"];

const TRUTHY: &[&str] = &["true", "yes", "y", "1", "on"];
const FALSY: &[&str] = &["false", "no", "n", "0", "off", ""];

/// Outcome of normalizing a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized<T> {
    Value(T),
    /// The value contains a runtime expression; validation must not judge it.
    Skip,
}

impl<T> Normalized<T> {
    pub fn is_skip(&self) -> bool {
        matches!(self, Normalized::Skip)
    }

    pub fn value(self) -> Option<T> {
        match self {
            Normalized::Value(value) => Some(value),
            Normalized::Skip => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Normalized<U> {
        match self {
            Normalized::Value(value) => Normalized::Value(f(value)),
            Normalized::Skip => Normalized::Skip,
        }
    }
}

/// How a value was written in the example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueLayout {
    /// Written after the key, where ` #` starts a comment
    #[default]
    Inline,
    /// The content of a `|` or `>` block scalar, where `#` is text
    Block,
}

/// Where a multi-value input is split.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Separator {
    /// Line breaks. Each line also loses its own trailing comment.
    Newline,
    Literal(String),
}

impl Separator {
    /// Read a separator as written in a type definition.
    pub fn parse(source: &str) -> Self {
        match source {
            "newline" | "\n" => Separator::Newline,
            other => Separator::Literal(other.to_string()),
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Separator::Newline => write!(f, "newline"),
            Separator::Literal(s) => write!(f, "'{}'", s),
        }
    }
}

/// Whether the inside of a `${{ }}` placeholder is a compile-time constant.
///
/// Accepted: single-quoted strings (with `''` escapes), signed decimal, hex,
/// octal and exponential numbers, and the keywords `true`, `false`, `null`,
/// `NaN`, `Infinity` (case-sensitive).
pub fn is_literal_expression(inner: &str) -> bool {
    let inner = inner.trim();
    LITERAL_KEYWORDS.contains(&inner)
        || LITERAL_STRING.is_match(inner)
        || LITERAL_NUMBER.is_match(inner)
}

/// Whether `raw` embeds at least one placeholder that is not a literal.
pub fn has_runtime_expression(raw: &str) -> bool {
    EXPRESSION
        .captures_iter(raw)
        .any(|caps| !is_literal_expression(&caps[1]))
}

/// Normalize a scalar value.
///
/// Strips a trailing comment (single-line values only), de-indents, trims,
/// removes one layer of matching quotes and collapses whitespace runs to a
/// single space. A value that is exactly one literal placeholder becomes the
/// literal it wraps, so `${{ 'prod' }}` normalizes to `prod`.
pub fn normalize_scalar(raw: &str) -> Normalized<String> {
    normalize_scalar_as(raw, ValueLayout::Inline)
}

/// [`normalize_scalar`] for a value whose layout is known. Block scalar
/// content never loses a trailing `#` text, even on a single line.
pub fn normalize_scalar_as(raw: &str, layout: ValueLayout) -> Normalized<String> {
    if has_runtime_expression(raw) {
        return Normalized::Skip;
    }

    let text = without_trailing_comment(raw, layout);
    let text = dedent(&text);
    let text = strip_enclosing_quotes(text.trim());
    let text = collapse_whitespace(text);

    Normalized::Value(unwrap_literal_expression(&text).unwrap_or(text))
}

/// Interpret a value as a boolean.
///
/// `Value(None)` means the text is not a recognized boolean spelling, which
/// the validator reports; `Skip` means it could not be judged at all.
pub fn normalize_boolean(raw: &str) -> Normalized<Option<bool>> {
    normalize_scalar(raw).map(|text| parse_boolean(&text))
}

/// Interpret a value as a decimal number, scientific notation included.
pub fn normalize_number(raw: &str) -> Normalized<Option<f64>> {
    normalize_scalar(raw).map(|text| parse_number(&text))
}

/// Read an already normalized value (or split item) as a boolean.
pub fn parse_boolean(text: &str) -> Option<bool> {
    let lower = text.to_lowercase();
    if TRUTHY.contains(&lower.as_str()) {
        Some(true)
    } else if FALSY.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Read an already normalized value (or split item) as a decimal number.
pub fn parse_number(text: &str) -> Option<f64> {
    if DECIMAL.is_match(text) {
        text.parse::<f64>().ok()
    } else {
        None
    }
}

/// Split a multi-value input into normalized items.
///
/// With [`Separator::Newline`] present the value is split into lines first
/// (each line losing its own trailing comment) and every line is then split
/// on the remaining literal separators. Empty items are dropped.
pub fn split_multi_value(raw: &str, separators: &[Separator]) -> Normalized<Vec<String>> {
    split_multi_value_as(raw, separators, ValueLayout::Inline)
}

/// [`split_multi_value`] for a value whose layout is known.
pub fn split_multi_value_as(
    raw: &str,
    separators: &[Separator],
    layout: ValueLayout,
) -> Normalized<Vec<String>> {
    if has_runtime_expression(raw) {
        return Normalized::Skip;
    }

    let literals: Vec<&str> = separators
        .iter()
        .filter_map(|separator| match separator {
            Separator::Literal(s) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        })
        .collect();
    let by_line = separators.contains(&Separator::Newline);

    let text = without_trailing_comment(raw, layout);
    let text = dedent(&text);
    let text = strip_enclosing_quotes(text.trim());

    let segments: Vec<String> = if by_line {
        text.lines()
            .map(|line| strip_trailing_comment(line).trim().to_string())
            .collect()
    } else {
        vec![collapse_whitespace(text)]
    };

    let items = segments
        .iter()
        .flat_map(|segment| split_on_all(segment, &literals))
        .map(|item| finish_item(&item))
        .filter(|item| !item.is_empty())
        .collect();

    Normalized::Value(items)
}

fn split_on_all(segment: &str, separators: &[&str]) -> Vec<String> {
    let mut pieces = vec![segment.to_string()];
    for separator in separators {
        pieces = pieces
            .iter()
            .flat_map(|piece| piece.split(separator).map(str::to_string))
            .collect();
    }
    pieces
}

fn finish_item(item: &str) -> String {
    let item = strip_enclosing_quotes(item.trim()).trim().to_string();
    unwrap_literal_expression(&item).unwrap_or(item)
}

/// If `text` is exactly one literal placeholder, the literal's value.
fn unwrap_literal_expression(text: &str) -> Option<String> {
    let mut matches = EXPRESSION.captures_iter(text);
    let caps = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    let whole = caps.get(0)?;
    if whole.start() != 0 || whole.end() != text.len() {
        return None;
    }

    let inner = caps[1].trim();
    if LITERAL_STRING.is_match(inner) {
        Some(inner[1..inner.len() - 1].replace("''", "'"))
    } else {
        Some(inner.to_string())
    }
}

fn is_multi_line(raw: &str) -> bool {
    raw.trim().contains('\n')
}

/// Comments are only cut from single-line inline values.
fn without_trailing_comment(raw: &str, layout: ValueLayout) -> String {
    if layout == ValueLayout::Block || is_multi_line(raw) {
        raw.to_string()
    } else {
        strip_trailing_comment(raw).to_string()
    }
}

/// Cut a `# comment` that is preceded by whitespace and not inside quotes.
///
/// Quote state only distinguishes `'` from `"`; YAML escapes such as `''`
/// inside single quotes or `\"` inside double quotes are not understood.
pub fn strip_trailing_comment(text: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut previous_is_space = true;
    for (index, ch) in text.char_indices() {
        match (ch, quote) {
            ('\'' | '"', None) => quote = Some(ch),
            (c, Some(open)) if c == open => quote = None,
            ('#', None) if previous_is_space => return text[..index].trim_end(),
            _ => {}
        }
        previous_is_space = ch.is_whitespace();
    }
    text
}

/// Remove one layer of matching enclosing quotes.
pub fn strip_enclosing_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'\'' || first == b'"') && bytes[bytes.len() - 1] == first {
            return &text[1..text.len() - 1];
        }
    }
    text
}

/// Remove the smallest indentation shared by all non-blank lines.
pub fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
