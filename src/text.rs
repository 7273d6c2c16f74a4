//! Query text handling: line splitting, escaping and width estimation.
//!
//! Widths here are a heuristic. Glyphs are bucketed into three classes by code point and
//! weighted against the font size; no font is consulted, so the real rendered width
//! varies with whatever font the viewer picks for `sans-serif`.

use std::borrow::Cow;

use crate::constants::{
    CJK_THRESHOLD, MEDIUM_GLYPH_WEIGHT, NARROW_GLYPH_WEIGHT, WIDE_GLYPH_WEIGHT,
};

/// Ordered lines of one text field, ready for layout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextBlock {
    lines: Vec<String>,
}

impl TextBlock {
    /// Builds a block from a raw query value.
    ///
    /// `_` becomes a space and `/` starts a new line. A hidden field, an absent/empty
    /// value, or one made only of separators gives an empty block, which callers treat
    /// as "omit the element".
    pub fn from_param(raw: Option<&str>, visible: bool) -> Self {
        if !visible {
            return Self::default();
        }
        let Some(raw) = raw.filter(|value| !value.is_empty()) else {
            return Self::default();
        };
        let lines: Vec<String> = raw
            .replace('_', " ")
            .split('/')
            .map(str::to_owned)
            .collect();
        if lines.iter().all(|line| line.trim().is_empty()) {
            return Self::default();
        }
        Self { lines }
    }

    /// Wraps already split lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// The lines, unescaped.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Estimated width of the widest line.
    pub fn max_width(&self, font_size: f64) -> f64 {
        self.lines
            .iter()
            .map(|line| estimate_line_width(line, font_size))
            .fold(0.0, f64::max)
    }
}

/// Relative advance of a glyph, as a multiple of the font size.
pub fn glyph_weight(ch: char) -> f64 {
    if u32::from(ch) > CJK_THRESHOLD {
        WIDE_GLYPH_WEIGHT
    } else if ch.is_ascii_digit() || ch == ' ' {
        NARROW_GLYPH_WEIGHT
    } else {
        MEDIUM_GLYPH_WEIGHT
    }
}

/// Approximate rendered width of one line, in canvas units.
pub fn estimate_line_width(line: &str, font_size: f64) -> f64 {
    line.chars().map(glyph_weight).sum::<f64>() * font_size
}

/// Escapes `&`, `<`, `>`, `"` and `'` for embedding in element content or attributes.
pub fn escape_markup(input: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscores_and_slashes() {
        let block = TextBlock::from_param(Some("hello_world/line2"), true);
        assert_eq!(block.lines(), ["hello world", "line2"]);
    }

    #[test]
    fn hidden_or_missing_fields_are_empty() {
        assert!(TextBlock::from_param(Some("visible?"), false).is_empty());
        assert!(TextBlock::from_param(None, true).is_empty());
        assert!(TextBlock::from_param(Some(""), true).is_empty());
    }

    #[test]
    fn separator_only_values_are_empty() {
        for raw in ["/", "_", "_/_", "//", " / "] {
            assert!(
                TextBlock::from_param(Some(raw), true).is_empty(),
                "{raw:?} should give no lines"
            );
        }
    }

    #[test]
    fn trailing_slash_keeps_an_empty_line() {
        let block = TextBlock::from_param(Some("a/"), true);
        assert_eq!(block.len(), 2);
        assert_eq!(block.lines()[1], "");
    }

    #[test]
    fn cjk_is_wider_than_digits() {
        let cjk = estimate_line_width("안녕하세요", 18.0);
        let digits = estimate_line_width("12345", 18.0);
        assert!(cjk > digits, "{cjk} should exceed {digits}");
        assert!((cjk - 90.0).abs() < 1e-9);
        assert!((digits - 54.0).abs() < 1e-9);
    }

    #[test]
    fn latin_and_punctuation_use_medium_weight() {
        assert_eq!(glyph_weight('A'), MEDIUM_GLYPH_WEIGHT);
        assert_eq!(glyph_weight('!'), MEDIUM_GLYPH_WEIGHT);
        assert_eq!(glyph_weight(' '), NARROW_GLYPH_WEIGHT);
        assert_eq!(glyph_weight('漢'), WIDE_GLYPH_WEIGHT);
    }

    #[test]
    fn max_width_picks_the_widest_line() {
        let block = TextBlock::from_lines(["ab", "abcd", "a"]);
        let expected = estimate_line_width("abcd", 10.0);
        assert!((block.max_width(10.0) - expected).abs() < 1e-9);
        assert_eq!(TextBlock::default().max_width(10.0), 0.0);
    }

    #[test]
    fn escapes_all_markup_characters() {
        let escaped = escape_markup(r#"<b>"Tom" & 'Jerry'</b>"#);
        for raw in ['<', '>', '"', '\''] {
            assert!(!escaped.contains(raw), "{raw} left in {escaped}");
        }
        assert!(escaped.contains("&amp;"));
        assert!(escaped.contains("&lt;b&gt;"));
        assert!(escaped.contains("&quot;Tom&quot;"));
    }
}
