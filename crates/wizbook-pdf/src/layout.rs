//! Text Layout
//!
//! Word wrapping and pagination for the A4 export. Wrapping counts
//! characters, not glyph widths; the composite font is close enough to
//! monospaced at body sizes for a preview document.

/// Page geometry and type metrics (A4, points)
#[derive(Clone, Copy, Debug)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub font_size: f32,
    pub leading: f32,
    /// Wrap width in characters
    pub max_chars: usize,
    /// Body lines per page
    pub lines_per_page: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            margin: 54.0,
            font_size: 11.0,
            leading: 14.0,
            max_chars: 90,
            lines_per_page: 50,
        }
    }
}

/// Wrap source text into render lines
///
/// Paragraph breaks are preserved. Words longer than the wrap width, and
/// unspaced scripts such as CJK, fall back to a hard break at the character
/// boundary so no input can overflow a line.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for raw_line in text.lines() {
        if raw_line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0;

        for word in raw_line.split_whitespace() {
            let word_len = word.chars().count();

            if word_len > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                for chunk in hard_break(word, max_chars) {
                    lines.push(chunk);
                }
                continue;
            }

            let needed = if current.is_empty() {
                word_len
            } else {
                current_len + 1 + word_len
            };

            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_len = needed;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

fn hard_break(word: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Split render lines into pages
pub fn paginate(lines: Vec<String>, lines_per_page: usize) -> Vec<Vec<String>> {
    if lines.is_empty() {
        return vec![Vec::new()];
    }
    lines
        .chunks(lines_per_page)
        .map(<[String]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_short_line_untouched() {
        let lines = wrap("hello world", 90);
        assert_eq!(lines, vec!["hello world"]);
    }

    #[test]
    fn test_wrap_breaks_at_word_boundary() {
        let lines = wrap("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn test_wrap_preserves_paragraph_breaks() {
        let lines = wrap("one\n\ntwo", 90);
        assert_eq!(lines, vec!["one", "", "two"]);
    }

    #[test]
    fn test_unspaced_text_hard_breaks() {
        let cjk = "日本語".repeat(40);
        let lines = wrap(&cjk, 30);
        assert!(lines.len() == 4);
        assert!(lines.iter().all(|l| l.chars().count() <= 30));
    }

    #[test]
    fn test_long_token_does_not_overflow() {
        let lines = wrap("small reallyreallylongtokenwithoutspaces tail", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert!(lines.concat().contains("tail"));
    }

    #[test]
    fn test_paginate_empty_yields_single_page() {
        assert_eq!(paginate(Vec::new(), 50).len(), 1);
    }

    #[test]
    fn test_paginate_splits_evenly() {
        let lines: Vec<String> = (0..120).map(|i| format!("line {i}")).collect();
        let pages = paginate(lines, 50);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), 50);
        assert_eq!(pages[2].len(), 20);
    }
}
