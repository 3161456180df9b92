//! Word-wrapping and pagination for the teleprompter display.
//!
//! The display shows 10 lines of 25 characters. Words are separated by ASCII
//! whitespace only (newlines in the input would otherwise corrupt the page
//! layout on the wire); widths are counted in characters.

use serde::Serialize;

use crate::constants::{LINES_PER_PAGE, LINE_WIDTH, MIN_PAGES};

/// One screen of text: exactly 10 lines, each padded to 25 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    lines: Vec<String>,
}

impl Page {
    /// Build a page from up to 10 lines of at most 25 characters.
    ///
    /// Missing lines are filled with blanks. Returns `None` if the input
    /// violates the display geometry.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Option<Page> {
        if lines.len() > LINES_PER_PAGE {
            return None;
        }
        let mut padded = Vec::with_capacity(LINES_PER_PAGE);
        for line in lines {
            let line = line.as_ref();
            let width = line.chars().count();
            if width > LINE_WIDTH {
                return None;
            }
            padded.push(pad_line(line, width));
        }
        padded.resize(LINES_PER_PAGE, blank_line());
        Some(Page { lines: padded })
    }

    /// Build a page from lines already known to fit.
    fn from_fitted(lines: &[String]) -> Page {
        let mut padded: Vec<String> = lines
            .iter()
            .map(|line| pad_line(line, line.chars().count()))
            .collect();
        padded.resize(LINES_PER_PAGE, blank_line());
        Page { lines: padded }
    }

    /// A page of blank lines.
    pub fn blank() -> Page {
        Page {
            lines: vec![blank_line(); LINES_PER_PAGE],
        }
    }

    /// The padded lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether every line is blank.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    /// The page as sent to the glasses: a leading newline, then the lines
    /// joined by newlines.
    pub fn to_wire_text(&self) -> String {
        let mut text = String::with_capacity(1 + LINES_PER_PAGE * (LINE_WIDTH + 1));
        for line in &self.lines {
            text.push('\n');
            text.push_str(line);
        }
        text
    }
}

fn blank_line() -> String {
    " ".repeat(LINE_WIDTH)
}

fn pad_line(line: &str, width: usize) -> String {
    let mut padded = String::with_capacity(line.len() + LINE_WIDTH - width);
    padded.push_str(line);
    padded.extend(std::iter::repeat(' ').take(LINE_WIDTH - width));
    padded
}

/// Greedy word-wrap at 25 characters.
///
/// Words longer than a line are hard-split. Empty (or all-space) input gives a
/// single empty line, never an empty list.
pub fn wrap_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in text.split_ascii_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();

        // Hard-split words that can never fit on one line.
        while chars.len() > LINE_WIDTH {
            if current_width > 0 {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            lines.push(chars.drain(..LINE_WIDTH).collect());
        }
        if chars.is_empty() {
            continue;
        }

        let needed = if current_width == 0 {
            chars.len()
        } else {
            current_width + 1 + chars.len()
        };
        if needed > LINE_WIDTH {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if current_width > 0 {
            current.push(' ');
            current_width += 1;
        }
        current.extend(chars.iter());
        current_width += chars.len();
    }

    if current_width > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Group lines into pages of 10, padding the last page and the page list.
///
/// Lines wider than the display are hard-split, never cut. Always returns at
/// least 14 pages.
pub fn paginate<S: AsRef<str>>(lines: &[S]) -> Vec<Page> {
    let fitted: Vec<String> = lines.iter().flat_map(|line| split_to_width(line.as_ref())).collect();
    let mut pages: Vec<Page> = fitted.chunks(LINES_PER_PAGE).map(Page::from_fitted).collect();
    if pages.len() < MIN_PAGES {
        pages.resize(MIN_PAGES, Page::blank());
    }
    pages
}

/// Cut `line` into pieces of at most 25 characters. An empty line stays one
/// empty line.
fn split_to_width(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(LINE_WIDTH).map(|piece| piece.iter().collect()).collect()
}

/// Wrap then paginate.
pub fn paginate_text(text: &str) -> Vec<Page> {
    paginate(&wrap_lines(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_simple() {
        let lines = wrap_lines("the quick brown fox jumps over the lazy dog");
        assert_eq!(lines, vec!["the quick brown fox jumps", "over the lazy dog"]);
    }

    #[test]
    fn test_wrap_exact_width() {
        let text = "aaaaa bbbbb ccccc ddddd e";
        assert_eq!(text.len(), 25);
        assert_eq!(wrap_lines(text), vec![text]);
    }

    #[test]
    fn test_wrap_empty() {
        assert_eq!(wrap_lines(""), vec![String::new()]);
        assert_eq!(wrap_lines("     "), vec![String::new()]);
    }

    #[test]
    fn test_wrap_long_word_hard_split() {
        let word = "x".repeat(60);
        let lines = wrap_lines(&format!("hi {} there", word));
        assert_eq!(lines[0], "hi");
        assert_eq!(lines[1], "x".repeat(25));
        assert_eq!(lines[2], "x".repeat(25));
        assert_eq!(lines[3], format!("{} there", "x".repeat(10)));
    }

    #[test]
    fn test_wrap_200_char_word() {
        let lines = wrap_lines(&"y".repeat(200));
        assert_eq!(lines.len(), 8);
        assert!(lines.iter().all(|l| l.chars().count() == 25));
    }

    #[test]
    fn test_wrap_treats_newlines_as_separators() {
        assert_eq!(wrap_lines("one\ntwo\tthree"), vec!["one two three"]);
    }

    #[test]
    fn test_wrap_counts_characters_not_bytes() {
        let word = "é".repeat(25);
        assert_eq!(wrap_lines(&word), vec![word.clone()]);
    }

    #[test]
    fn test_page_geometry() {
        let page = Page::from_lines(&["hello"]).unwrap();
        assert_eq!(page.lines().len(), 10);
        assert!(page.lines().iter().all(|l| l.chars().count() == 25));
        assert_eq!(page.lines()[0].trim_end(), "hello");
        assert!(!page.is_blank());
        assert!(Page::blank().is_blank());
    }

    #[test]
    fn test_page_rejects_bad_geometry() {
        assert!(Page::from_lines(&["x".repeat(26)]).is_none());
        assert!(Page::from_lines(&vec!["a"; 11]).is_none());
    }

    #[test]
    fn test_page_wire_text() {
        let page = Page::from_lines(&["ab"]).unwrap();
        let text = page.to_wire_text();
        assert!(text.starts_with("\nab"));
        assert_eq!(text.matches('\n').count(), 10);
        assert_eq!(text.chars().count(), 10 * 26);
    }

    #[test]
    fn test_paginate_empty_input() {
        let pages = paginate_text("");
        assert_eq!(pages.len(), 14);
        assert!(pages.iter().all(|p| p.lines().len() == 10 && p.is_blank()));
    }

    #[test]
    fn test_paginate_splits_into_chunks_of_ten() {
        let lines: Vec<String> = (0..23).map(|i| format!("line {}", i)).collect();
        let pages = paginate(&lines);
        assert_eq!(pages.len(), 14);
        assert_eq!(pages[1].lines()[0].trim_end(), "line 10");
        assert_eq!(pages[2].lines()[2].trim_end(), "line 22");
        assert!(pages[2].lines()[3].trim().is_empty());
        assert!(pages[3].is_blank());
    }

    #[test]
    fn test_paginate_beyond_minimum() {
        let lines = vec!["x"; 200];
        assert_eq!(paginate(&lines).len(), 20);
    }

    #[test]
    fn test_paginate_splits_overwide_lines() {
        let long = format!("{}{}", "a".repeat(25), "b".repeat(7));
        let pages = paginate(&[long.as_str(), "", "tail"]);
        let lines = pages[0].lines();
        assert_eq!(lines[0], "a".repeat(25));
        assert_eq!(lines[1].trim_end(), "b".repeat(7));
        assert!(lines[2].trim().is_empty());
        assert_eq!(lines[3].trim_end(), "tail");
        assert!(pages.iter().all(|p| p.lines().iter().all(|l| l.chars().count() == 25)));
    }

    #[test]
    fn test_paginate_is_deterministic() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(10);
        assert_eq!(paginate_text(&text), paginate_text(&text));
    }
}
