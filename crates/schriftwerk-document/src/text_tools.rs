// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Search, replace, and simple statistics over extracted text.
//
// Offsets are in characters, not bytes, so they line up with what a user sees
// in an editor.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    /// Only match when neither neighbour is alphanumeric.
    pub whole_word: bool,
}

/// Character offsets of every occurrence of `needle` in `text`.
///
/// Scanning resumes one character after each hit, so overlapping occurrences
/// are all reported (`"aa"` occurs twice in `"aaa"`). An empty needle matches
/// nothing.
pub fn find_matches(text: &str, needle: &str, options: SearchOptions) -> Vec<usize> {
    let fold = |c: char| fold_char(c, options.case_sensitive);
    let haystack: Vec<char> = text.chars().map(fold).collect();
    let needle: Vec<char> = needle.chars().map(fold).collect();
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }

    (0..=haystack.len() - needle.len())
        .filter(|&start| haystack[start..start + needle.len()] == needle[..])
        .filter(|&start| {
            !options.whole_word || is_word_bounded(&haystack, start, start + needle.len())
        })
        .collect()
}

/// Replace every non-overlapping occurrence of `needle`, left to right.
///
/// Returns the new text and the number of replacements made.
pub fn replace_all(
    text: &str,
    needle: &str,
    replacement: &str,
    options: SearchOptions,
) -> (String, usize) {
    let matches = find_matches(text, needle, options);
    if matches.is_empty() {
        return (text.to_string(), 0);
    }

    let needle_len = needle.chars().count();
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    let mut count = 0usize;

    for start in matches {
        if start < cursor {
            continue;
        }
        out.extend(&chars[cursor..start]);
        out.push_str(replacement);
        cursor = start + needle_len;
        count += 1;
    }
    out.extend(&chars[cursor..]);
    (out, count)
}

fn fold_char(c: char, case_sensitive: bool) -> char {
    if case_sensitive {
        c
    } else {
        // Single-char lowering keeps offsets stable; multi-char expansions
        // (e.g. 'İ') compare on their first char.
        c.to_lowercase().next().unwrap_or(c)
    }
}

fn is_word_bounded(chars: &[char], start: usize, end: usize) -> bool {
    let before_ok = start == 0 || !chars[start - 1].is_alphanumeric();
    let after_ok = end >= chars.len() || !chars[end].is_alphanumeric();
    before_ok && after_ok
}

/// Counts shown by the `stats` view of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextStats {
    pub characters: usize,
    pub words: usize,
    pub lines: usize,
    pub non_blank_lines: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
            lines: text.lines().count(),
            non_blank_lines: text.lines().filter(|l| !l.trim().is_empty()).count(),
        }
    }
}
