// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RTF writer — plain text in a single Helvetica 10pt run.

const HEADER: &str = "{\\rtf1\\ansi\\ansicpg1252\\deff0\n\
{\\fonttbl{\\f0\\fswiss Helvetica;}}\n\
\\margl1440\\margr1440\\margt1440\\margb1440\n\
\\f0\\fs20\n";

/// Encode `text` as an RTF document.
///
/// `\`, `{` and `}` are escaped, line breaks become `\par`, tabs become
/// `\tab`, and anything outside ASCII is written as a `\uN?` escape (UTF-16
/// code units, signed, with `?` as the fallback character).
pub fn encode(text: &str) -> String {
    let mut out = String::with_capacity(HEADER.len() + text.len() + 16);
    out.push_str(HEADER);
    for line in text.lines() {
        push_escaped(&mut out, line);
        out.push_str("\\par\n");
    }
    out.push('}');
    out
}

fn push_escaped(out: &mut String, line: &str) {
    let mut units = [0u16; 2];
    for c in line.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\t' => out.push_str("\\tab "),
            c if c.is_ascii_control() => {}
            c if c.is_ascii() => out.push(c),
            c => {
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
        }
    }
}
