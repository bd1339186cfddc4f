//! Markdown cleanup passes applied to freshly rendered pages.
//!
//! Rendered documentation carries a lot of artifacts: navigation banners,
//! line-numbered code listings, table rulings, escaped punctuation,
//! notebook widget remnants, inline analytics scripts. [`normalize`] runs
//! a fixed, ordered sequence of total string transforms that strips all
//! of it while leaving real prose and code intact.
//!
//! The order of passes is part of the contract: fence-aware passes run
//! before passes that treat fences as opaque, and the empty-code-block
//! pass runs a second time after link/image stripping because those can
//! newly empty out a block.

use once_cell::sync::Lazy;
use regex::Regex;

/// Language hint attached to untagged code fences.
pub const DEFAULT_FENCE_LANG: &str = "python";

/// Footer marker: everything from here on is "next page" navigation.
const FOOTER_MARKER: &str = "[Next ![]";

/// The permalink glyph whose links survive link resolution.
const ANCHOR_GLYPH: &str = "\u{b6}";

static LINE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\s*").unwrap());
static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]\(.*?\)").unwrap());
static IMAGE_DATA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[\]\(data:image/png;base64.*?\)").unwrap());
static IMAGE_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^!\[[^\]]*\]\([^)]*\)\s*$").unwrap());
static CELL_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[\d+\]:\s*$").unwrap());
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Cleans one rendered page of markdown. Total: never fails, returns a
/// (possibly empty) string for any input.
pub fn normalize(markdown: &str) -> String {
    let md = trim_page_shell(markdown);
    let md = strip_code_line_numbers(&md);
    let md = strip_table_rulings(&md);
    let md = drop_empty_code_blocks(&md);
    let md = tag_code_fences(&md, DEFAULT_FENCE_LANG);
    let md = resolve_links(&md);
    let md = strip_images(&md);
    // Link/image stripping can leave a fence with nothing inside it.
    let md = drop_empty_code_blocks(&md);
    let md = strip_widget_noise(&md);
    let md = strip_script_blocks(&md);
    let md = strip_cell_markers(&md);
    let md = normalize_punctuation(&md);
    collapse_blank_lines(&md)
}

/// True when `s` looks like a fence language tag (`python`, `shell`, ...).
pub(crate) fn is_language_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'))
}

/// Applies `f` to the prose segments between fences, leaving fenced
/// spans untouched.
fn map_prose(md: &str, f: impl Fn(&str) -> String) -> String {
    map_segments(md, f, |code| code.to_string())
}

/// Applies `f` to the contents of fenced spans, leaving prose untouched.
fn map_code(md: &str, f: impl Fn(&str) -> String) -> String {
    map_segments(md, |prose| prose.to_string(), f)
}

fn map_segments(
    md: &str,
    prose: impl Fn(&str) -> String,
    code: impl Fn(&str) -> String,
) -> String {
    let mut out = String::with_capacity(md.len());
    for (i, part) in md.split("```").enumerate() {
        if i > 0 {
            out.push_str("```");
        }
        if i % 2 == 0 {
            out.push_str(&prose(part));
        } else {
            out.push_str(&code(part));
        }
    }
    out
}

/// Drops lines failing `keep`, preserving a trailing newline if present.
fn retain_lines(text: &str, keep: impl Fn(&str) -> bool) -> String {
    let kept: Vec<&str> = text.lines().filter(|line| keep(line)).collect();
    let mut out = kept.join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Pass 1: drop the navigation preamble before the first heading and the
/// "next page" footer.
fn trim_page_shell(md: &str) -> String {
    let md = md.split(FOOTER_MARKER).next().unwrap_or(md);

    let mut body = String::new();
    let mut in_body = false;
    for line in md.lines() {
        if !in_body && line.starts_with('#') {
            in_body = true;
        }
        if in_body {
            body.push_str(line);
            body.push('\n');
        }
    }
    body
}

/// Pass 2: strip leading line-number prefixes inside fenced code only.
fn strip_code_line_numbers(md: &str) -> String {
    map_code(md, |code| {
        let stripped: Vec<String> = code
            .lines()
            .map(|line| LINE_NUMBER_RE.replace(line, "").into_owned())
            .collect();
        let mut out = stripped.join("\n");
        if code.ends_with('\n') {
            out.push('\n');
        }
        out
    })
}

/// Pass 3: remove lines that are pure table-separator decoration.
fn strip_table_rulings(md: &str) -> String {
    map_prose(md, |prose| {
        retain_lines(prose, |line| {
            line.is_empty() || !line.chars().all(|c| matches!(c, '|' | '-' | ' '))
        })
    })
}

/// True when a fenced span carries nothing beyond an optional language
/// tag and separator/whitespace noise.
fn code_is_noise(part: &str) -> bool {
    let body = match part.split_once('\n') {
        Some((first, rest)) if is_language_token(first) => rest,
        _ => part,
    };
    body.chars()
        .all(|c| matches!(c, '|' | '-' | ' ' | '\t' | '\n' | '\r'))
}

/// Passes 4 (twice) and part of 5: drop empty/noise-only fenced blocks,
/// merging what remains so fences stay balanced.
fn drop_empty_code_blocks(md: &str) -> String {
    let parts: Vec<&str> = md.split("```").collect();
    if parts.len() == 1 {
        return md.to_string();
    }

    let mut out = String::with_capacity(md.len());
    for (i, part) in parts.iter().enumerate() {
        if i % 2 == 0 {
            out.push_str(part);
        } else if !code_is_noise(part) {
            out.push_str("```");
            out.push_str(part);
            out.push_str("```");
        }
    }
    out
}

/// Pass 5: tag untagged fences with a fixed language hint.
fn tag_code_fences(md: &str, lang: &str) -> String {
    map_code(md, |code| {
        match code.split_once('\n') {
            // already tagged
            Some((first, _)) if is_language_token(first) => code.to_string(),
            _ if code.starts_with('\n') => format!("{}{}", lang, code),
            _ => format!("{}\n{}", lang, code),
        }
    })
}

/// Pass 6: resolve `[text](target)` to bare `text`, left to right,
/// keeping permalink-glyph links verbatim for the section splitter.
///
/// Iterative rather than recursive so malformed or unbalanced link
/// syntax can never overflow: each step consumes at least one match.
fn resolve_links(md: &str) -> String {
    let mut out = String::with_capacity(md.len());
    let mut rest = md;

    while let Some(m) = LINK_RE.find(rest) {
        let link = m.as_str();
        let text = link[1..].split(']').next().unwrap_or("");
        out.push_str(&rest[..m.start()]);
        if text == ANCHOR_GLYPH {
            out.push_str(link);
        } else {
            out.push_str(text);
        }
        rest = &rest[m.end()..];
    }
    out.push_str(rest);
    out
}

/// Pass 7: strip inlined base64 image data and orphan image-reference lines.
fn strip_images(md: &str) -> String {
    let md = IMAGE_DATA_RE.replace_all(md, "");
    map_prose(&md, |prose| {
        retain_lines(prose, |line| !IMAGE_LINE_RE.is_match(line))
    })
}

/// Pass 8: remove interactive-widget JSON remnants and raw XML declarations.
fn strip_widget_noise(md: &str) -> String {
    map_prose(md, |prose| {
        retain_lines(prose, |line| {
            line.is_empty()
                || (!line.starts_with('{')
                    && !line.contains("jupyter-widgets")
                    && !line.starts_with("<?xml"))
        })
    })
}

/// Opening keywords of boilerplate script regions stripped by pass 9.
const SCRIPT_OPENERS: &[&str] = &["(function() {", "window.dataLayer = window.dataLayer"];

/// Pass 9: remove boilerplate script/style regions. A region starts at a
/// line containing a recognized opener and ends when its braces balance;
/// an unclosed region is stripped to the end of its prose segment.
fn strip_script_blocks(md: &str) -> String {
    map_prose(md, |prose| {
        let mut kept: Vec<&str> = Vec::new();
        let mut depth: Option<i64> = None;

        for line in prose.lines() {
            if let Some(d) = depth {
                let d = d + brace_delta(line);
                depth = if d <= 0 { None } else { Some(d) };
                continue;
            }
            if line.contains("@import url(") {
                continue;
            }
            if SCRIPT_OPENERS.iter().any(|open| line.contains(open)) {
                let d = brace_delta(line);
                if d > 0 {
                    depth = Some(d);
                }
                continue;
            }
            kept.push(line);
        }

        let mut out = kept.join("\n");
        if prose.ends_with('\n') {
            out.push('\n');
        }
        out
    })
}

fn brace_delta(line: &str) -> i64 {
    let opens = line.matches('{').count() as i64;
    let closes = line.matches('}').count() as i64;
    opens - closes
}

/// Pass 10: remove dangling numbered-cell markers left by notebook rendering.
fn strip_cell_markers(md: &str) -> String {
    map_prose(md, |prose| {
        retain_lines(prose, |line| !CELL_MARKER_RE.is_match(line))
    })
}

/// Pass 11: un-escape underscores/asterisks, drop bold markers, and map
/// non-ASCII punctuation to plain equivalents.
fn normalize_punctuation(md: &str) -> String {
    let md = md
        .replace("\\_", "_")
        .replace("\\*", "*")
        .replace("**", "");

    let mut out = String::with_capacity(md.len());
    for c in md.chars() {
        match c {
            '\u{2500}' | '\u{2514}' | '\u{251c}' | '\u{2502}' => {}
            '\u{2588}' | '\u{2019}' | '\u{2018}' => out.push('\''),
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{a9}' => out.push_str("copyright"),
            _ => out.push(c),
        }
    }
    out
}

/// Pass 12: collapse runs of blank lines and drop stray one-character
/// noise lines left behind by the earlier passes.
fn collapse_blank_lines(md: &str) -> String {
    let md = map_prose(md, |prose| {
        retain_lines(prose, |line| {
            let trimmed = line.trim();
            !(trimmed.len() == 1 && matches!(trimmed, "|" | "*" | "+" | "-" | "\u{b6}"))
        })
    });
    BLANK_RUN_RE.replace_all(&md, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_preamble_and_footer() {
        let md = "nav bar\nsearch box\n# Title\n\nBody.\n\n[Next ![](arrow)](next.html)\n";
        let out = normalize(md);
        assert!(out.starts_with("# Title"));
        assert!(!out.contains("nav bar"));
        assert!(!out.contains("Next"));
    }

    #[test]
    fn test_line_numbers_stripped_in_code_only() {
        let md = "# T\n\n1 apples and 2 oranges\n\n```\n1 print(\"a\")\n2 print(\"b\")\n```\n";
        let out = normalize(md);
        assert!(out.contains("1 apples and 2 oranges"));
        assert!(out.contains("print(\"a\")\nprint(\"b\")"));
        assert!(!out.contains("1 print"));
    }

    #[test]
    fn test_table_rulings_removed() {
        let md = "# T\n\n| a | b |\n| --- | --- |\n| 1 | 2 |\n";
        let out = normalize(md);
        assert!(!out.contains("---"));
        assert!(out.contains("| a | b |"));
    }

    #[test]
    fn test_empty_code_blocks_dropped_and_fences_balanced() {
        let md = "# T\n\nbefore\n\n```\n\n```\n\nafter\n\n```\nreal()\n```\n";
        let out = normalize(md);
        assert_eq!(out.matches("```").count(), 2);
        assert!(out.contains("real()"));
    }

    #[test]
    fn test_code_fences_tagged_with_default_language() {
        let md = "# T\n\n```\nx = 1\n```\n";
        let out = normalize(md);
        assert!(out.contains("```python\nx = 1\n```"));
    }

    #[test]
    fn test_links_resolved_but_permalink_kept() {
        let md = "# T\n\nSee [the guide](guide.html) and heading [\u{b6}](#anchor) here.\n";
        let out = normalize(md);
        assert!(out.contains("See the guide and"));
        assert!(out.contains("[\u{b6}](#anchor)"));
        assert!(!out.contains("guide.html"));
    }

    #[test]
    fn test_link_resolution_terminates_on_malformed_input() {
        let md = "# T\n\n[unclosed](no-paren [another](x) tail\n";
        let out = normalize(md);
        assert!(out.contains("tail"));
    }

    #[test]
    fn test_images_and_widgets_removed() {
        let md = concat!(
            "# T\n\n![](data:image/png;base64AAAA)\n",
            "![alt](photo.png)\n",
            "{\"model_id\": \"abc\"}\n",
            "some jupyter-widgets leftover\n",
            "<?xml version=\"1.0\"?>\n",
            "kept line\n",
        );
        let out = normalize(md);
        assert!(!out.contains("base64"));
        assert!(!out.contains("photo.png"));
        assert!(!out.contains("model_id"));
        assert!(!out.contains("jupyter-widgets"));
        assert!(!out.contains("<?xml"));
        assert!(out.contains("kept line"));
    }

    #[test]
    fn test_script_blocks_stripped() {
        let md = "# T\n\nbefore\n(function() {\n  var x = {a: 1};\n  track(x);\n})();\nafter\n";
        let out = normalize(md);
        assert!(out.contains("before"));
        assert!(out.contains("after"));
        assert!(!out.contains("track"));
    }

    #[test]
    fn test_punctuation_normalized() {
        let md = "# T\n\nit\u{2019}s \u{201c}quoted\u{201d} \u{2014} fine\u{2026} \u{a9} 2023 with \\_escaped\\_ and **bold**\n";
        let out = normalize(md);
        assert!(out.contains("it's \"quoted\" - fine... copyright 2023 with _escaped_ and bold"));
    }

    #[test]
    fn test_blank_runs_collapse_to_one_blank_line() {
        let md = "# T\n\n\n\n\nbody\n";
        let out = normalize(md);
        assert!(out.contains("# T\n\nbody"));
    }

    #[test]
    fn test_cell_markers_removed() {
        let md = "# T\n\n[3]:\n\nreal text\n";
        let out = normalize(md);
        assert!(!out.contains("[3]:"));
        assert!(out.contains("real text"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let md = concat!(
            "junk header\n",
            "# Setup [\u{b6}](#setup \"Permalink\")\n\n",
            "Install the [package](install.html) first \u{2014} it\u{2019}s quick.\n\n",
            "| col | col |\n| --- | --- |\n| a | b |\n\n",
            "```\n1 import thing\n2 thing.run()\n```\n\n\n\n",
            "tail prose\n",
        );
        let once = normalize(md);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("no headings at all\njust nav\n"), "");
    }
}
