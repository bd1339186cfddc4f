//! Anchor-keyed section splitting of normalized markdown.
//!
//! A section is everything between two permalink-carrying headings. The
//! permalink glyph survives link resolution in the normalizer precisely
//! so this module can key sections by the anchor slug of the heading
//! that opened them. Pages without any permalink marker become a single
//! section under [`NO_ANCHOR`].

/// Sentinel anchor for content that precedes any permalink heading.
pub const NO_ANCHOR: &str = "no-anchor";

/// A permalink link as the renderer and normalizer leave it.
const PERMALINK_MARK: &str = "[\u{b6}](";

/// Splits a normalized page into ordered `(anchor, body)` pairs.
///
/// - A line containing the permalink marker closes the current section
///   and opens a new one keyed by the slug in the link target. The
///   heading title becomes a `Title:` prefix of the new body.
/// - Headings without a permalink are rewritten to a compact `Label:`
///   line inside the currently open section, except at the very top of
///   the page where the title carries no content of its own.
/// - Fenced spans are reattached whole; a fence is never split across
///   sections.
///
/// Sections whose body is blank are dropped. Duplicate anchors get a
/// numeric suffix so the result is duplicate-free.
pub fn split_into_sections(markdown: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, String)> = Vec::new();
    let mut anchor = NO_ANCHOR.to_string();
    let mut body = String::new();

    for (i, part) in markdown.split("```").enumerate() {
        if i % 2 == 1 {
            body.push_str("\n```");
            body.push_str(part);
            body.push_str("```");
            continue;
        }
        for line in part.lines() {
            if line.contains(PERMALINK_MARK) {
                if !body.trim().is_empty() {
                    push_section(&mut sections, &anchor, std::mem::take(&mut body));
                } else {
                    body.clear();
                }
                let (title, slug) = split_permalink_heading(line);
                body.push_str(&title);
                body.push(':');
                anchor = slug;
            } else if line.starts_with('#') {
                // A heading opening the page adds no label: the page
                // title is already carried by the URL.
                if !body.trim().is_empty() {
                    body.push('\n');
                    body.push_str(heading_label(line));
                    body.push(':');
                }
            } else {
                body.push('\n');
                body.push_str(line);
            }
        }
    }

    if !body.trim().is_empty() {
        push_section(&mut sections, &anchor, body);
    }
    sections
}

/// Extracts `(title, anchor)` from a permalink heading line such as
/// `## Getting Started [¶](#getting-started "Permalink to this heading")`.
fn split_permalink_heading(line: &str) -> (String, String) {
    let mark = line.find(PERMALINK_MARK).unwrap_or(line.len());
    let title = line[..mark].trim_start_matches('#').trim().to_string();

    let target = &line[mark + PERMALINK_MARK.len()..];
    let slug: &str = target
        .split(|c| c == ')' || c == ' ')
        .next()
        .unwrap_or("")
        .trim_start_matches('#');

    let anchor = if slug.is_empty() {
        NO_ANCHOR.to_string()
    } else {
        slug.to_string()
    };
    (title, anchor)
}

fn heading_label(line: &str) -> &str {
    line.trim_start_matches('#').trim()
}

fn push_section(sections: &mut Vec<(String, String)>, anchor: &str, body: String) {
    let taken = |sections: &[(String, String)], key: &str| sections.iter().any(|(a, _)| a == key);

    let mut key = anchor.to_string();
    if taken(sections, &key) {
        let mut n = 2;
        while taken(sections, &format!("{}-{}", anchor, n)) {
            n += 1;
        }
        key = format!("{}-{}", anchor, n);
    }
    sections.push((key, body));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_without_permalinks_is_one_sentinel_section() {
        let md = "# Title\n\nHello world.\n\n```python\nprint(1)\n```\n";
        let sections = split_into_sections(md);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].0, NO_ANCHOR);
        assert!(sections[0].1.contains("Hello world."));
        assert!(sections[0].1.contains("print(1)"));
        // The page-opening title contributes no label.
        assert!(!sections[0].1.contains("Title:"));
    }

    #[test]
    fn test_two_permalink_headings_yield_two_keyed_sections() {
        let md = concat!(
            "# Install [\u{b6}](#install \"Permalink to this heading\")\n\n",
            "Run the installer.\n\n",
            "# Usage [\u{b6}](#usage \"Permalink to this heading\")\n\n",
            "Call the tool.\n",
        );
        let sections = split_into_sections(md);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].0, "install");
        assert!(sections[0].1.starts_with("Install:"));
        assert!(sections[0].1.contains("Run the installer."));
        assert_eq!(sections[1].0, "usage");
        assert!(sections[1].1.contains("Call the tool."));
    }

    #[test]
    fn test_plain_heading_attaches_as_label_to_open_section() {
        let md = concat!(
            "# Setup [\u{b6}](#setup)\n\n",
            "Base text.\n\n",
            "## Advanced options\n\n",
            "More text.\n",
        );
        let sections = split_into_sections(md);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].1.contains("Advanced options:"));
        assert!(sections[0].1.contains("More text."));
    }

    #[test]
    fn test_fences_are_never_split_across_sections() {
        let md = concat!(
            "# A [\u{b6}](#a)\n\n",
            "```python\n# not a heading [\u{b6}](#fake)\nx = 1\n```\n\n",
            "# B [\u{b6}](#b)\n\ntext\n",
        );
        let sections = split_into_sections(md);
        assert_eq!(sections.len(), 2);
        for (_, body) in &sections {
            assert_eq!(body.matches("```").count() % 2, 0);
        }
        assert!(sections[0].1.contains("#fake"));
        assert_eq!(sections[1].0, "b");
    }

    #[test]
    fn test_duplicate_anchors_get_numeric_suffix() {
        let md = concat!(
            "# One [\u{b6}](#same)\n\nfirst\n\n",
            "# Two [\u{b6}](#same)\n\nsecond\n\n",
            "# Three [\u{b6}](#same)\n\nthird\n",
        );
        let sections = split_into_sections(md);
        let anchors: Vec<&str> = sections.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(anchors, vec!["same", "same-2", "same-3"]);
    }

    #[test]
    fn test_blank_page_yields_no_sections() {
        assert!(split_into_sections("").is_empty());
        assert!(split_into_sections("\n\n\n").is_empty());
    }

    #[test]
    fn test_anchor_extraction_handles_tooltip_suffix() {
        let (title, anchor) =
            split_permalink_heading("## Loading data [\u{b6}](#loading-data \"Permalink\")");
        assert_eq!(title, "Loading data");
        assert_eq!(anchor, "loading-data");
    }
}
