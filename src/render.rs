//! Rendering HTML pages into the markdown dialect the pipeline expects.
//!
//! Sphinx-style pages mark every heading with a trailing `¶` permalink
//! anchor; the renderer preserves those as `[¶](#slug)` links so the
//! section splitter downstream can key sections by anchor. Everything
//! else maps to plain markdown: paragraphs with inline links, fenced
//! code from `<pre>`, list items, simple pipe tables.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static ROOT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article", "main", "div.document", "body"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static HEADERLINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a.headerlink").unwrap());
static TABLE_ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static TABLE_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("th, td").unwrap());
static LIST_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());

/// Renders one HTML page to markdown. Total: unparseable markup simply
/// yields less output.
pub fn render_markdown(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = ROOT_SELECTORS
        .iter()
        .find_map(|sel| document.select(sel).next());

    let mut out = String::new();
    if let Some(root) = root {
        walk_blocks(root, &mut out);
    }
    out
}

fn walk_blocks(node: ElementRef, out: &mut String) {
    for child in node.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "script" | "style" | "noscript" | "svg" | "nav" | "aside" => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => emit_heading(child, out),
            "p" => {
                let text = inline_text(child);
                if !text.is_empty() {
                    out.push_str(&text);
                    out.push_str("\n\n");
                }
            }
            "pre" => emit_code(child, out),
            "ul" | "ol" => emit_list(child, out),
            "table" => emit_table(child, out),
            _ => walk_blocks(child, out),
        }
    }
}

fn emit_heading(heading: ElementRef, out: &mut String) {
    let level = heading.value().name().as_bytes()[1] - b'0';
    let permalink = heading
        .select(&HEADERLINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    let title = heading
        .text()
        .collect::<String>()
        .replace('\u{b6}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if title.is_empty() {
        return;
    }

    for _ in 0..level {
        out.push('#');
    }
    out.push(' ');
    out.push_str(&title);
    if let Some(href) = permalink {
        out.push_str(" [\u{b6}](");
        out.push_str(&href);
        out.push_str(" \"Permalink to this heading\")");
    }
    out.push_str("\n\n");
}

fn emit_code(pre: ElementRef, out: &mut String) {
    let code: String = pre.text().collect();
    let code = code.trim_matches('\n');
    if code.trim().is_empty() {
        return;
    }
    out.push_str("```\n");
    out.push_str(code);
    out.push_str("\n```\n\n");
}

fn emit_list(list: ElementRef, out: &mut String) {
    for item in list.select(&LIST_ITEM) {
        let text = inline_text(item);
        if !text.is_empty() {
            out.push_str("* ");
            out.push_str(&text);
            out.push('\n');
        }
    }
    out.push('\n');
}

fn emit_table(table: ElementRef, out: &mut String) {
    for (i, row) in table.select(&TABLE_ROW).enumerate() {
        let cells: Vec<String> = row.select(&TABLE_CELL).map(inline_text).collect();
        if cells.is_empty() {
            continue;
        }
        out.push_str("| ");
        out.push_str(&cells.join(" | "));
        out.push_str(" |\n");
        if i == 0 {
            out.push('|');
            for _ in &cells {
                out.push_str(" --- |");
            }
            out.push('\n');
        }
    }
    out.push('\n');
}

/// Flattens an element to inline markdown: text, `[text](href)` links,
/// `![](src)` images, whitespace collapsed.
fn inline_text(el: ElementRef) -> String {
    let mut raw = String::new();
    push_inline(el, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_inline(el: ElementRef, out: &mut String) {
    for node in el.children() {
        if let Some(text) = node.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(node) {
            match child.value().name() {
                "a" => {
                    let mut inner = String::new();
                    push_inline(child, &mut inner);
                    let inner = inner.trim();
                    match child.value().attr("href") {
                        Some(href) if !inner.is_empty() => {
                            out.push('[');
                            out.push_str(inner);
                            out.push_str("](");
                            out.push_str(href);
                            out.push(')');
                        }
                        _ => out.push_str(inner),
                    }
                }
                "img" => {
                    if let Some(src) = child.value().attr("src") {
                        out.push_str("![](");
                        out.push_str(src);
                        out.push(')');
                    }
                }
                "script" | "style" => {}
                _ => push_inline(child, out),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_carries_permalink_link() {
        let html = r##"<html><body>
            <h2>Getting Started<a class="headerlink" href="#getting-started">¶</a></h2>
            <p>Welcome.</p>
        </body></html>"##;
        let md = render_markdown(html);
        assert!(md.contains(
            "## Getting Started [\u{b6}](#getting-started \"Permalink to this heading\")"
        ));
        assert!(md.contains("Welcome."));
    }

    #[test]
    fn test_heading_without_permalink_is_plain() {
        let html = "<html><body><h3>Plain heading</h3></body></html>";
        let md = render_markdown(html);
        assert!(md.contains("### Plain heading\n"));
        assert!(!md.contains("[\u{b6}]"));
    }

    #[test]
    fn test_pre_becomes_fenced_code() {
        let html = "<html><body><pre>import visiontool as vt\nds = vt.Dataset()</pre></body></html>";
        let md = render_markdown(html);
        assert!(md.contains("```\nimport visiontool as vt\nds = vt.Dataset()\n```"));
    }

    #[test]
    fn test_links_and_lists_render_inline() {
        let html = r#"<html><body>
            <p>See <a href="guide.html">the guide</a> for details.</p>
            <ul><li>first item</li><li>second item</li></ul>
        </body></html>"#;
        let md = render_markdown(html);
        assert!(md.contains("See [the guide](guide.html) for details."));
        assert!(md.contains("* first item\n* second item"));
    }

    #[test]
    fn test_scripts_and_styles_are_dropped() {
        let html = r#"<html><body>
            <script>window.dataLayer = [];</script>
            <style>.x { color: red; }</style>
            <p>Real content.</p>
        </body></html>"#;
        let md = render_markdown(html);
        assert!(md.contains("Real content."));
        assert!(!md.contains("dataLayer"));
        assert!(!md.contains("color: red"));
    }

    #[test]
    fn test_table_rows_render_with_pipes() {
        let html = r#"<html><body><table>
            <tr><th>Field</th><th>Type</th></tr>
            <tr><td>id</td><td>string</td></tr>
        </table></body></html>"#;
        let md = render_markdown(html);
        assert!(md.contains("| Field | Type |"));
        assert!(md.contains("| id | string |"));
    }
}
