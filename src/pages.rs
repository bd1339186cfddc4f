//! Page discovery: walking the rendered documentation tree.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::DocsConfig;
use crate::models::Page;

/// Enumerates the HTML pages under the configured docs root, sorted by
/// path for deterministic runs. Auto-generated API reference trees
/// (any path with an `api/` segment) are skipped.
pub fn scan_pages(config: &DocsConfig) -> Result<Vec<Page>> {
    if !config.root.exists() {
        bail!("Docs root does not exist: {}", config.root.display());
    }

    let include = build_globset(&["**/*.html"])?;
    let exclude = build_globset(&["api/**", "**/api/**"])?;

    let mut pages = Vec::new();
    for entry in WalkDir::new(&config.root).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(&config.root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        if !include.is_match(relative) || exclude.is_match(relative) {
            continue;
        }
        pages.push(Page {
            filepath: entry.path().to_path_buf(),
            url: page_url(&config.base_url, relative),
            doc_type: classify_doc_type(relative, &config.doc_types),
        });
    }

    pages.sort_by(|a, b| a.filepath.cmp(&b.filepath));
    Ok(pages)
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Public URL for a page, from the base URL and the path relative to
/// the docs root.
pub fn page_url(base_url: &str, relative: &Path) -> String {
    let rel = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", base_url.trim_end_matches('/'), rel)
}

/// First vocabulary entry appearing as a path segment prefix, in
/// vocabulary order. `None` when nothing matches.
pub fn classify_doc_type(relative: &Path, vocabulary: &[String]) -> Option<String> {
    let path = relative.to_string_lossy();
    vocabulary
        .iter()
        .find(|doc_type| path.contains(doc_type.as_str()))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<html></html>").unwrap();
    }

    #[test]
    fn test_scan_finds_html_and_skips_api_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("index.html"));
        touch(&root.join("user_guide/basics.html"));
        touch(&root.join("api/generated.core.html"));
        touch(&root.join("nested/api/module.html"));
        touch(&root.join("user_guide/notes.txt"));

        let config = DocsConfig {
            root: root.to_path_buf(),
            ..DocsConfig::default()
        };
        let pages = scan_pages(&config).unwrap();
        let names: Vec<String> = pages
            .iter()
            .map(|p| {
                p.filepath
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["index.html", "user_guide/basics.html"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let config = DocsConfig {
            root: "/definitely/not/here".into(),
            ..DocsConfig::default()
        };
        assert!(scan_pages(&config).is_err());
    }

    #[test]
    fn test_page_url_joins_cleanly() {
        assert_eq!(
            page_url("https://docs.example.com/", Path::new("user_guide/basics.html")),
            "https://docs.example.com/user_guide/basics.html"
        );
    }

    #[test]
    fn test_doc_type_from_path() {
        let vocab = DocsConfig::default().doc_types;
        assert_eq!(
            classify_doc_type(Path::new("user_guide/basics.html"), &vocab),
            Some("user_guide".to_string())
        );
        assert_eq!(
            classify_doc_type(Path::new("tutorials/detectron.html"), &vocab),
            Some("tutorials".to_string())
        );
        assert_eq!(classify_doc_type(Path::new("index.html"), &vocab), None);
    }
}
