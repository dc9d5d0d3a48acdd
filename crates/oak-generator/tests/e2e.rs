//! End-to-end tests for Oak.
//!
//! Each test lays out a site in a temporary directory and runs the whole
//! pipeline: YAML content, template files, rendering and writing.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use oak_core::{Encoding, SiteConfig};
use oak_generator::{Site, resolve};
use tempfile::TempDir;
use walkdir::WalkDir;

const DOCUMENT: &str = "title: Test document\ncontent: Test data\n";

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Three documents, each with a `{{ title }}` template at the same path.
fn document_site() -> TempDir {
    let dir = TempDir::new().unwrap();
    for prefix in ["", "folder1/", "folder2/"] {
        write(dir.path(), &format!("content/{prefix}document.yaml"), DOCUMENT);
        write(dir.path(), &format!("templates/{prefix}document.html"), "{{title}}");
    }
    dir
}

fn output_files(dir: &Path) -> BTreeSet<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect()
}

fn expected(paths: &[&str]) -> BTreeSet<PathBuf> {
    paths.iter().map(PathBuf::from).collect()
}

#[test]
fn test_documents_render_at_matching_paths() {
    let dir = document_site();
    let site = Site::new(SiteConfig::default(), dir.path());
    site.generate().unwrap();

    let out = site.output_dir();
    assert_eq!(
        output_files(&out),
        expected(&[
            "document.html",
            "folder1/document.html",
            "folder2/document.html"
        ])
    );
    for file in output_files(&out) {
        assert_eq!(fs::read_to_string(out.join(file)).unwrap(), "Test document");
    }
}

#[test]
fn test_excluded_templates_are_not_written() {
    let dir = document_site();
    let mut config = SiteConfig::default();
    config.render.exclude = vec!["folder2/.*".to_string()];
    let site = Site::new(config, dir.path());
    let stats = site.generate().unwrap();

    assert_eq!(stats.skipped, 1);
    assert_eq!(
        output_files(&site.output_dir()),
        expected(&["document.html", "folder1/document.html"])
    );
}

#[test]
fn test_children_template_binds_every_top_level_node() {
    let dir = document_site();
    let site = Site::new(SiteConfig::default(), dir.path());
    let tree = site.load_tree().unwrap();

    let bindings = resolve(&tree, "/_children/index.html");
    let bound: Vec<_> = bindings
        .iter()
        .map(|b| (b.path.as_str(), tree.url(b.node)))
        .collect();
    assert_eq!(
        bound,
        [
            ("/document/index.html", "/document".to_string()),
            ("/folder1/index.html", "/folder1".to_string()),
            ("/folder2/index.html", "/folder2".to_string()),
        ]
    );
}

#[test]
fn test_listing_and_detail_pages() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "content/index.yaml",
        "meta:\n  title: Working papers\n",
    );
    write(
        dir.path(),
        "content/papers.yaml",
        r#"
- id: trade
  title: Trade and firms
  year: 2021
  _templates:
    preview: "{{ title }} ({{ year }})"
- id: growth
  title: Growth
  year: 2019
  _templates:
    preview: "{{ title }} ({{ year }})"
"#,
    );
    write(
        dir.path(),
        "templates/papers/index.html",
        "<h1>{{ META.TITLE }}</h1>{% for p in current_page %}<p>{{ p }}</p>{% endfor %}",
    );
    write(
        dir.path(),
        "templates/papers/_children.html",
        "<h1>{{ title }}</h1><a href=\"{{ current_page._parent._url }}\">up</a>",
    );

    let site = Site::new(SiteConfig::default(), dir.path());
    let stats = site.generate().unwrap();
    assert_eq!(stats.templates, 2);
    assert_eq!(stats.artifacts, 3);

    let out = site.output_dir();
    assert_eq!(
        fs::read_to_string(out.join("papers/index.html")).unwrap(),
        "<h1>Working papers</h1><p>Trade and firms (2021)</p><p>Growth (2019)</p>"
    );
    assert_eq!(
        fs::read_to_string(out.join("papers/trade.html")).unwrap(),
        "<h1>Trade and firms</h1><a href=\"/papers\">up</a>"
    );
    assert!(out.join("papers/growth.html").is_file());
}

#[test]
fn test_clean_then_generate_reproduces_file_set() {
    let dir = document_site();
    let site = Site::new(SiteConfig::default(), dir.path());

    site.generate().unwrap();
    let first = output_files(&site.output_dir());

    write(&site.output_dir(), "leftover/old.html", "old");
    site.clean().unwrap();
    site.generate().unwrap();

    assert_eq!(output_files(&site.output_dir()), first);
}

#[test]
fn test_written_bytes_round_trip() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "content/page.yaml", "body: \"Grüße, naïve café\"\n");
    write(dir.path(), "templates/page.txt", "{{ body }}");

    for encoding in [Encoding::Utf8, Encoding::Latin1] {
        let mut config = SiteConfig::default();
        config.render.encoding = encoding;
        let site = Site::new(config, dir.path());

        let artifacts = site.render_all().unwrap();
        site.generate().unwrap();

        let expected = artifacts[0].encoded().unwrap();
        let written = fs::read(site.output_dir().join("page.txt")).unwrap();
        assert_eq!(written, expected.as_ref(), "{encoding}");
    }
}

#[test]
fn test_filters_in_templates() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "content/stats.yaml",
        "visitors: 1234567\nshare: 0.256\nauthor: Koren, Miklós\nupdated: 2024-03-05\n",
    );
    write(
        dir.path(),
        "templates/stats.txt",
        "{{ visitors|number }} {{ share|percent }} {{ author|author_name('initials') }} {{ updated|date('%Y') }}",
    );

    let site = Site::new(SiteConfig::default(), dir.path());
    site.generate().unwrap();
    assert_eq!(
        fs::read_to_string(site.output_dir().join("stats.txt")).unwrap(),
        "1,234,567 25.6% M. Koren 2024"
    );
}

#[test]
fn test_template_error_is_fatal() {
    let dir = document_site();
    write(dir.path(), "templates/bad.html", "{{ title|number }}");
    let site = Site::new(SiteConfig::default(), dir.path());
    assert!(site.generate().is_err());
}

#[test]
fn test_dot_dot_key_cannot_write_outside_output() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "content/index.yaml",
        "\"..\":\n  title: escaped\nnews:\n  title: News\n",
    );
    write(dir.path(), "templates/_children/index.html", "{{ title }}");
    let site = Site::new(SiteConfig::default(), dir.path());

    assert!(site.generate().is_err());
    assert!(!dir.path().join("index.html").exists());
    assert!(!site.output_dir().exists());
}
