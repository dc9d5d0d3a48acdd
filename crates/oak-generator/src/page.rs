//! Single node rendering through the node's own template metadata.
//!
//! Nodes may carry template sources by role (`preview`, `detail`) in their
//! metadata. This path renders one node with those templates and does not go
//! through the resolver.

use oak_core::{Encoding, NodeId};

use crate::{
    node::{PREVIEW_ROLE, RenderScope},
    template::{Result, TemplateError},
};

/// Template role used for a node's full page.
pub const DETAIL_ROLE: &str = "detail";

/// A page rendered from a node's `detail` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaPage {
    pub name: String,
    pub content: String,
    pub path: String,
    pub extension: String,
    pub encoding: Encoding,
}

impl MetaPage {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            path: String::new(),
            extension: "html".to_string(),
            encoding: Encoding::Utf8,
        }
    }

    /// `name.extension`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }
}

fn template<'s>(scope: &'s RenderScope, id: NodeId, role: &str) -> Result<&'s str> {
    let tree = scope.tree();
    tree.metadata(id)
        .template(role)
        .ok_or_else(|| TemplateError::NotFound(format!("{}#{role}", tree.url(id))))
}

/// Render the node's `preview` template against its children.
pub fn render_preview(scope: &RenderScope, id: NodeId) -> Result<String> {
    let source = template(scope, id, PREVIEW_ROLE)?;
    scope.checked(|| {
        Ok(scope
            .environment()
            .render_str(source, scope.children_context(id))?)
    })
}

/// Render the node's `detail` template against its children and
/// `current_page`.
pub fn render_detail(scope: &RenderScope, id: NodeId) -> Result<MetaPage> {
    let source = template(scope, id, DETAIL_ROLE)?;
    let mut context = scope.children_context(id);
    context.insert("current_page".to_string(), scope.node(id));
    let content = scope.checked(|| Ok(scope.environment().render_str(source, context)?))?;
    Ok(MetaPage::new(scope.tree().name(id), content))
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Arc};

    use oak_parser::DocumentBuilder;

    use super::*;
    use crate::template::TemplateSet;

    const PAPERS: &str = r#"
_templates:
  detail: "<ul>{% for item in current_page %}<li>{{ item }}</li>{% endfor %}</ul>"
paper1:
  _templates:
    preview: "{{ title }}"
    detail: "Detail. T={{ title }}"
  title: First paper
  content: First content
paper2:
  _templates:
    preview: "{{ title }}"
  title: Second paper
  content: Second content
"#;

    fn scope() -> RenderScope {
        let tree = DocumentBuilder::new("id")
            .tree_from_str("papers", PAPERS, Path::new("papers.yaml"))
            .unwrap();
        let templates = TemplateSet::default();
        RenderScope::new(Arc::new(tree), Arc::clone(templates.environment()))
    }

    #[test]
    fn test_preview() {
        let scope = scope();
        let paper1 = scope.tree().get_by_url("/paper1").unwrap();
        assert_eq!(render_preview(&scope, paper1).unwrap(), "First paper");
    }

    #[test]
    fn test_detail() {
        let scope = scope();
        let paper1 = scope.tree().get_by_url("/paper1").unwrap();
        let page = render_detail(&scope, paper1).unwrap();
        assert_eq!(page.content, "Detail. T=First paper");
        assert_eq!(page.name, "paper1");
        assert_eq!(page.file_name(), "paper1.html");
        assert_eq!(page.encoding, Encoding::Utf8);
    }

    #[test]
    fn test_detail_lists_children_through_previews() {
        let scope = scope();
        let page = render_detail(&scope, scope.tree().root()).unwrap();
        assert_eq!(
            page.content,
            "<ul><li>First paper</li><li>Second paper</li></ul>"
        );
        assert_eq!(page.name, "papers");
    }

    #[test]
    fn test_missing_role() {
        let scope = scope();
        let paper2 = scope.tree().get_by_url("/paper2").unwrap();
        match render_detail(&scope, paper2) {
            Err(TemplateError::NotFound(what)) => assert_eq!(what, "/paper2#detail"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
