//! Project descriptor (POM) model
//!
//! Only the elements dependency resolution needs are read. Values are kept
//! raw: placeholders such as `${project.version}` survive parsing and are
//! expanded once the inheritance chain is known.

use graft_errors::MetadataError;
use roxmltree::{Document, Node};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Comment Gradle writes into descriptors of modules that also publish
/// module metadata
pub const MODULE_METADATA_MARKER: &str = "published-with-gradle-metadata";

/// Parsed descriptor, before inheritance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub group: Option<String>,
    pub artifact: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<DependencyDecl>,
    pub dependency_management: Vec<DependencyDecl>,
    /// Descriptor carries [`MODULE_METADATA_MARKER`]
    pub published_with_module_metadata: bool,
}

/// `<parent>` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

/// One `<dependency>` entry, from either `<dependencies>` or
/// `<dependencyManagement>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyDecl {
    pub group: Option<String>,
    pub artifact: Option<String>,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub classifier: Option<String>,
    /// `<type>`
    pub kind: Option<String>,
    pub exclusions: Vec<Exclusion>,
}

impl DependencyDecl {
    /// `scope` is `import`: the entry names a BOM whose management table is
    /// spliced in
    #[must_use]
    pub fn is_import(&self) -> bool {
        self.scope
            .as_deref()
            .is_some_and(|scope| scope.eq_ignore_ascii_case("import"))
    }

    /// `group:artifact` key used for management lookups
    #[must_use]
    pub fn key(&self) -> Option<(&str, &str)> {
        Some((self.group.as_deref()?, self.artifact.as_deref()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub group: String,
    pub artifact: String,
}

impl Project {
    /// Parse descriptor bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not UTF-8, not well-formed XML, or
    /// have no `<project>` element.
    pub fn parse_bytes(data: &[u8]) -> Result<Self, MetadataError> {
        let text = std::str::from_utf8(data).map_err(|e| MetadataError::MalformedDescriptor {
            message: e.to_string(),
        })?;
        Self::parse(text)
    }

    /// Parse descriptor text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not well-formed XML or has no
    /// `<project>` element.
    pub fn parse(xml: &str) -> Result<Self, MetadataError> {
        let xml = xml.trim_start_matches('\u{feff}');
        let normalized = normalize_xml_entities(xml);
        let document = Document::parse(normalized.as_ref())?;
        let project = document
            .descendants()
            .find(|node| node.has_tag_name("project"))
            .ok_or_else(|| MetadataError::MissingElement {
                element: "project".to_string(),
            })?;

        let parent = child(&project, "parent").map(parse_parent).transpose()?;

        Ok(Self {
            group: node_text(&project, "groupId"),
            artifact: node_text(&project, "artifactId"),
            version: node_text(&project, "version"),
            packaging: node_text(&project, "packaging"),
            parent,
            properties: parse_properties(&project),
            dependencies: parse_dependency_group(&project, "dependencies"),
            dependency_management: parse_dependency_group(&project, "dependencyManagement"),
            published_with_module_metadata: xml.contains(MODULE_METADATA_MARKER),
        })
    }
}

fn parse_parent(node: Node<'_, '_>) -> Result<ParentRef, MetadataError> {
    let field = |tag: &str| {
        node_text(&node, tag).ok_or_else(|| MetadataError::MissingElement {
            element: format!("parent/{tag}"),
        })
    };
    Ok(ParentRef {
        group: field("groupId")?,
        artifact: field("artifactId")?,
        version: field("version")?,
    })
}

fn parse_properties(node: &Node<'_, '_>) -> BTreeMap<String, String> {
    child(node, "properties")
        .map(|props| {
            props
                .children()
                .filter(Node::is_element)
                .map(|prop| {
                    let key = prop.tag_name().name().to_string();
                    let value = prop.text().map(str::trim).unwrap_or_default().to_string();
                    (key, value)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_dependency_group(node: &Node<'_, '_>, group_tag: &str) -> Vec<DependencyDecl> {
    let Some(group) = child(node, group_tag) else {
        return Vec::new();
    };
    let deps_parent = if group_tag == "dependencies" {
        Some(group)
    } else {
        child(&group, "dependencies")
    };

    deps_parent
        .map(|parent| {
            parent
                .children()
                .filter(|c| c.is_element() && c.tag_name().name() == "dependency")
                .map(parse_dependency)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_dependency(node: Node<'_, '_>) -> DependencyDecl {
    let exclusions = child(&node, "exclusions")
        .map(|exclusions_node| {
            exclusions_node
                .children()
                .filter(|c| c.is_element() && c.tag_name().name() == "exclusion")
                .filter_map(|ex_node| {
                    Some(Exclusion {
                        group: node_text(&ex_node, "groupId")?,
                        artifact: node_text(&ex_node, "artifactId")?,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    DependencyDecl {
        group: node_text(&node, "groupId"),
        artifact: node_text(&node, "artifactId"),
        version: node_text(&node, "version"),
        scope: node_text(&node, "scope"),
        optional: node_text(&node, "optional").is_some_and(|value| value.eq_ignore_ascii_case("true")),
        classifier: node_text(&node, "classifier"),
        kind: node_text(&node, "type"),
        exclusions,
    }
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == tag)
}

fn node_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|c| c.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Replace entities roxmltree cannot resolve (old descriptors use HTML
/// entities such as `&nbsp;` in descriptions) with a space
fn normalize_xml_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            output.push(ch);
            continue;
        }

        let mut entity = String::new();
        while let Some(&next) = chars.peek() {
            entity.push(next);
            chars.next();
            if next == ';' || entity.len() > 32 {
                break;
            }
        }

        match entity.strip_suffix(';') {
            Some(name)
                if ["lt", "gt", "amp", "quot", "apos"]
                    .iter()
                    .any(|known| name.eq_ignore_ascii_case(known))
                    || name.starts_with('#') =>
            {
                output.push('&');
                output.push_str(&entity);
            }
            Some(_) => output.push(' '),
            None => {
                output.push('&');
                output.push_str(&entity);
            }
        }
    }

    Cow::Owned(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_entities_are_blanked() {
        let out = normalize_xml_entities("a&nbsp;b &amp; c &#169;");
        assert_eq!(out, "a b &amp; c &#169;");
    }

    #[test]
    fn test_missing_project_element() {
        let err = Project::parse("<settings/>").unwrap_err();
        assert!(matches!(err, MetadataError::MissingElement { .. }));
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            Project::parse("<project><groupId>x</project>"),
            Err(MetadataError::MalformedDescriptor { .. })
        ));
    }

    #[test]
    fn test_incomplete_parent_is_rejected() {
        let xml = "<project><parent><groupId>g</groupId></parent></project>";
        assert!(Project::parse(xml).is_err());
    }
}
