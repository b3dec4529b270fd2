//! Descriptor inheritance
//!
//! Folds a descriptor's parent chain and `import`-scoped dependency
//! management into one effective project. Values stay raw while merging so
//! that a parent's `${project.version}` is read in the child's context, and
//! are expanded once at the end. Imported BOMs are expanded in their own
//! context before being spliced in.

use crate::context::ResolutionContext;
use futures::future::BoxFuture;
use futures::FutureExt;
use graft_errors::Error;
use graft_metadata::{DependencyDecl, Exclusion, Project};
use graft_types::{Coordinate, Message, ResolutionLevel};
use std::collections::BTreeMap;

/// Ancestor hops followed before a descriptor is treated as self-contained
pub const MAX_INHERITANCE_DEPTH: usize = 10;

/// Placeholder expansion passes before a value is declared unresolvable
const MAX_EXPANSION_PASSES: usize = 8;

/// A dependency with every field expanded and its version known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub coordinate: Coordinate,
    pub scope: Option<String>,
    pub optional: bool,
    pub classifier: Option<String>,
    pub kind: Option<String>,
    pub exclusions: Vec<Exclusion>,
}

/// Descriptor after inheritance and expansion
#[derive(Debug, Clone, Default)]
pub struct EffectiveProject {
    pub packaging: String,
    pub properties: BTreeMap<String, String>,
    /// Managed versions keyed by `(group, artifact)`
    pub dependency_management: BTreeMap<(String, String), ManagedDependency>,
    pub dependencies: Vec<ResolvedDependency>,
    /// Declared dependencies whose version could not be determined
    pub unversioned: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedDependency {
    pub version: String,
    pub scope: Option<String>,
}

/// Raw merge of a descriptor with its ancestors
#[derive(Debug, Clone, Default)]
struct Merged {
    packaging: Option<String>,
    properties: BTreeMap<String, String>,
    dependencies: Vec<DependencyDecl>,
    dependency_management: Vec<DependencyDecl>,
    /// Entries spliced in from imported BOMs, already expanded
    imported: Vec<(String, String, ManagedDependency)>,
}

/// Resolves inheritance for one descriptor, collecting diagnostics
pub(crate) struct InheritanceResolver<'a> {
    ctx: &'a ResolutionContext,
    level: ResolutionLevel,
    messages: Vec<Message>,
}

impl<'a> InheritanceResolver<'a> {
    pub(crate) fn new(ctx: &'a ResolutionContext, level: ResolutionLevel) -> Self {
        Self {
            ctx,
            level,
            messages: Vec::new(),
        }
    }

    /// Effective project for `coordinate`, whose own descriptor is `project`
    pub(crate) async fn resolve(
        mut self,
        coordinate: &Coordinate,
        project: &Project,
    ) -> (EffectiveProject, Vec<Message>) {
        let merged = self.merge(coordinate.clone(), project.clone(), 0).await;
        (finish(merged), self.messages)
    }

    fn merge(
        &mut self,
        coordinate: Coordinate,
        project: Project,
        depth: usize,
    ) -> BoxFuture<'_, Merged> {
        async move {
            let parent = match &project.parent {
                Some(parent_ref) if depth >= MAX_INHERITANCE_DEPTH => {
                    self.messages.push(
                        Message::warning(format!(
                            "parent chain deeper than {MAX_INHERITANCE_DEPTH} levels, not following {}:{}:{}",
                            parent_ref.group, parent_ref.artifact, parent_ref.version
                        ))
                        .with_detail(coordinate.to_string()),
                    );
                    None
                }
                Some(parent_ref) => {
                    let parent_coordinate =
                        Coordinate::new(&parent_ref.group, &parent_ref.artifact, &parent_ref.version);
                    match self.fetch(&parent_coordinate, "parent").await {
                        Some(parent_project) => Some(
                            self.merge(parent_coordinate, parent_project, depth + 1)
                                .await,
                        ),
                        None => None,
                    }
                }
                None => None,
            };

            let mut merged = parent.unwrap_or_default();

            // Own values win over anything inherited
            merged.properties.extend(project.properties.clone());
            let own_group = project
                .group
                .clone()
                .or_else(|| project.parent.as_ref().map(|p| p.group.clone()))
                .unwrap_or_else(|| coordinate.group.clone());
            let own_version = project
                .version
                .clone()
                .or_else(|| project.parent.as_ref().map(|p| p.version.clone()))
                .unwrap_or_else(|| coordinate.version.clone());
            let own_artifact = project
                .artifact
                .clone()
                .unwrap_or_else(|| coordinate.module.clone());
            for (key, value) in [
                ("project.groupId", own_group),
                ("project.artifactId", own_artifact),
                ("project.version", own_version),
            ] {
                merged.properties.insert(key.to_string(), value.clone());
                merged
                    .properties
                    .insert(key.replacen("project.", "pom.", 1), value);
            }
            if let Some(parent_ref) = &project.parent {
                for (key, value) in [
                    ("project.parent.groupId", &parent_ref.group),
                    ("project.parent.artifactId", &parent_ref.artifact),
                    ("project.parent.version", &parent_ref.version),
                ] {
                    merged.properties.insert(key.to_string(), value.clone());
                }
            }

            // Packaging is never inherited
            merged.packaging.clone_from(&project.packaging);

            override_by_key(&mut merged.dependencies, &project.dependencies);

            let (imports, managed): (Vec<_>, Vec<_>) = project
                .dependency_management
                .iter()
                .cloned()
                .partition(DependencyDecl::is_import);
            override_by_key(&mut merged.dependency_management, &managed);

            for import in imports {
                self.splice_import(&mut merged, &import, depth).await;
            }

            merged
        }
        .boxed()
    }

    /// Append the managed entries of an imported BOM
    async fn splice_import(&mut self, merged: &mut Merged, import: &DependencyDecl, depth: usize) {
        let expand = |value: Option<&str>| value.and_then(|v| expand_placeholders(v, &merged.properties));
        let (Some(group), Some(artifact), Some(version)) = (
            expand(import.group.as_deref()),
            expand(import.artifact.as_deref()),
            expand(import.version.as_deref()),
        ) else {
            self.messages.push(Message::warning(format!(
                "dependency management import {}:{} has no resolvable coordinate",
                import.group.as_deref().unwrap_or("?"),
                import.artifact.as_deref().unwrap_or("?"),
            )));
            return;
        };

        let bom = Coordinate::new(group, artifact, version);
        if depth >= MAX_INHERITANCE_DEPTH {
            self.messages.push(Message::warning(format!(
                "import chain deeper than {MAX_INHERITANCE_DEPTH} levels, not following {bom}"
            )));
            return;
        }
        let Some(bom_project) = self.fetch(&bom, "imported").await else {
            return;
        };

        let imported = finish(self.merge(bom, bom_project, depth + 1).await);
        merged.imported.extend(
            imported
                .dependency_management
                .into_iter()
                .map(|((group, artifact), managed)| (group, artifact, managed)),
        );
    }

    async fn fetch(&mut self, coordinate: &Coordinate, role: &str) -> Option<Project> {
        match self.ctx.descriptor(coordinate, self.level).await {
            Ok(project) => Some((*project).clone()),
            Err(e) => {
                let text = format!("{role} descriptor {coordinate} unavailable");
                let message = match (&e, self.level) {
                    (Error::Metadata(_), _) | (_, ResolutionLevel::Network) => Message::error(text),
                    (_, ResolutionLevel::Local) => Message::warning(text),
                };
                self.messages.push(message.with_detail(e.to_string()));
                None
            }
        }
    }
}

/// Replace entries of `base` that share a group+artifact key with `own`,
/// append the rest
fn override_by_key(base: &mut Vec<DependencyDecl>, own: &[DependencyDecl]) {
    for decl in own {
        let existing = decl
            .key()
            .and_then(|key| base.iter().position(|entry| entry.key() == Some(key)));
        match existing {
            Some(index) => base[index] = decl.clone(),
            None => base.push(decl.clone()),
        }
    }
}

/// Expand every raw value against the merged properties
fn finish(merged: Merged) -> EffectiveProject {
    let properties = merged.properties;
    let expand = |value: Option<&str>| value.and_then(|v| expand_placeholders(v, &properties));

    let mut dependency_management = BTreeMap::new();
    for (group, artifact, managed) in merged.imported {
        dependency_management.entry((group, artifact)).or_insert(managed);
    }
    for decl in &merged.dependency_management {
        let (Some(group), Some(artifact), Some(version)) = (
            expand(decl.group.as_deref()),
            expand(decl.artifact.as_deref()),
            expand(decl.version.as_deref()),
        ) else {
            continue;
        };
        // Explicit entries win over imported ones
        dependency_management.insert(
            (group, artifact),
            ManagedDependency {
                version,
                scope: expand(decl.scope.as_deref()),
            },
        );
    }

    let mut dependencies = Vec::new();
    let mut unversioned = Vec::new();
    for decl in &merged.dependencies {
        let (Some(group), Some(artifact)) = (
            expand(decl.group.as_deref()),
            expand(decl.artifact.as_deref()),
        ) else {
            continue;
        };
        let managed = dependency_management.get(&(group.clone(), artifact.clone()));
        let version = expand(decl.version.as_deref())
            .or_else(|| managed.and_then(|m| expand_placeholders(&m.version, &properties)));
        let Some(version) = version else {
            unversioned.push(format!("{group}:{artifact}"));
            continue;
        };
        let scope = expand(decl.scope.as_deref()).or_else(|| managed.and_then(|m| m.scope.clone()));

        dependencies.push(ResolvedDependency {
            coordinate: Coordinate::new(group, artifact, version),
            scope,
            optional: decl.optional,
            classifier: expand(decl.classifier.as_deref()),
            kind: expand(decl.kind.as_deref()),
            exclusions: decl.exclusions.clone(),
        });
    }

    let packaging = expand(merged.packaging.as_deref()).unwrap_or_else(|| "jar".to_string());

    EffectiveProject {
        packaging,
        properties,
        dependency_management,
        dependencies,
        unversioned,
    }
}

/// Expand `${name}` placeholders, following nested references for a bounded
/// number of passes. Returns `None` for empty values and values that still
/// contain placeholders after expansion.
#[must_use]
pub fn expand_placeholders(value: &str, properties: &BTreeMap<String, String>) -> Option<String> {
    let mut current = value.trim().to_string();
    if current.is_empty() {
        return None;
    }

    let mut passes = 0;
    while current.contains("${") {
        passes += 1;
        if passes > MAX_EXPANSION_PASSES {
            return None;
        }
        current = expand_once(&current, properties)?;
    }
    Some(current).filter(|value| !value.is_empty())
}

fn expand_once(raw: &str, properties: &BTreeMap<String, String>) -> Option<String> {
    let mut result = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let suffix = &rest[start + 2..];
        let end = suffix.find('}')?;
        result.push_str(properties.get(&suffix[..end])?);
        rest = &suffix[end + 1..];
    }
    result.push_str(rest);
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_nested_placeholders() {
        let properties = props(&[("a", "${b}"), ("b", "${c}-x"), ("c", "1.0")]);
        assert_eq!(
            expand_placeholders("v${a}", &properties).as_deref(),
            Some("v1.0-x")
        );
        assert_eq!(expand_placeholders("  ", &properties), None);
        assert_eq!(expand_placeholders("${missing}", &properties), None);
    }

    #[test]
    fn test_self_reference_is_bounded() {
        let properties = props(&[("loop", "${loop}")]);
        assert_eq!(expand_placeholders("${loop}", &properties), None);
    }

    #[test]
    fn test_unterminated_placeholder() {
        assert_eq!(expand_placeholders("${oops", &BTreeMap::new()), None);
    }

    #[test]
    fn test_own_declaration_overrides_inherited() {
        let inherited = DependencyDecl {
            group: Some("g".into()),
            artifact: Some("a".into()),
            version: Some("1".into()),
            ..DependencyDecl::default()
        };
        let own = DependencyDecl {
            version: Some("2".into()),
            ..inherited.clone()
        };
        let other = DependencyDecl {
            artifact: Some("b".into()),
            ..inherited.clone()
        };

        let mut base = vec![inherited];
        override_by_key(&mut base, &[own, other]);
        assert_eq!(base.len(), 2);
        assert_eq!(base[0].version.as_deref(), Some("2"));
        assert_eq!(base[1].artifact.as_deref(), Some("b"));
    }

    #[test]
    fn test_finish_backfills_from_management() {
        let merged = Merged {
            packaging: Some("bundle".into()),
            properties: props(&[("managed.version", "3.1")]),
            dependencies: vec![DependencyDecl {
                group: Some("g".into()),
                artifact: Some("a".into()),
                ..DependencyDecl::default()
            }],
            dependency_management: vec![DependencyDecl {
                group: Some("g".into()),
                artifact: Some("a".into()),
                version: Some("${managed.version}".into()),
                scope: Some("runtime".into()),
                ..DependencyDecl::default()
            }],
            imported: vec![(
                "g".into(),
                "a".into(),
                ManagedDependency {
                    version: "0.9".into(),
                    scope: None,
                },
            )],
        };

        let effective = finish(merged);
        assert_eq!(effective.packaging, "bundle");
        assert_eq!(effective.dependencies.len(), 1);
        assert_eq!(effective.dependencies[0].coordinate.version, "3.1");
        assert_eq!(effective.dependencies[0].scope.as_deref(), Some("runtime"));
    }
}
