//! Scanned-tree-to-graph conversion.

use crate::config::{BuildConfiguration, Scaffold, Settings, project_settings, target_settings};
use crate::scan::SourceFiles;
use crate::token::{IdAllocator, Token, group_identity, group_key};
use camino::Utf8Path;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::groups::GroupTree;
use super::{FileNodes, Graph, GraphError, Node, NodeKind, PhaseKind, Value};

const PRODUCT_TYPE: &str = "com.apple.product-type.application";
const BUILD_ACTION_MASK: &str = "2147483647";

impl Graph {
    /// Build the complete project graph for `files` under `scaffold`.
    ///
    /// Nodes are inserted in a fixed order so that the serialised output is
    /// byte-stable: the product reference, then every file reference and
    /// build file in path order, then groups in pre-order, then the target,
    /// project, phases, configurations and configuration lists.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::KeyCollision`] when two keys derive the same
    /// token and [`GraphError::DuplicateId`] when a derived token equals a
    /// scaffold token.
    pub fn build(files: &SourceFiles, scaffold: &Scaffold) -> Result<Self, GraphError> {
        let ids = &scaffold.ids;
        let mut alloc = IdAllocator::new(scaffold.source.digest);
        for (token, key) in ids.reservations() {
            alloc.reserve(token, key)?;
        }

        let mut graph = Self::new(ids.project.clone());
        graph.insert(product_reference(scaffold))?;

        let mut by_dir: BTreeMap<&Utf8Path, Vec<Token>> = BTreeMap::new();
        let mut sources = Vec::with_capacity(files.len());
        for (path, name) in files {
            let FileNodes { reference, build } = FileNodes::derive(&mut alloc, path, name)?;
            let dir = path.parent().unwrap_or_else(|| Utf8Path::new(""));
            by_dir.entry(dir).or_default().push(reference.id.clone());
            sources.push(build.id.clone());
            graph.insert(reference)?;
            graph.insert(build)?;
        }

        let layout = scaffold.layout();
        let tree = GroupTree::plan(&layout, files);
        for (dir, references) in &by_dir {
            if !tree.contains(dir) {
                for (path, _) in files.iter().filter(|(path, _)| path.parent() == Some(*dir)) {
                    warn!(%path, "directory is not a declared group; file left out of the navigator");
                    graph.omit(path);
                }
                debug!(dir = %dir, count = references.len(), "skipped undeclared group");
            }
        }
        graph.insert_groups(&tree, &by_dir, &mut alloc, scaffold)?;
        graph.insert_scaffold(scaffold, sources)?;
        debug!(nodes = graph.len(), layout = ?layout, "built project graph");
        Ok(graph)
    }

    fn insert_groups(
        &mut self,
        tree: &GroupTree,
        by_dir: &BTreeMap<&Utf8Path, Vec<Token>>,
        alloc: &mut IdAllocator,
        scaffold: &Scaffold,
    ) -> Result<(), GraphError> {
        let ids = &scaffold.ids;
        let mut group_ids: IndexMap<&Utf8Path, Token> = IndexMap::new();
        for dir in tree.preorder() {
            let id = alloc.allocate_as(&group_key(dir.as_str()), &group_identity(dir.as_str()))?;
            group_ids.insert(dir, id);
        }
        let members = |dir: &Utf8Path| -> Vec<Token> {
            let subgroups = tree
                .subgroups(dir)
                .iter()
                .filter_map(|child| group_ids.get(child.as_path()).cloned());
            let references = by_dir.get(dir).into_iter().flatten().cloned();
            subgroups.chain(references).collect()
        };

        self.insert(
            Node::new(ids.main_group.clone(), NodeKind::Group, None)
                .with("sourceTree", "<group>")
                .with_children(vec![ids.source_group.clone(), ids.products_group.clone()]),
        )?;
        let source_path = scaffold
            .source
            .path
            .clone()
            .unwrap_or_else(|| scaffold.project.name.clone());
        self.insert(
            Node::new(ids.source_group.clone(), NodeKind::Group, Some(source_path.clone()))
                .with("path", source_path)
                .with("sourceTree", "<group>")
                .with_children(members(Utf8Path::new(""))),
        )?;
        self.insert(
            Node::new(
                ids.products_group.clone(),
                NodeKind::Group,
                Some("Products".into()),
            )
            .with("name", "Products")
            .with("sourceTree", "<group>")
            .with_children(vec![ids.product.clone()]),
        )?;
        for (dir, id) in &group_ids {
            let segment = dir.file_name().unwrap_or_default();
            self.insert(
                Node::new(id.clone(), NodeKind::Group, Some(segment.to_owned()))
                    .with("path", segment)
                    .with("sourceTree", "<group>")
                    .with_children(members(*dir)),
            )?;
        }
        Ok(())
    }

    fn insert_scaffold(&mut self, scaffold: &Scaffold, sources: Vec<Token>) -> Result<(), GraphError> {
        let ids = &scaffold.ids;
        let name = scaffold.project.name.as_str();

        self.insert(
            Node::new(ids.target.clone(), NodeKind::Target, Some(name.to_owned()))
                .with("buildConfigurationList", ids.target_config_list.clone())
                .with("buildRules", Value::List(Vec::new()))
                .with("dependencies", Value::List(Vec::new()))
                .with("name", name)
                .with("productName", name)
                .with("productReference", ids.product.clone())
                .with("productType", PRODUCT_TYPE)
                .with_children(vec![
                    ids.sources_phase.clone(),
                    ids.frameworks_phase.clone(),
                    ids.resources_phase.clone(),
                ]),
        )?;
        self.insert(project_object(scaffold))?;

        for (id, kind, files) in [
            (&ids.sources_phase, PhaseKind::Sources, sources),
            (&ids.frameworks_phase, PhaseKind::Frameworks, Vec::new()),
            (&ids.resources_phase, PhaseKind::Resources, Vec::new()),
        ] {
            self.insert(
                Node::new(id.clone(), NodeKind::Phase(kind), Some(kind.name().into()))
                    .with("buildActionMask", BUILD_ACTION_MASK)
                    .with("runOnlyForDeploymentPostprocessing", "0")
                    .with_children(files),
            )?;
        }

        let target = target_settings(&scaffold.project);
        let configurations = [
            (
                &ids.debug_project_config,
                BuildConfiguration::Debug,
                project_settings(BuildConfiguration::Debug, &scaffold.project),
            ),
            (
                &ids.release_project_config,
                BuildConfiguration::Release,
                project_settings(BuildConfiguration::Release, &scaffold.project),
            ),
            (&ids.debug_target_config, BuildConfiguration::Debug, target.clone()),
            (&ids.release_target_config, BuildConfiguration::Release, target),
        ];
        for (id, configuration, settings) in configurations {
            self.insert(configuration_node(id, configuration, &settings))?;
        }

        for (id, owner, debug, release) in [
            (
                &ids.project_config_list,
                NodeKind::Project,
                &ids.debug_project_config,
                &ids.release_project_config,
            ),
            (
                &ids.target_config_list,
                NodeKind::Target,
                &ids.debug_target_config,
                &ids.release_target_config,
            ),
        ] {
            self.insert(
                Node::new(
                    id.clone(),
                    NodeKind::ConfigurationList,
                    Some(format!(
                        "Build configuration list for {} \"{name}\"",
                        owner.isa()
                    )),
                )
                .with("defaultConfigurationIsVisible", "0")
                .with("defaultConfigurationName", BuildConfiguration::Release.as_str())
                .with_children(vec![debug.clone(), release.clone()]),
            )?;
        }
        Ok(())
    }
}

fn product_reference(scaffold: &Scaffold) -> Node {
    let product = scaffold.project.product_name();
    Node::new(
        scaffold.ids.product.clone(),
        NodeKind::ProductReference,
        Some(product.clone()),
    )
    .with("explicitFileType", "wrapper.application")
    .with("includeInIndex", "0")
    .with("path", product)
    .with("sourceTree", "BUILT_PRODUCTS_DIR")
}

fn project_object(scaffold: &Scaffold) -> Node {
    let ids = &scaffold.ids;
    let target_attributes = IndexMap::from([(
        ids.target.as_str().to_owned(),
        Value::Map(IndexMap::from([(
            "CreatedOnToolsVersion".to_owned(),
            Value::from("15.0"),
        )])),
    )]);
    let attributes = IndexMap::from([
        ("BuildIndependentTargetsInParallel".to_owned(), Value::from("1")),
        ("LastSwiftUpdateCheck".to_owned(), Value::from("1500")),
        ("LastUpgradeCheck".to_owned(), Value::from("1500")),
        ("TargetAttributes".to_owned(), Value::Map(target_attributes)),
    ]);
    Node::new(ids.project.clone(), NodeKind::Project, Some("Project object".into()))
        .with("attributes", Value::Map(attributes))
        .with("buildConfigurationList", ids.project_config_list.clone())
        .with("compatibilityVersion", "Xcode 14.0")
        .with("developmentRegion", "en")
        .with("hasScannedForEncodings", "0")
        .with(
            "knownRegions",
            Value::List(vec![Value::from("en"), Value::from("Base")]),
        )
        .with("mainGroup", ids.main_group.clone())
        .with("productRefGroup", ids.products_group.clone())
        .with("projectDirPath", "")
        .with("projectRoot", "")
        .with_children(vec![ids.target.clone()])
}

fn configuration_node(id: &Token, configuration: BuildConfiguration, settings: &Settings) -> Node {
    let build_settings = settings
        .iter()
        .map(|(key, value)| (key.clone(), Value::from(value)))
        .collect();
    Node::new(
        id.clone(),
        NodeKind::Configuration,
        Some(configuration.as_str().into()),
    )
    .with("buildSettings", Value::Map(build_settings))
    .with("name", configuration.as_str())
}
