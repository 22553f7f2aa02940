//! Fluent construction of application schemas
//!
//! The builder is the only way to grow a tree: every node gets its parent at
//! insertion and the parent can never change, sibling names stay unique, and
//! the one-way leaf flags (required, platform-specific) can only be switched
//! on. `build` freezes the result into an immutable [`AppSchema`].

use serde_json::Value;

use crate::error::ConfigError;
use crate::schema::decorate::Decoration;
use crate::schema::dependency::Dependency;
use crate::schema::node::{
    AppSchema, CompositeData, LeafData, Node, NodeId, NodeKind, ValueType,
};
use crate::schema::{App, ControlAttribute, Platform, Release, validate_node_name};
use crate::values::ValueValidator;

/// Builder for one application's schema tree
#[derive(Debug)]
pub struct AppSchemaBuilder {
    app: App,
    nodes: Vec<Node>,
}

impl AppSchemaBuilder {
    /// Start a new tree with the application root composite
    #[must_use]
    pub fn new(app: App, root_attribute: ControlAttribute) -> Self {
        let root = Node {
            name: app.config_name().to_owned(),
            parent: None,
            dependencies: Vec::new(),
            kind: NodeKind::Composite(CompositeData {
                children: Vec::new(),
                control_attribute: root_attribute,
            }),
        };

        Self {
            app,
            nodes: vec![root],
        }
    }

    /// Id of the application root
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a composite child
    ///
    /// # Errors
    ///
    /// Returns a structural error when the name is unusable, the parent is a
    /// leaf, or a sibling already carries the name.
    pub fn composite(
        &mut self,
        parent: NodeId,
        name: &str,
        attribute: ControlAttribute,
    ) -> Result<NodeId, ConfigError> {
        self.insert(
            parent,
            name,
            NodeKind::Composite(CompositeData {
                children: Vec::new(),
                control_attribute: attribute,
            }),
        )
    }

    /// Add a leaf child with its platform-unspecified default
    ///
    /// # Errors
    ///
    /// Returns a structural error when the name or parent is unusable, or a
    /// type-mismatch when the default does not match the declared type.
    pub fn leaf(
        &mut self,
        parent: NodeId,
        name: &str,
        value_type: ValueType,
        min_release: Release,
        default: Value,
    ) -> Result<NodeId, ConfigError> {
        if !value_type.matches(&default) {
            return Err(ConfigError::type_mismatch(format!(
                "Default for leaf '{}' is not a {} value: {}",
                name,
                value_type.name(),
                default
            )));
        }

        self.insert(
            parent,
            name,
            NodeKind::Leaf(LeafData::new(value_type, min_release, default)),
        )
    }

    fn insert(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
    ) -> Result<NodeId, ConfigError> {
        validate_node_name(name)?;

        let duplicate = match &self.nodes[parent.0].kind {
            NodeKind::Leaf(_) => {
                return Err(ConfigError::structural(format!(
                    "Cannot add '{}' under leaf '{}'",
                    name, self.nodes[parent.0].name
                )));
            }
            NodeKind::Composite(composite) => composite
                .children
                .iter()
                .any(|child| self.nodes[child.0].name == name),
        };

        if duplicate {
            return Err(ConfigError::structural(format!(
                "Duplicate child name '{}' under '{}'",
                name, self.nodes[parent.0].name
            )));
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_owned(),
            parent: Some(parent),
            dependencies: Vec::new(),
            kind,
        });

        if let NodeKind::Composite(composite) = &mut self.nodes[parent.0].kind {
            composite.children.push(id);
        }

        Ok(id)
    }

    /// Mark a leaf required; irreversible
    ///
    /// # Errors
    ///
    /// Returns a structural error when the node is not a leaf.
    pub fn require(&mut self, id: NodeId) -> Result<&mut Self, ConfigError> {
        self.leaf_mut(id)?.mark_required();
        Ok(self)
    }

    /// Mark a leaf platform-specific; irreversible
    ///
    /// # Errors
    ///
    /// Returns a structural error when the node is not a leaf.
    pub fn platform_specific(&mut self, id: NodeId) -> Result<&mut Self, ConfigError> {
        self.leaf_mut(id)?.mark_platform_specific();
        Ok(self)
    }

    /// Set a per-platform default; each specific platform at most once
    ///
    /// # Errors
    ///
    /// Returns a structural error when the node is not a platform-specific
    /// leaf or the platform default is already set, or a type-mismatch for an
    /// incompatible value.
    pub fn platform_default(
        &mut self,
        id: NodeId,
        platform: Platform,
        value: Value,
    ) -> Result<&mut Self, ConfigError> {
        let name = self.nodes[id.0].name.clone();
        let leaf = self.leaf_mut(id)?;

        if platform != Platform::Unspecified && !leaf.platform_specific() {
            return Err(ConfigError::structural(format!(
                "Leaf '{name}' is not platform-specific"
            )));
        }

        if !leaf.value_type.matches(&value) {
            return Err(ConfigError::type_mismatch(format!(
                "Default for leaf '{}' is not a {} value: {}",
                name,
                leaf.value_type.name(),
                value
            )));
        }

        leaf.set_platform_default(platform, value)?;
        Ok(self)
    }

    /// Plug a value validator into a leaf; at most one
    ///
    /// # Errors
    ///
    /// Returns a structural error when the node is not a leaf or already has
    /// a validator.
    pub fn validator(
        &mut self,
        id: NodeId,
        validator: Box<dyn ValueValidator>,
    ) -> Result<&mut Self, ConfigError> {
        let name = self.nodes[id.0].name.clone();
        let leaf = self.leaf_mut(id)?;

        if leaf.validator.is_some() {
            return Err(ConfigError::structural(format!(
                "Leaf '{name}' already has a validator"
            )));
        }

        leaf.validator = Some(validator);
        Ok(self)
    }

    /// Decorate a leaf; at most one decoration
    ///
    /// # Errors
    ///
    /// Returns a structural error when the node is not a leaf or already
    /// decorated.
    pub fn decorate(
        &mut self,
        id: NodeId,
        decoration: Decoration,
    ) -> Result<&mut Self, ConfigError> {
        let name = self.nodes[id.0].name.clone();
        let leaf = self.leaf_mut(id)?;

        if leaf.decoration.is_some() {
            return Err(ConfigError::structural(format!(
                "Leaf '{name}' is already decorated"
            )));
        }

        leaf.decoration = Some(decoration);
        Ok(self)
    }

    /// Attach a dependency to any node (composite or leaf)
    pub fn depends(&mut self, id: NodeId, dependency: Dependency) -> &mut Self {
        self.nodes[id.0].dependencies.push(dependency);
        self
    }

    fn leaf_mut(&mut self, id: NodeId) -> Result<&mut LeafData, ConfigError> {
        let name = self.nodes[id.0].name.clone();
        match &mut self.nodes[id.0].kind {
            NodeKind::Leaf(leaf) => Ok(leaf),
            NodeKind::Composite(_) => Err(ConfigError::structural(format!(
                "Node '{name}' is a composite, not a leaf"
            ))),
        }
    }

    /// Freeze the tree
    #[must_use]
    pub fn build(self) -> AppSchema {
        AppSchema {
            app: self.app,
            nodes: self.nodes,
        }
    }
}
