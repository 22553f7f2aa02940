//! Arena-indexed schema tree
//!
//! Each application owns one [`AppSchema`]: a vector of nodes addressed by
//! stable [`NodeId`]s, with the root composite at index zero. Children are
//! owned by id, the parent is a non-owning back id set exactly once at
//! insertion, so the tree carries no shared mutable pointers and no cycles.

use serde_json::Value;

use crate::error::ConfigError;
use crate::schema::decorate::Decoration;
use crate::schema::dependency::Dependency;
use crate::schema::{App, ControlAttribute, Platform, Release};
use crate::values::ValueValidator;

/// Stable index of a node inside one [`AppSchema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Declared value type of a leaf setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Bool,
    String,
    Integer,
    Number,
    StringArray,
}

impl ValueType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::StringArray => "string array",
        }
    }

    /// Whether a JSON value is compatible with this type
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

/// Data carried by a leaf setting
#[derive(Debug)]
pub struct LeafData {
    pub value_type: ValueType,
    pub min_release: Release,
    required: bool,
    platform_specific: bool,
    default_unspecified: Value,
    default_web: Option<Value>,
    default_app: Option<Value>,
    pub validator: Option<Box<dyn ValueValidator>>,
    pub decoration: Option<Decoration>,
}

impl LeafData {
    pub(crate) fn new(value_type: ValueType, min_release: Release, default: Value) -> Self {
        Self {
            value_type,
            min_release,
            required: false,
            platform_specific: false,
            default_unspecified: default,
            default_web: None,
            default_app: None,
            validator: None,
            decoration: None,
        }
    }

    /// Whether a concrete value for this leaf must exist in every document
    #[must_use]
    pub const fn required(&self) -> bool {
        self.required
    }

    /// Whether this leaf may carry per-platform overrides
    #[must_use]
    pub const fn platform_specific(&self) -> bool {
        self.platform_specific
    }

    // The flags are one-way: once required or platform-specific, always so.
    pub(crate) fn mark_required(&mut self) {
        self.required = true;
    }

    pub(crate) fn mark_platform_specific(&mut self) {
        self.platform_specific = true;
    }

    pub(crate) fn set_platform_default(
        &mut self,
        platform: Platform,
        value: Value,
    ) -> Result<(), ConfigError> {
        let slot = match platform {
            Platform::Unspecified => {
                self.default_unspecified = value;
                return Ok(());
            }
            Platform::Web => &mut self.default_web,
            Platform::App => &mut self.default_app,
        };

        if slot.is_some() {
            return Err(ConfigError::structural(format!(
                "Default for platform '{platform}' is already set"
            )));
        }

        *slot = Some(value);
        Ok(())
    }

    /// Schema default for a platform, falling back to the unspecified default
    #[must_use]
    pub fn default_for(&self, platform: Platform) -> &Value {
        let specific = match platform {
            Platform::Unspecified => None,
            Platform::Web => self.default_web.as_ref(),
            Platform::App => self.default_app.as_ref(),
        };
        specific.unwrap_or(&self.default_unspecified)
    }

    /// Full type/validator check of a candidate value
    ///
    /// # Errors
    ///
    /// Returns a type-mismatch or value-invalid error.
    pub fn check_value(&self, path: &str, value: &Value) -> Result<(), ConfigError> {
        if !self.value_type.matches(value) {
            return Err(ConfigError::type_mismatch(format!(
                "Setting '{}' expects a {} value, got: {}",
                path,
                self.value_type.name(),
                value
            )));
        }

        if let Some(validator) = self.validator.as_ref()
            && let Err(message) = validator.validate(value)
        {
            return Err(ConfigError::value_invalid(format!(
                "Setting '{path}': {message}"
            )));
        }

        if let Some(decoration) = self.decoration.as_ref()
            && let Err(message) = decoration.check(value)
        {
            return Err(ConfigError::value_invalid(format!(
                "Setting '{path}': {message}"
            )));
        }

        Ok(())
    }
}

/// Data carried by a composite setting
#[derive(Debug)]
pub struct CompositeData {
    pub(crate) children: Vec<NodeId>,
    pub control_attribute: ControlAttribute,
}

/// Composite or leaf payload of a node
#[derive(Debug)]
pub enum NodeKind {
    Composite(CompositeData),
    Leaf(LeafData),
}

/// One node of the schema tree
#[derive(Debug)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) kind: NodeKind,
}

/// The immutable schema tree of one application
#[derive(Debug)]
pub struct AppSchema {
    pub(crate) app: App,
    pub(crate) nodes: Vec<Node>,
}

impl AppSchema {
    /// Application this schema belongs to
    #[must_use]
    pub const fn app(&self) -> App {
        self.app
    }

    /// Id of the application root composite
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    #[must_use]
    pub fn dependencies(&self, id: NodeId) -> &[Dependency] {
        &self.nodes[id.0].dependencies
    }

    /// Leaf payload, `None` for composites
    #[must_use]
    pub fn leaf(&self, id: NodeId) -> Option<&LeafData> {
        match &self.nodes[id.0].kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Composite(_) => None,
        }
    }

    /// Composite payload, `None` for leaves
    #[must_use]
    pub fn composite(&self, id: NodeId) -> Option<&CompositeData> {
        match &self.nodes[id.0].kind {
            NodeKind::Composite(composite) => Some(composite),
            NodeKind::Leaf(_) => None,
        }
    }

    #[must_use]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Leaf(_))
    }

    /// Children of a composite in insertion order; empty for leaves
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].kind {
            NodeKind::Composite(composite) => &composite.children,
            NodeKind::Leaf(_) => &[],
        }
    }

    /// Find a direct child by name
    #[must_use]
    pub fn child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.name(*child) == name)
    }

    /// Resolve a dotted path relative to the application root
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root();
        for segment in path.split('.') {
            current = self.child_by_name(current, segment)?;
        }
        Some(current)
    }

    /// Path segments from the application root's children down to the node.
    /// The root's own name never appears in a path.
    #[must_use]
    pub fn path_segments(&self, id: NodeId) -> Vec<&str> {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            segments.push(self.name(current));
            current = parent;
        }
        segments.reverse();
        segments
    }

    /// Dot-joined path of a node; empty for the root itself
    #[must_use]
    pub fn path(&self, id: NodeId) -> String {
        self.path_segments(id).join(".")
    }

    /// All leaf ids underneath a node (the node itself when it is a leaf),
    /// in depth-first insertion order
    #[must_use]
    pub fn descendant_leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match &self.nodes[current.0].kind {
                NodeKind::Leaf(_) => leaves.push(current),
                NodeKind::Composite(composite) => {
                    stack.extend(composite.children.iter().rev().copied());
                }
            }
        }
        leaves
    }

    /// All leaf ids of the whole application tree
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeId> {
        self.descendant_leaves(self.root())
    }
}
