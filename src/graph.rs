/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module implements [`FeatureGraph`], the in-memory representation of one annotated
//! document as supplied by one annotator: a store of typed [`FeatureNode`]s whose feature
//! values are validated against the graph's [`TypeSchema`]. Values are either primitives
//! (string/int) or references to other nodes, forming a directed graph over which
//! position signatures are computed.

use sealed::sealed;
use serde::{Deserialize, Serialize};

use crate::config::{Config, Configurable};
use crate::error::AnnoError;
use crate::offset::Offset;
use crate::schema::{FeatureRange, TypeDefHandle, TypeSchema};
use crate::store::*;
use crate::types::*;

/// Handle to a [`FeatureNode`] in a [`FeatureGraph`]
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(u32);

#[sealed]
impl Handle for NodeHandle {
    fn new(intid: usize) -> Self {
        Self(intid as u32)
    }
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// The value a feature holds on a node. Either a primitive or a reference to another node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type", content = "value")]
pub enum FeatureValue {
    /// No value set
    Null,
    String(String),
    Int(isize),
    /// A reference to another node in the same graph
    Reference(NodeHandle),
}

impl From<&str> for FeatureValue {
    fn from(item: &str) -> Self {
        Self::String(item.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(item: String) -> Self {
        Self::String(item)
    }
}

impl From<isize> for FeatureValue {
    fn from(item: isize) -> Self {
        Self::Int(item)
    }
}

impl From<i32> for FeatureValue {
    fn from(item: i32) -> Self {
        Self::Int(item as isize)
    }
}

impl From<usize> for FeatureValue {
    fn from(item: usize) -> Self {
        Self::Int(
            item.try_into()
                .expect("integer out of bounds (usize -> isize failed)"),
        )
    }
}

impl From<NodeHandle> for FeatureValue {
    fn from(item: NodeHandle) -> Self {
        Self::Reference(item)
    }
}

// These PartialEq implementations allow for more direct comparisons

impl PartialEq<str> for FeatureValue {
    fn eq(&self, other: &str) -> bool {
        match self {
            Self::String(v) => v == other,
            _ => false,
        }
    }
}

impl PartialEq<isize> for FeatureValue {
    fn eq(&self, other: &isize) -> bool {
        match self {
            Self::Int(v) => v == other,
            _ => false,
        }
    }
}

impl FeatureValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// One node in a feature-structure graph: an instance of a schema type, optionally anchored
/// to a span of the text, with one value slot per declared feature (in declaration order).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureNode {
    intid: Option<NodeHandle>,
    id: Option<String>,
    typedef: TypeDefHandle,
    span: Option<Offset>,
    values: Vec<FeatureValue>,
}

impl FeatureNode {
    /// The type of this node
    pub fn typedef(&self) -> TypeDefHandle {
        self.typedef
    }

    /// The span this node is anchored to, if any
    pub fn span(&self) -> Option<Offset> {
        self.span
    }

    /// The feature values, aligned with the declaration order of the node's type
    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    /// The value of the feature at the given declaration index
    pub fn value(&self, index: usize) -> Option<&FeatureValue> {
        self.values.get(index)
    }
}

#[sealed]
impl TypeInfo for FeatureNode {
    fn typeinfo() -> Type {
        Type::FeatureNode
    }
}

#[sealed]
impl Storable for FeatureNode {
    type HandleType = NodeHandle;

    fn handle(&self) -> Option<Self::HandleType> {
        self.intid
    }

    fn set_handle(&mut self, handle: Self::HandleType) {
        self.intid = Some(handle);
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn with_id(mut self, id: String) -> Self {
        self.id = Some(id);
        self
    }
}

pub(crate) enum ValueRequest {
    Value(FeatureValue),
    /// Reference to a node by public ID, resolved when the node is added to a graph
    ReferenceById(String),
}

/// Builder for [`FeatureNode`]s; pass it to [`FeatureGraph::annotate()`] or
/// [`FeatureGraph::with_node()`]. Feature values may reference other nodes either by handle
/// or by public ID (the target must already be in the graph).
pub struct FeatureNodeBuilder {
    id: Option<String>,
    type_name: String,
    span: Option<Offset>,
    values: Vec<(String, ValueRequest)>,
}

impl FeatureNodeBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            id: None,
            type_name: type_name.into(),
            span: None,
            values: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_span(mut self, span: Offset) -> Self {
        self.span = Some(span);
        self
    }

    /// Sets a feature to a value (a primitive, or a reference via a [`NodeHandle`])
    pub fn with_value(mut self, feature: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.values
            .push((feature.into(), ValueRequest::Value(value.into())));
        self
    }

    /// Sets a feature to a reference to another node, identified by its public ID
    pub fn with_reference_id(
        mut self,
        feature: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.values
            .push((feature.into(), ValueRequest::ReferenceById(target.into())));
        self
    }
}

/// The feature-structure graph for one annotated document, holding all of one annotator's
/// nodes over that document. Construction goes through [`FeatureNodeBuilder`]s, which are
/// validated against the graph's schema; a well-formed graph therefore never holds a value
/// outside its declared feature range.
#[derive(Debug)]
pub struct FeatureGraph {
    schema: TypeSchema,
    nodes: Store<FeatureNode>,
    node_idmap: IdMap<NodeHandle>,
    config: Config,
}

#[sealed]
impl TypeInfo for FeatureGraph {
    fn typeinfo() -> Type {
        Type::FeatureGraph
    }
}

impl Configurable for FeatureGraph {
    fn config(&self) -> &Config {
        &self.config
    }
    fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
    fn set_config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }
}

#[sealed]
impl StoreFor<FeatureNode> for FeatureGraph {
    fn store(&self) -> &Store<FeatureNode> {
        &self.nodes
    }
    fn store_mut(&mut self) -> &mut Store<FeatureNode> {
        &mut self.nodes
    }
    fn idmap(&self) -> Option<&IdMap<NodeHandle>> {
        Some(&self.node_idmap)
    }
    fn idmap_mut(&mut self) -> Option<&mut IdMap<NodeHandle>> {
        Some(&mut self.node_idmap)
    }
    fn store_typeinfo() -> &'static str {
        "FeatureGraph"
    }
}

impl FeatureGraph {
    pub fn new(schema: TypeSchema, config: Config) -> Self {
        Self {
            schema,
            nodes: Vec::new(),
            node_idmap: IdMap::new("N".to_string()),
            config,
        }
    }

    /// The schema this graph was built against
    pub fn schema(&self) -> &TypeSchema {
        &self.schema
    }

    /// Adds a node to the graph. The builder's type and features are resolved against the
    /// schema and every value is validated against the feature's declared range.
    pub fn annotate(&mut self, builder: FeatureNodeBuilder) -> Result<NodeHandle, AnnoError> {
        debug(&self.config, || {
            format!("FeatureGraph.annotate: type={}", builder.type_name)
        });
        let typedef_handle = self.schema.resolve(&builder.type_name)?;
        let typedef = self.schema.typedef(typedef_handle)?;

        //one slot per declared feature, defaulting to Null
        let mut values: Vec<FeatureValue> = vec![FeatureValue::Null; typedef.features().len()];
        for (feature_name, request) in builder.values {
            let index = typedef.feature_index(&feature_name).ok_or_else(|| {
                AnnoError::UndefinedFeature(
                    format!("{}.{}", typedef.name(), feature_name),
                    "annotate",
                )
            })?;
            let value = match request {
                ValueRequest::Value(value) => value,
                ValueRequest::ReferenceById(target) => {
                    FeatureValue::Reference(self.resolve_id(&target)?)
                }
            };
            self.validate_value(typedef_handle, index, &value)?;
            values[index] = value;
        }

        let node = FeatureNode {
            intid: None,
            id: builder.id,
            typedef: typedef_handle,
            span: builder.span,
            values,
        };
        self.insert(node)
    }

    /// Builder pattern variant of [`Self::annotate()`]
    pub fn with_node(mut self, builder: FeatureNodeBuilder) -> Result<Self, AnnoError> {
        self.annotate(builder)?;
        Ok(self)
    }

    /// Get a node by handle
    pub fn node(&self, handle: NodeHandle) -> Result<&FeatureNode, AnnoError> {
        self.get(handle)
    }

    /// Iterate over all nodes in the graph
    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &FeatureNode)> {
        self.iter_items()
    }

    /// Iterate over all nodes of the given type
    pub fn nodes_by_type(
        &self,
        typedef: TypeDefHandle,
    ) -> impl Iterator<Item = (NodeHandle, &FeatureNode)> {
        self.iter_items()
            .filter(move |(_, node)| node.typedef() == typedef)
    }

    /// Overwrites the value of a feature on an existing node, validated against the
    /// feature's declared range. This is what allows reference cycles to be closed after
    /// both nodes exist.
    pub fn set_value(
        &mut self,
        handle: NodeHandle,
        feature: &str,
        value: impl Into<FeatureValue>,
    ) -> Result<(), AnnoError> {
        let node = self.get(handle)?;
        let typedef_handle = node.typedef();
        let typedef = self.schema.typedef(typedef_handle)?;
        let index = typedef.feature_index(feature).ok_or_else(|| {
            AnnoError::UndefinedFeature(
                format!("{}.{}", typedef.name(), feature),
                "set_value",
            )
        })?;
        let value = value.into();
        self.validate_value(typedef_handle, index, &value)?;
        let node = self.get_mut(handle)?;
        node.values[index] = value;
        Ok(())
    }

    /// Checks that a value fits the declared range of the feature at the given index
    fn validate_value(
        &self,
        typedef_handle: TypeDefHandle,
        index: usize,
        value: &FeatureValue,
    ) -> Result<(), AnnoError> {
        if value.is_null() {
            //Null is admitted by every range
            return Ok(());
        }
        let typedef = self.schema.typedef(typedef_handle)?;
        let featuredef = &typedef.features()[index];
        match (featuredef.range(), value) {
            (FeatureRange::Str, FeatureValue::String(_)) => Ok(()),
            (FeatureRange::Int, FeatureValue::Int(_)) => Ok(()),
            (FeatureRange::Reference(target_type), FeatureValue::Reference(target)) => {
                let target_node = self.get(*target)?;
                let target_typedef = self.schema.typedef(target_node.typedef())?;
                if target_typedef.name() == target_type {
                    Ok(())
                } else {
                    Err(AnnoError::SchemaMismatch(
                        format!(
                            "feature '{}.{}' expects a reference to type '{}', got '{}'",
                            typedef.name(),
                            featuredef.name(),
                            target_type,
                            target_typedef.name()
                        ),
                        "validate_value",
                    ))
                }
            }
            _ => Err(AnnoError::SchemaMismatch(
                format!(
                    "feature '{}.{}' holds a value outside its declared range",
                    typedef.name(),
                    featuredef.name()
                ),
                "validate_value",
            )),
        }
    }
}
