/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module defines the type system that describes feature-structure graphs: a
//! [`TypeSchema`] holds [`TypeDef`] entries, each declaring an ordered list of
//! [`FeatureDef`]s with a [`FeatureRange`]. The schema is what makes graphs
//! introspectable; the signature traversal ([`crate::FeatureGraph::position_signature()`])
//! walks reference-typed features in their declared order.

use sealed::sealed;
use serde::{Deserialize, Serialize};

use crate::config::{Config, Configurable};
use crate::error::AnnoError;
use crate::file::open_file_reader;
use crate::store::*;
use crate::types::*;

/// Handle to a [`TypeDef`] in a [`TypeSchema`]
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeDefHandle(u16);

#[sealed]
impl Handle for TypeDefHandle {
    fn new(intid: usize) -> Self {
        Self(intid as u16)
    }
    fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// The range of a feature: the kind of value it may hold. References name their target
/// type by name, so a type can reference itself or a type defined later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type", content = "value")]
pub enum FeatureRange {
    /// A string value
    Str,
    /// An integer value
    Int,
    /// A reference to another node, of the named type
    Reference(String),
}

/// A feature declaration: a name and the range of values it admits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDef {
    name: String,
    range: FeatureRange,
}

impl FeatureDef {
    pub fn new(name: impl Into<String>, range: FeatureRange) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> &FeatureRange {
        &self.range
    }
}

/// A type definition: a name and an ordered list of feature declarations. The declaration
/// order is semantically relevant, it determines traversal order when signatures are built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDef {
    #[serde(skip)]
    intid: Option<TypeDefHandle>,

    /// The name doubles as the public ID of this type
    name: String,

    features: Vec<FeatureDef>,
}

impl PartialEq for TypeDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.features == other.features
    }
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            intid: None,
            name: name.into(),
            features: Vec::new(),
        }
    }

    /// Builder pattern to declare a feature; declaration order is preserved
    pub fn with_feature(mut self, name: impl Into<String>, range: FeatureRange) -> Self {
        self.features.push(FeatureDef::new(name, range));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The features of this type, in declaration order
    pub fn features(&self) -> &[FeatureDef] {
        &self.features
    }

    /// Looks up a feature by name, returns its index in declaration order
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name() == name)
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureDef> {
        self.features.iter().find(|f| f.name() == name)
    }
}

#[sealed]
impl TypeInfo for TypeDef {
    fn typeinfo() -> Type {
        Type::TypeDef
    }
}

#[sealed]
impl Storable for TypeDef {
    type HandleType = TypeDefHandle;

    fn handle(&self) -> Option<Self::HandleType> {
        self.intid
    }

    fn set_handle(&mut self, handle: Self::HandleType) {
        self.intid = Some(handle);
    }

    fn id(&self) -> Option<&str> {
        Some(self.name.as_str())
    }

    fn with_id(mut self, id: String) -> Self {
        self.name = id;
        self
    }
}

/// Holds the type definitions that describe one family of feature-structure graphs. Graphs
/// carry their schema; two graphs meant to be compared should be built against equal schemas.
#[derive(Debug, Clone)]
pub struct TypeSchema {
    types: Store<TypeDef>,
    type_idmap: IdMap<TypeDefHandle>,
    config: Config,
}

impl Default for TypeSchema {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[sealed]
impl TypeInfo for TypeSchema {
    fn typeinfo() -> Type {
        Type::TypeSchema
    }
}

impl Configurable for TypeSchema {
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
impl StoreFor<TypeDef> for TypeSchema {
    fn store(&self) -> &Store<TypeDef> {
        &self.types
    }
    fn store_mut(&mut self) -> &mut Store<TypeDef> {
        &mut self.types
    }
    fn idmap(&self) -> Option<&IdMap<TypeDefHandle>> {
        Some(&self.type_idmap)
    }
    fn idmap_mut(&mut self) -> Option<&mut IdMap<TypeDefHandle>> {
        Some(&mut self.type_idmap)
    }
    fn store_typeinfo() -> &'static str {
        "TypeSchema"
    }
}

impl TypeSchema {
    pub fn new(config: Config) -> Self {
        Self {
            types: Vec::new(),
            type_idmap: IdMap::new("T".to_string()),
            config,
        }
    }

    /// Builder pattern to add a type definition
    pub fn with_type(mut self, typedef: TypeDef) -> Result<Self, AnnoError> {
        self.insert(typedef)?;
        Ok(self)
    }

    /// Adds a type definition, returns a handle to it
    pub fn add_type(&mut self, typedef: TypeDef) -> Result<TypeDefHandle, AnnoError> {
        self.insert(typedef)
    }

    /// Resolves a type name to a handle
    pub fn resolve(&self, name: &str) -> Result<TypeDefHandle, AnnoError> {
        self.resolve_id(name)
    }

    /// Get a type definition by handle
    pub fn typedef(&self, handle: TypeDefHandle) -> Result<&TypeDef, AnnoError> {
        self.get(handle)
    }

    /// Iterate over all type definitions
    pub fn typedefs(&self) -> impl Iterator<Item = (TypeDefHandle, &TypeDef)> {
        self.iter_items()
    }

    /// Loads a type schema from a JSON file holding a list of type definitions
    pub fn from_file(filename: &str, config: Config) -> Result<Self, AnnoError> {
        let reader = open_file_reader(filename, &config)?;
        let deserializer = &mut serde_json::Deserializer::from_reader(reader);
        let result: Result<Vec<TypeDef>, _> = serde_path_to_error::deserialize(deserializer);
        let typedefs = result.map_err(|e| {
            AnnoError::JsonError(e, filename.to_string(), "Reading type schema from file")
        })?;
        let mut schema = Self::new(config);
        for typedef in typedefs {
            schema.insert(typedef)?;
        }
        Ok(schema)
    }

    /// Serializes the schema to a JSON string (a list of type definitions)
    pub fn to_json_string(&self) -> Result<String, AnnoError> {
        let typedefs: Vec<&TypeDef> = self.typedefs().map(|(_, typedef)| typedef).collect();
        serde_json::to_string_pretty(&typedefs)
            .map_err(|e| AnnoError::SerializationError(format!("Failure serializing schema: {}", e)))
    }
}
