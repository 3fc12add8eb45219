/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module computes [`PositionSignature`]s: canonical strings that capture an
//! annotation's span together with the spans and values of everything it transitively
//! references. Two annotations of the same type, at the same span, with structurally
//! identical referenced substructure produce identical signatures, which makes the
//! signature the identity key for matching annotations across independently annotated
//! copies of the same document.

use crate::types::__seal_type_info;
use sealed::sealed;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

#[cfg(feature = "digest")]
use sha1::{Digest, Sha1};

use crate::config::Configurable;
use crate::error::AnnoError;
use crate::graph::{FeatureGraph, FeatureValue, NodeHandle};
use crate::schema::{FeatureRange, TypeDefHandle};
use crate::store::StoreFor;
use crate::types::{debug, Type, TypeInfo};

/// A position signature: one part string per contributing node visited, in traversal
/// order, plus the aggregate string that serves as the equality key. Equality and hashing
/// are structural, defined over the aggregate only.
#[derive(Debug, Clone)]
pub struct PositionSignature {
    parts: Vec<String>,
    aggregate: String,
}

impl PositionSignature {
    pub(crate) fn new(parts: Vec<String>) -> Self {
        let aggregate = parts.join(";");
        Self { parts, aggregate }
    }

    /// The aggregate signature string, the equality key
    pub fn as_str(&self) -> &str {
        &self.aggregate
    }

    /// The per-node part strings, in traversal order
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn into_string(self) -> String {
        self.aggregate
    }

    /// Returns a compact hex-encoded SHA-1 digest of the aggregate, usable as a short
    /// identity key where full signature strings are too unwieldy
    #[cfg(feature = "digest")]
    pub fn digest(&self) -> String {
        let hash = Sha1::digest(self.aggregate.as_bytes());
        base16ct::lower::encode_string(&hash)
    }
}

impl PartialEq for PositionSignature {
    fn eq(&self, other: &Self) -> bool {
        self.aggregate == other.aggregate
    }
}

impl Eq for PositionSignature {}

impl Hash for PositionSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.aggregate.hash(state);
    }
}

impl fmt::Display for PositionSignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.aggregate)
    }
}

#[sealed]
impl TypeInfo for PositionSignature {
    fn typeinfo() -> Type {
        Type::PositionSignature
    }
}

/// Escapes a string for embedding in a signature part, so that delimiters in values can
/// never make two distinct structures render identically
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | ';' | '=' | ' ' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

impl FeatureGraph {
    /// Computes the position signature of the given node: the root contributes its type
    /// and span, then a depth-first traversal over reference-typed features in their
    /// declared order collects the referenced substructure, where string and int features
    /// contribute their value at the visiting node. The root's *own* primitive features
    /// are deliberately not part of the signature: the signature identifies a position,
    /// and including the root's label would prevent two annotators' differing labels at
    /// the same position from ever aligning.
    ///
    /// A node of the `leaf_type` (the atomic unit layer, e.g. tokens) is a traversal
    /// boundary and contributes nothing. A referenced node of the *root's own* type
    /// contributes only its position, not its substructure. Any node is visited at most
    /// once per call, so traversal terminates on arbitrary reference cycles.
    ///
    /// The root node must carry a span.
    pub fn position_signature(
        &self,
        root: NodeHandle,
        leaf_type: Option<TypeDefHandle>,
    ) -> Result<PositionSignature, AnnoError> {
        debug(self.config(), || {
            format!("FeatureGraph.position_signature: root={:?}", root)
        });
        let root_node = self.get(root)?;
        if root_node.span().is_none() {
            return Err(AnnoError::NoSpan(
                "position_signature requires the root node to carry a span",
            ));
        }
        let root_type = root_node.typedef();
        let mut parts = Vec::new();
        let mut visited: HashSet<NodeHandle> = HashSet::new();
        self.signature_node(root, root, root_type, leaf_type, &mut parts, &mut visited)?;
        Ok(PositionSignature::new(parts))
    }

    fn signature_node(
        &self,
        handle: NodeHandle,
        root: NodeHandle,
        root_type: TypeDefHandle,
        leaf_type: Option<TypeDefHandle>,
        parts: &mut Vec<String>,
        visited: &mut HashSet<NodeHandle>,
    ) -> Result<(), AnnoError> {
        if !visited.insert(handle) {
            //already visited during this traversal, contributes nothing the second time
            return Ok(());
        }
        let node = self.get(handle)?;
        let typedef = self.schema().typedef(node.typedef())?;

        let mut part = String::new();
        part.push_str(&escape(typedef.name()));
        match node.span() {
            Some(span) => part.push_str(&format!(" {}", span)),
            None => part.push_str(" -"),
        }

        //primitive features contribute to this node's part, except on the root, whose
        //own labels are not position information; references are collected and recursed
        //into afterwards, in declaration order
        let include_primitives = handle != root;
        let mut references: Vec<NodeHandle> = Vec::new();
        for (featuredef, value) in typedef.features().iter().zip(node.values()) {
            match (featuredef.range(), value) {
                (_, FeatureValue::Null) => {}
                (FeatureRange::Str, FeatureValue::String(s)) => {
                    if include_primitives {
                        part.push_str(&format!(" {}={}", escape(featuredef.name()), escape(s)));
                    }
                }
                (FeatureRange::Int, FeatureValue::Int(i)) => {
                    if include_primitives {
                        part.push_str(&format!(" {}={}", escape(featuredef.name()), i));
                    }
                }
                (FeatureRange::Reference(_), FeatureValue::Reference(target)) => {
                    references.push(*target);
                }
                _ => {
                    //a malformed signature would silently corrupt downstream comparison,
                    //so this propagates instead of recovering partially
                    return Err(AnnoError::SchemaMismatch(
                        format!(
                            "feature '{}.{}' holds a value outside its declared range",
                            typedef.name(),
                            featuredef.name()
                        ),
                        "position_signature",
                    ));
                }
            }
        }
        parts.push(part);

        for target in references {
            let target_node = self.get(target)?;
            if leaf_type == Some(target_node.typedef()) {
                //atomic units bound the traversal; visited for reachability but
                //contributing nothing
                visited.insert(target);
                continue;
            }
            if target_node.typedef() == root_type {
                //same-type references contribute their position only
                if visited.insert(target) {
                    let typedef = self.schema().typedef(target_node.typedef())?;
                    let span = target_node.span().ok_or(AnnoError::NoSpan(
                        "a same-type referenced node must carry a span",
                    ))?;
                    parts.push(format!("{} {}", escape(typedef.name()), span));
                }
                continue;
            }
            self.signature_node(target, root, root_type, leaf_type, parts, visited)?;
        }
        Ok(())
    }
}
