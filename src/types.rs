/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module contains lower-level common types and traits used throughout the crate:
//! the [`Handle`] trait for lightweight internal identifiers, the [`IdMap`] that resolves
//! public identifiers to handles, type introspection via [`TypeInfo`], and the internal
//! `debug()` logging helper.

use sealed::sealed;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::config::Config;

/// Type for store elements. The struct that owns a field of this type should implement the trait [`crate::StoreFor`].
pub type Store<T> = Vec<Option<T>>;
//                       ^------- reserved for deleted elements, so handles stay stable

/// The handle trait is implemented on various handle types. They have in common that they refer
/// to the internal id of a [`crate::Storable`] item in a [`Store`] by index. Types implementing this are
/// lightweight, do not borrow anything, and can be passed and copied freely.
/// This is a sealed trait, not implementable outside this crate.
#[sealed(pub(crate))]
pub trait Handle:
    Clone + Copy + core::fmt::Debug + PartialEq + Eq + PartialOrd + Ord + Hash
{
    /// Create a new handle for an internal ID. You shouldn't need this yourself; handles are
    /// generated for you when items are added to a store.
    fn new(intid: usize) -> Self;
    /// Returns the internal index for this handle
    fn as_usize(&self) -> usize;
}

/// A map mapping public IDs to internal ids, implemented as a HashMap.
/// Used to resolve public IDs to internal handles.
#[derive(Debug, Clone)]
pub struct IdMap<HandleType> {
    /// The actual map
    pub(crate) data: HashMap<String, HandleType>,

    /// A prefix that automatically generated IDs will get when added to this map
    pub(crate) autoprefix: String,
}

impl<HandleType> Default for IdMap<HandleType>
where
    HandleType: Handle,
{
    fn default() -> Self {
        Self {
            data: HashMap::new(),
            autoprefix: "_".to_string(),
        }
    }
}

impl<HandleType> IdMap<HandleType>
where
    HandleType: Handle,
{
    pub fn new(autoprefix: String) -> Self {
        Self {
            autoprefix,
            ..Self::default()
        }
    }

    /// Sets a prefix that automatically generated IDs will get when added to this map
    pub fn set_autoprefix(&mut self, autoprefix: String) {
        self.autoprefix = autoprefix;
    }
}

/// This enumerates the types of the data model, used for introspection in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Config,
    TypeSchema,
    TypeDef,
    FeatureGraph,
    FeatureNode,
    PositionSignature,
    AgreementStudy,
    AgreementMatrix,
    TsvSchema,
    TsvDocument,
}

impl Type {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "Config",
            Self::TypeSchema => "TypeSchema",
            Self::TypeDef => "TypeDef",
            Self::FeatureGraph => "FeatureGraph",
            Self::FeatureNode => "FeatureNode",
            Self::PositionSignature => "PositionSignature",
            Self::AgreementStudy => "AgreementStudy",
            Self::AgreementMatrix => "AgreementMatrix",
            Self::TsvSchema => "TsvSchema",
            Self::TsvDocument => "TsvDocument",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// This trait is implemented on types of the data model and makes the type introspectable,
/// which is used when reporting errors.
/// This is a sealed trait, not implementable outside this crate.
#[sealed(pub(crate))]
pub trait TypeInfo {
    fn typeinfo() -> Type;
}

/// Internal logging helper. The message is only constructed (closure invoked) when debug mode
/// is enabled in the configuration, output goes to standard error.
pub(crate) fn debug<F>(config: &Config, message_func: F)
where
    F: FnOnce() -> String,
{
    if config.debug {
        eprintln!("[ANNODIFF DEBUG] {}", message_func());
    }
}
