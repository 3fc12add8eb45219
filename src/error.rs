/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module defines [`AnnoError`], the crate-wide error type. All fallible operations
//! in this crate return an [`AnnoResult`].

use std::error::Error;
use std::fmt;

/// Alias for `Result` with the error type fixed to [`AnnoError`]
pub type AnnoResult<T> = Result<T, AnnoError>;

/// This type encapsulates all different kinds of errors this crate can produce.
/// The final String/&str parameter of most variants is a contextual message describing
/// where the error occurred.
#[derive(Debug)]
pub enum AnnoError {
    /// A handle did not resolve to an item in the store
    HandleError(&'static str),

    /// A public ID did not resolve to an item
    IdError(String, &'static str),

    /// The item has no public ID but one was expected
    NoIdError(&'static str),

    /// The item is not bound to a store yet
    Unbound(&'static str),

    /// The public ID is already in use
    DuplicateIdError(String, &'static str),

    /// A type name did not resolve against the schema
    UndefinedType(String, &'static str),

    /// A feature name did not resolve against its type definition
    UndefinedFeature(String, &'static str),

    /// A feature value does not match the range declared for it in the schema
    SchemaMismatch(String, &'static str),

    /// The node carries no span but one is required
    NoSpan(&'static str),

    /// An annotation could not be placed on the token grid
    AlignmentError(String, &'static str),

    /// Serialization failed
    SerializationError(String),

    /// Wraps an I/O error, with the filename as second parameter
    IoError(std::io::Error, String, &'static str),

    /// Wraps a JSON deserialization error, with the filename as second parameter
    JsonError(
        serde_path_to_error::Error<serde_json::Error>,
        String,
        &'static str,
    ),

    OtherError(&'static str),
}

impl fmt::Display for AnnoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::HandleError(contextmsg) => {
                write!(f, "HandleError: No such handle ({})", contextmsg)
            }
            Self::IdError(id, contextmsg) => {
                write!(f, "IdError: No such ID: {} ({})", id, contextmsg)
            }
            Self::NoIdError(contextmsg) => {
                write!(f, "NoIdError: Item has no public ID ({})", contextmsg)
            }
            Self::Unbound(contextmsg) => write!(
                f,
                "Unbound: Item is not bound yet, add it to a store first ({})",
                contextmsg
            ),
            Self::DuplicateIdError(id, contextmsg) => {
                write!(f, "DuplicateIdError: ID already exists: {} ({})", id, contextmsg)
            }
            Self::UndefinedType(name, contextmsg) => {
                write!(f, "UndefinedType: No such type: {} ({})", name, contextmsg)
            }
            Self::UndefinedFeature(name, contextmsg) => {
                write!(f, "UndefinedFeature: No such feature: {} ({})", name, contextmsg)
            }
            Self::SchemaMismatch(msg, contextmsg) => {
                write!(f, "SchemaMismatch: {} ({})", msg, contextmsg)
            }
            Self::NoSpan(contextmsg) => {
                write!(f, "NoSpan: Node carries no span ({})", contextmsg)
            }
            Self::AlignmentError(msg, contextmsg) => {
                write!(f, "AlignmentError: {} ({})", msg, contextmsg)
            }
            Self::SerializationError(msg) => write!(f, "SerializationError: {}", msg),
            Self::IoError(err, filename, contextmsg) => {
                write!(f, "IoError: {} -- {} ({})", err, filename, contextmsg)
            }
            Self::JsonError(err, filename, contextmsg) => {
                write!(f, "JsonError: {} -- {} ({})", err, filename, contextmsg)
            }
            Self::OtherError(contextmsg) => write!(f, "OtherError: {}", contextmsg),
        }
    }
}

impl Error for AnnoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IoError(err, _, _) => Some(err),
            Self::JsonError(err, _, _) => Some(err),
            _ => None,
        }
    }
}
