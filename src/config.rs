/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module holds the [`Config`] struct that configures the behavior of stores and
//! serializers throughout the crate, and the [`Configurable`] trait implemented by
//! everything that carries a configuration.

use sealed::sealed;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AnnoError;
use crate::file::open_file_reader;
use crate::types::*;

pub trait Configurable: Sized {
    /// Obtain the configuration
    fn config(&self) -> &Config;

    /// Obtain the configuration mutably
    fn config_mut(&mut self) -> &mut Config;

    /// Builder pattern to associate a configuration
    fn with_config(mut self, config: Config) -> Self {
        self.set_config(config);
        self
    }

    /// Setter to associate a configuration
    fn set_config(&mut self, config: Config) -> &mut Self;
}

/// This holds the configuration. It is not limited to configuring a single part of the model,
/// but unifies all in a single configuration.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Debug mode, verbose output is printed to standard error
    pub(crate) debug: bool,

    /// Generate pseudo-random public identifiers when missing. Each will consist of 21
    /// URL-friendly ASCII symbols after a prefix of N for nodes, T for type definitions
    pub(crate) generate_ids: bool,

    /// The working directory, resolved against when opening relative files
    pub(crate) workdir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            generate_ids: true,
            workdir: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable debug mode. In debug mode, verbose output will be printed to standard error output
    pub fn with_debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    /// Is debug mode enabled or not?
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Generate public IDs when missing.
    /// Each will consist of 21 URL-friendly ASCII symbols after a type-dependent prefix
    pub fn with_generate_ids(mut self, value: bool) -> Self {
        self.generate_ids = value;
        self
    }

    /// Is generation of public IDs when missing enabled or not?
    pub fn generate_ids(&self) -> bool {
        self.generate_ids
    }

    /// Set the working directory, relative filenames will be resolved against it
    pub fn with_workdir(mut self, value: PathBuf) -> Self {
        self.workdir = Some(value);
        self
    }

    /// Return the working directory, if set
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_ref().map(|x| x.as_path())
    }

    /// Loads configuration from a JSON file
    pub fn from_file(filename: &str) -> Result<Self, AnnoError> {
        let reader = open_file_reader(filename, &Config::default())?;
        let deserializer = &mut serde_json::Deserializer::from_reader(reader);
        let result: Result<Self, _> = serde_path_to_error::deserialize(deserializer);
        result
            .map_err(|e| AnnoError::JsonError(e, filename.to_string(), "Reading config from file"))
    }
}

#[sealed]
impl TypeInfo for Config {
    fn typeinfo() -> Type {
        Type::Config
    }
}
