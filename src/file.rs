/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module contains some common helper functions for dealing with file I/O

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::AnnoError;
use crate::types::debug;

/// Get a file for reading or writing, this resolves relative files against the configured working directory
pub(crate) fn get_filepath(filename: &str, workdir: Option<&Path>) -> Result<PathBuf, AnnoError> {
    if filename == "-" {
        //designates stdin or stdout
        return Ok(filename.into());
    }
    let path = PathBuf::from(filename);
    if path.is_absolute() {
        Ok(path)
    } else {
        //check whether we can find one in our workdir first
        if let Some(workdir) = workdir {
            let path = workdir.join(&path);
            if path.is_file() {
                //should also work with symlinks
                return Ok(path);
            }
        }

        //final fallback is simply relative to the current working directory,
        //we don't test for existence here
        Ok(path)
    }
}

/// Auxiliary function to help open files
pub(crate) fn open_file(filename: &str, config: &Config) -> Result<File, AnnoError> {
    let found_filename = get_filepath(filename, config.workdir())?;
    debug(config, || format!("open_file: {:?}", found_filename));
    File::open(found_filename.as_path()).map_err(|e| {
        AnnoError::IoError(
            e,
            found_filename
                .as_path()
                .to_str()
                .expect("path must be valid unicode")
                .to_owned(),
            "Opening file for reading failed",
        )
    })
}

/// Auxiliary function to help create files
pub(crate) fn create_file(filename: &str, config: &Config) -> Result<File, AnnoError> {
    let found_filename = get_filepath(filename, config.workdir())?;
    debug(config, || format!("create_file: {:?}", found_filename));
    File::create(found_filename.as_path()).map_err(|e| {
        AnnoError::IoError(
            e,
            found_filename
                .as_path()
                .to_str()
                .expect("path must be valid unicode")
                .to_owned(),
            "Opening file for writing failed",
        )
    })
}

/// Auxiliary function to help open files for buffered reading
pub(crate) fn open_file_reader(
    filename: &str,
    config: &Config,
) -> Result<Box<dyn BufRead>, AnnoError> {
    if filename == "-" {
        //read from stdin
        Ok(Box::new(BufReader::new(std::io::stdin())))
    } else {
        Ok(Box::new(BufReader::new(open_file(filename, config)?)))
    }
}

/// Auxiliary function to help open files for buffered writing
pub(crate) fn open_file_writer(
    filename: &str,
    config: &Config,
) -> Result<Box<dyn Write>, AnnoError> {
    if filename == "-" {
        //write to stdout
        Ok(Box::new(BufWriter::new(std::io::stdout())))
    } else {
        Ok(Box::new(BufWriter::new(create_file(filename, config)?)))
    }
}
