/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module implements CSV export for agreement results. Being an output format
//! concern, it is implemented as an extra feature and may be enabled/disabled at compile
//! time.

use csv;
use sealed::sealed;

use crate::agreement::{Agreement, AgreementMatrix};
use crate::config::Config;
use crate::error::AnnoError;
use crate::file::open_file_writer;

/// Implemented by results that can be written out as CSV.
/// This is a sealed trait, not implementable outside this crate.
#[sealed(pub(crate))]
pub trait ToCsv {
    /// Writes CSV output to the writer
    fn csv_writer<W>(&self, writer: W) -> Result<(), AnnoError>
    where
        W: std::io::Write;

    /// Returns the CSV output as a string
    fn to_csv_string(&self) -> Result<String, AnnoError> {
        let mut buffer = Vec::new();
        self.csv_writer(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            AnnoError::SerializationError(format!("CSV output was not valid utf-8: {}", e))
        })
    }

    /// Writes the CSV output to a file
    fn to_csv_file(&self, filename: &str, config: &Config) -> Result<(), AnnoError> {
        let writer = open_file_writer(filename, config)?;
        self.csv_writer(writer)
    }
}

#[sealed]
impl ToCsv for AgreementMatrix {
    /// Writes the matrix as CSV: a header row of annotator names, then one row per
    /// annotator with the pairwise scores. Pairs without data render as empty cells.
    fn csv_writer<W>(&self, writer: W) -> Result<(), AnnoError>
    where
        W: std::io::Write,
    {
        let mut writer = csv::Writer::from_writer(writer);
        let mut header: Vec<String> = Vec::with_capacity(self.len() + 1);
        header.push(String::new());
        header.extend(self.annotators().iter().cloned());
        writer
            .write_record(&header)
            .map_err(|e| AnnoError::SerializationError(format!("Failure serializing CSV: {}", e)))?;
        for (row, name) in self.annotators().iter().enumerate() {
            let mut record: Vec<String> = Vec::with_capacity(self.len() + 1);
            record.push(name.clone());
            for col in 0..self.len() {
                record.push(match self.score_at(row, col) {
                    Agreement::NoData => String::new(),
                    Agreement::Kappa(value) => format!("{}", value),
                });
            }
            writer.write_record(&record).map_err(|e| {
                AnnoError::SerializationError(format!("Failure serializing CSV: {}", e))
            })?;
        }
        writer
            .flush()
            .map_err(|e| AnnoError::SerializationError(format!("Failure serializing CSV: {}", e)))
    }
}
