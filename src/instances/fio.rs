//! # Module for File IO (Writing and Parsing)
//!
//! As the submodules have different APIs, it is recommended to parse and
//! write through the interface of the instance types rather than using
//! these functions directly.

use std::{fs::File, io, path::Path};

use thiserror::Error;

pub mod ccg;
pub mod json;
pub mod wcsp;
pub mod xcsp;

/// Combined Parsing Errors
#[derive(Error, Debug)]
pub enum ParsingError {
    /// IO Errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// CCG Parsing Error
    #[error("CCG error: {0}")]
    Ccg(#[from] ccg::Error),
    /// WCSP Parsing Error
    #[error("WCSP error: {0}")]
    Wcsp(#[from] wcsp::Error),
}

/// Opens a buffered reader for the file at `path`
pub(crate) fn open_reader<P: AsRef<Path>>(path: P) -> Result<io::BufReader<File>, io::Error> {
    Ok(io::BufReader::new(File::open(path)?))
}

/// Opens a buffered writer for the file at `path`
pub(crate) fn open_writer<P: AsRef<Path>>(path: P) -> Result<io::BufWriter<File>, io::Error> {
    Ok(io::BufWriter::new(File::create(path)?))
}
