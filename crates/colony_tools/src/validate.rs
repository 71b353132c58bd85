//! Data validation utilities.
//!
//! Every `*.ron` file in a data directory must parse as a
//! [`Specification`] and pass [`Specification::validate`].

use std::fs;
use std::path::{Path, PathBuf};

use colony_core::data::Specification;
use colony_core::error::ColonyError;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from data validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The data path does not exist or is not a directory.
    #[error("Data directory not found: {0}")]
    DirectoryNotFound(String),

    /// The directory holds no RON files.
    #[error("No .ron files in {0}")]
    NoDataFiles(String),

    /// Failed to read a file or the directory listing.
    #[error("Failed to read data: {0}")]
    ReadError(#[from] std::io::Error),

    /// A file parsed or validated with errors.
    #[error("{file}: {source}")]
    InvalidFile {
        /// Offending file.
        file: String,
        /// What was wrong with it.
        #[source]
        source: ColonyError,
    },
}

/// Load and check a single specification file.
///
/// # Errors
///
/// [`ValidationError::ReadError`] if the file cannot be read, or
/// [`ValidationError::InvalidFile`] if it does not parse or validate.
pub fn load_specification(path: &Path) -> Result<Specification, ValidationError> {
    let text = fs::read_to_string(path)?;
    let invalid = |source| ValidationError::InvalidFile {
        file: path.display().to_string(),
        source,
    };
    let spec = Specification::from_ron_str(&text).map_err(invalid)?;
    spec.validate().map_err(invalid)?;
    debug!(
        file = %path.display(),
        buildings = spec.buildings.len(),
        units = spec.units.len(),
        "Specification valid"
    );
    Ok(spec)
}

/// Validate all RON data files in a directory.
///
/// Returns the number of files checked.
///
/// # Errors
///
/// Returns an error if the directory is missing or empty, or if any data
/// file fails validation.
pub fn validate_data_directory(path: &Path) -> Result<usize, ValidationError> {
    if !path.is_dir() {
        return Err(ValidationError::DirectoryNotFound(path.display().to_string()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    files.retain(|file| file.extension().is_some_and(|ext| ext == "ron"));
    files.sort();

    if files.is_empty() {
        return Err(ValidationError::NoDataFiles(path.display().to_string()));
    }

    for file in &files {
        load_specification(file)?;
        info!(file = %file.display(), "OK");
    }
    Ok(files.len())
}
