//! Error types for parameter validation and on-disk artifacts.

use std::path::PathBuf;

/// Invalid planet or sun parameters.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    /// A length or coefficient that must be strictly positive is not.
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    /// The atmosphere shell does not enclose the planet.
    #[error("atmosphere radius {atmosphere} m must exceed planet radius {planet} m")]
    AtmosphereBelowSurface { planet: f64, atmosphere: f64 },

    /// The length scaling factor is zero, negative or not finite.
    #[error("invalid scaling factor {0}")]
    InvalidScaling(f64),
}

/// Errors from reading or writing the single-scattering LUT text format.
#[derive(Debug, thiserror::Error)]
pub enum LutError {
    /// Failed to read or write the LUT file.
    #[error("LUT io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The first line is not three positive integers.
    #[error("malformed LUT header: {0:?}")]
    Header(String),

    /// A cell line does not hold nine numbers.
    #[error("malformed LUT cell on line {line}")]
    Cell { line: usize },

    /// Fewer cells than the header announces.
    #[error("LUT truncated: expected {expected} cells, found {found}")]
    Truncated { expected: usize, found: usize },
}

/// Errors from loading or running a dense-network artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Failed to read or write the artifact.
    #[error("network io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The byte stream ended inside a record.
    #[error("network artifact truncated at byte {0}")]
    Truncated(usize),

    /// A layer kind other than dense or activation.
    #[error("unsupported layer kind {0}")]
    UnsupportedLayer(u32),

    /// An activation tag outside the known set.
    #[error("unknown activation tag {0}")]
    UnknownActivation(u32),

    /// Tensor ranks or consecutive layer widths disagree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The network does not take or produce the vector a model needs.
    #[error("{model} needs {expected_in} -> {expected_out}, network is {found_in} -> {found_out}")]
    Features {
        model: &'static str,
        expected_in: usize,
        expected_out: usize,
        found_in: usize,
        found_out: usize,
    },
}
