//! Scaling factor computation.
//!
//! Every computation is a function of a [`Context`](crate::Context) and the
//! on-disk tables it names. Nothing is cached between calls.

pub mod library_size;
pub mod merged;
pub mod spike_in;

use std::{
    convert::Infallible,
    fmt,
    io::{self, BufRead},
    path::{Path, PathBuf},
    str::FromStr,
};

use thiserror::Error;

use crate::{
    fs,
    scaling_factors::{self, ReadScalingFactorsError, ScalingFactors},
};

/// A normalization method.
///
/// Unrecognized names are kept as [`NormalizationMethod::Other`] so new
/// upstream methods can be looked up before they are handled explicitly.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum NormalizationMethod {
    /// Library size normalization over genomic bins (csaw).
    Csaw,
    /// Spike-in reads per million (Orlando et al., 2014).
    Orlando,
    /// Spike-in normalization against a paired input control.
    WithInput,
    /// DESeq2 size factors fit on spike-in counts.
    Deseq2,
    /// edgeR normalization factors fit on spike-in counts.
    EdgeR,
    Other(String),
}

impl NormalizationMethod {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Csaw => "csaw",
            Self::Orlando => "orlando",
            Self::WithInput => "with_input",
            Self::Deseq2 => "deseq2",
            Self::EdgeR => "edger",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for NormalizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalizationMethod {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s.to_ascii_lowercase().as_str() {
            "csaw" => Self::Csaw,
            "orlando" => Self::Orlando,
            "with_input" => Self::WithInput,
            "deseq2" => Self::Deseq2,
            "edger" => Self::EdgeR,
            _ => Self::Other(s.into()),
        };

        Ok(method)
    }
}

#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("I/O error")]
    Io(#[from] io::Error),
    #[error("invalid scaling factors: {}", .path.display())]
    InvalidScalingFactors {
        path: PathBuf,
        #[source]
        source: ReadScalingFactorsError,
    },
    #[error("invalid table: {}", .path.display())]
    InvalidTable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("missing column '{column}': {}", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("empty table: {}", .0.display())]
    EmptyTable(PathBuf),
    #[error("invalid count '{value}': {}", .path.display())]
    InvalidCount { path: PathBuf, value: String },
    #[error("group '{group}' not found in {columns:?}")]
    UnresolvableGroup {
        group: String,
        columns: Vec<&'static str>,
    },
    #[error(
        "no samples from group '{group}' found in counts: expected {expected:?}, available {available:?}"
    )]
    MissingGroupSamples {
        group: String,
        expected: Vec<String>,
        available: Vec<String>,
    },
    #[error("{quantity} is not positive for {subject}")]
    DegenerateDivision {
        quantity: &'static str,
        subject: String,
    },
    #[error("{0} factors are not derived from spike-in reads")]
    UnsupportedMethod(NormalizationMethod),
}

/// Negates `scale_factor` if `negative` is set.
///
/// Negative factors encode minus-strand signal tracks.
pub fn orient(scale_factor: f64, negative: bool) -> f64 {
    if negative { -scale_factor } else { scale_factor }
}

/// Reads a scaling factor table, as JSON if the path ends in `.json` and TSV otherwise.
pub fn read_scaling_factors<P>(src: P) -> Result<ScalingFactors, NormalizationError>
where
    P: AsRef<Path>,
{
    let src = src.as_ref();
    let reader = open(src)?;

    let result = if src.extension().map(|ext| ext == "json").unwrap_or(false) {
        scaling_factors::read_json(reader)
    } else {
        scaling_factors::read_tsv(reader)
    };

    result.map_err(|source| NormalizationError::InvalidScalingFactors {
        path: src.into(),
        source,
    })
}

/// Looks up the factor of a single sample in a scaling factor table.
///
/// A sample missing from the table gets the default factor.
pub fn sample_scale_factor<P>(
    src: P,
    sample: &str,
    negative: bool,
) -> Result<f64, NormalizationError>
where
    P: AsRef<Path>,
{
    let scaling_factors = read_scaling_factors(src)?;
    let scale_factor = scaling_factors.get_or_default(sample);
    Ok(orient(scale_factor, negative))
}

pub(crate) fn open(src: &Path) -> Result<Box<dyn BufRead>, NormalizationError> {
    fs::open(src).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => NormalizationError::InputNotFound(src.into()),
        _ => NormalizationError::Io(e),
    })
}

fn check_divisor(
    n: f64,
    quantity: &'static str,
    subject: &str,
) -> Result<f64, NormalizationError> {
    if n.is_finite() && n > 0.0 {
        Ok(n)
    } else {
        Err(NormalizationError::DegenerateDivision {
            quantity,
            subject: subject.into(),
        })
    }
}

#[cfg(test)]
pub(crate) fn assert_approx_eq(a: f64, b: f64) {
    const EPSILON: f64 = 1e-9;
    assert!((a - b).abs() < EPSILON, "{a} != {b}");
}
