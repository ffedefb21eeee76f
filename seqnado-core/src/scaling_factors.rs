//! Per-sample scaling factor tables.
//!
//! A table is persisted either as TSV with the columns `sample` and
//! `scale_factor` or as a JSON object mapping sample uids to factors.

use std::io::{self, Read, Write};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

const SEPARATOR: char = '\t';

/// The factor substituted for a sample missing from a table.
pub const DEFAULT_SCALE_FACTOR: f64 = 1.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScalingFactors(IndexMap<String, f64>);

impl ScalingFactors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S>(&mut self, sample: S, scale_factor: f64) -> Option<f64>
    where
        S: Into<String>,
    {
        self.0.insert(sample.into(), scale_factor)
    }

    pub fn get(&self, sample: &str) -> Option<f64> {
        self.0.get(sample).copied()
    }

    /// Returns the factor for `sample` or [`DEFAULT_SCALE_FACTOR`] if it is missing.
    pub fn get_or_default(&self, sample: &str) -> f64 {
        match self.get(sample) {
            Some(scale_factor) => scale_factor,
            None => {
                warn!(
                    sample,
                    default = DEFAULT_SCALE_FACTOR,
                    "sample missing from scaling factors; using default"
                );

                DEFAULT_SCALE_FACTOR
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0
            .iter()
            .map(|(sample, scale_factor)| (sample.as_str(), *scale_factor))
    }
}

impl FromIterator<(String, f64)> for ScalingFactors {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Error)]
pub enum ReadScalingFactorsError {
    #[error("invalid TSV")]
    InvalidTsv(#[from] csv::Error),
    #[error("invalid JSON")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct Record {
    sample: String,
    scale_factor: f64,
}

/// Reads a TSV scaling factor table.
///
/// Columns other than `sample` and `scale_factor` are ignored.
pub fn read_tsv<R>(reader: R) -> Result<ScalingFactors, ReadScalingFactorsError>
where
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(reader);

    let mut scaling_factors = ScalingFactors::new();

    for result in reader.deserialize() {
        let record: Record = result?;
        scaling_factors.insert(record.sample, record.scale_factor);
    }

    Ok(scaling_factors)
}

/// Reads a JSON scaling factor table, i.e., an object of uids to factors.
pub fn read_json<R>(reader: R) -> Result<ScalingFactors, ReadScalingFactorsError>
where
    R: Read,
{
    let map: IndexMap<String, f64> = serde_json::from_reader(reader)?;
    Ok(ScalingFactors(map))
}

/// Writes a TSV scaling factor table, one row per sample in insertion order.
pub fn write_tsv<W>(writer: &mut W, scaling_factors: &ScalingFactors) -> io::Result<()>
where
    W: Write,
{
    writeln!(writer, "sample{SEPARATOR}scale_factor")?;

    for (sample, scale_factor) in scaling_factors.iter() {
        writeln!(writer, "{sample}{SEPARATOR}{scale_factor}")?;
    }

    Ok(())
}

pub fn write_json<W>(writer: &mut W, scaling_factors: &ScalingFactors) -> io::Result<()>
where
    W: Write,
{
    serde_json::to_writer_pretty(&mut *writer, &scaling_factors.0)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_scaling_factors() -> ScalingFactors {
        [
            (String::from("s2_H3K4me3"), 0.5),
            (String::from("s1_H3K4me3"), 2.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_get_or_default() {
        let scaling_factors = build_scaling_factors();
        assert_eq!(scaling_factors.get_or_default("s1_H3K4me3"), 2.0);
        assert_eq!(scaling_factors.get_or_default("s3_H3K4me3"), 1.0);
    }

    #[test]
    fn test_read_tsv() -> Result<(), ReadScalingFactorsError> {
        let data = b"sample\tscale_factor\ns1\t1.5\ns2\t0.75\n";
        let scaling_factors = read_tsv(&data[..])?;

        assert_eq!(scaling_factors.len(), 2);
        assert_eq!(scaling_factors.get("s1"), Some(1.5));
        assert_eq!(scaling_factors.get("s2"), Some(0.75));
        assert_eq!(scaling_factors.get("s3"), None);

        Ok(())
    }

    #[test]
    fn test_read_tsv_with_missing_column() {
        let data = b"sample\tfactor\ns1\t1.5\n";

        assert!(matches!(
            read_tsv(&data[..]),
            Err(ReadScalingFactorsError::InvalidTsv(_))
        ));
    }

    #[test]
    fn test_read_json() -> Result<(), ReadScalingFactorsError> {
        let data = br#"{"s1_H3K4me3": 0.25, "s2_H3K4me3": 4}"#;
        let scaling_factors = read_json(&data[..])?;

        let actual: Vec<_> = scaling_factors.iter().collect();
        assert_eq!(actual, [("s1_H3K4me3", 0.25), ("s2_H3K4me3", 4.0)]);

        Ok(())
    }

    #[test]
    fn test_write_tsv() -> io::Result<()> {
        let mut buf = Vec::new();
        write_tsv(&mut buf, &build_scaling_factors())?;

        let expected = b"sample\tscale_factor\ns2_H3K4me3\t0.5\ns1_H3K4me3\t2\n";
        assert_eq!(buf, expected);

        Ok(())
    }

    #[test]
    fn test_write_json() -> Result<(), Box<dyn std::error::Error>> {
        let scaling_factors = build_scaling_factors();

        let mut buf = Vec::new();
        write_json(&mut buf, &scaling_factors)?;

        assert_eq!(read_json(&buf[..])?, scaling_factors);

        Ok(())
    }
}
