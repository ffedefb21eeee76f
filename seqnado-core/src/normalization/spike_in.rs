//! Spike-in normalization factors.
//!
//! `orlando` scales each sample to reads per million spike-in reads:
//!
//! ```text
//! s = 1e6 / S
//! ```
//!
//! `with_input` additionally accounts for the spike-in content of the paired
//! input control:
//!
//! ```text
//! s = S_ctrl * 1e7 / (S_ip * R_ctrl)
//! ```
//!
//! Every term is a read count, so both formulas pool exactly: the factor of a
//! merged BAM is the formula applied to the summed counts of its members.
//!
//! DESeq2 and edgeR factors come from model fits upstream and can only be
//! looked up.

use std::{iter::Sum, ops::Add, path::Path};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::info;

use super::{NormalizationError, NormalizationMethod, check_divisor, open};
use crate::{Context, ScalingFactors};

const ORLANDO_SCALE: f64 = 1e6;
const WITH_INPUT_SCALE: f64 = 1e7;

const SPIKEIN_READS_COLUMN: &str = "spikein_reads";

/// Spike-in and reference read counts of an IP and its paired control.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PairedCounts {
    pub spikein_reads_ip: f64,
    pub spikein_reads_control: f64,
    pub reference_reads_control: f64,
}

impl PairedCounts {
    pub fn new(
        spikein_reads_ip: f64,
        spikein_reads_control: f64,
        reference_reads_control: f64,
    ) -> Self {
        Self {
            spikein_reads_ip,
            spikein_reads_control,
            reference_reads_control,
        }
    }
}

impl Add for PairedCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            spikein_reads_ip: self.spikein_reads_ip + rhs.spikein_reads_ip,
            spikein_reads_control: self.spikein_reads_control + rhs.spikein_reads_control,
            reference_reads_control: self.reference_reads_control + rhs.reference_reads_control,
        }
    }
}

impl Sum for PairedCounts {
    fn sum<I>(iter: I) -> Self
    where
        I: Iterator<Item = Self>,
    {
        iter.fold(Self::default(), Add::add)
    }
}

/// Calculates the `orlando` factor of `spikein_reads` belonging to `subject`.
pub fn orlando(spikein_reads: f64, subject: &str) -> Result<f64, NormalizationError> {
    let spikein_reads = check_divisor(spikein_reads, "spike-in read count", subject)?;
    Ok(ORLANDO_SCALE / spikein_reads)
}

/// Calculates the `with_input` factor of `counts` belonging to `subject`.
pub fn with_input(counts: &PairedCounts, subject: &str) -> Result<f64, NormalizationError> {
    let spikein_reads_ip =
        check_divisor(counts.spikein_reads_ip, "IP spike-in read count", subject)?;

    let spikein_reads_control = check_divisor(
        counts.spikein_reads_control,
        "control spike-in read count",
        subject,
    )?;

    let reference_reads_control = check_divisor(
        counts.reference_reads_control,
        "control reference read count",
        subject,
    )?;

    Ok(spikein_reads_control * WITH_INPUT_SCALE / (spikein_reads_ip * reference_reads_control))
}

/// Calculates the factor of every sample in the design.
///
/// Only `orlando` and `with_input` are computed here. The factors of the
/// other methods are fit upstream.
pub fn calculate_scaling_factors(
    ctx: &Context,
    method: &NormalizationMethod,
) -> Result<ScalingFactors, NormalizationError> {
    info!(%method, "calculating spike-in scaling factors");

    let mut scaling_factors = ScalingFactors::new();

    match method {
        NormalizationMethod::Orlando => {
            for sample in ctx.design().uids() {
                let spikein_reads = read_spikein_reads(&ctx.spikein_stats_path(sample))?;
                scaling_factors.insert(sample, orlando(spikein_reads, sample)?);
            }
        }
        NormalizationMethod::WithInput => {
            let table = read_paired_counts(&ctx.normalisation_table_path(method))?;

            for (sample, counts) in &table {
                scaling_factors.insert(sample.as_str(), with_input(counts, sample)?);
            }
        }
        NormalizationMethod::Csaw
        | NormalizationMethod::Deseq2
        | NormalizationMethod::EdgeR
        | NormalizationMethod::Other(_) => {
            return Err(NormalizationError::UnsupportedMethod(method.clone()));
        }
    }

    info!(?scaling_factors, "calculated scaling factors");

    Ok(scaling_factors)
}

/// Looks up the factor of `sample` in the method's normalization factors.
///
/// A sample missing from the table gets the default factor.
pub fn sample_scale_factor(
    ctx: &Context,
    method: &NormalizationMethod,
    sample: &str,
    negative: bool,
) -> Result<f64, NormalizationError> {
    let src = ctx.normalisation_factors_path(method);
    super::sample_scale_factor(src, sample, negative)
}

/// Sums the spike-in reads of `samples`.
pub fn pooled_spikein_reads(ctx: &Context, samples: &[&str]) -> Result<f64, NormalizationError> {
    let mut total = 0.0;

    for sample in samples {
        total += read_spikein_reads(&ctx.spikein_stats_path(sample))?;
    }

    Ok(total)
}

/// Sums the paired counts of the `samples` present in the `with_input` table.
///
/// This returns `None` if none of the samples are in the table.
pub fn pooled_paired_counts(
    ctx: &Context,
    samples: &[&str],
) -> Result<Option<PairedCounts>, NormalizationError> {
    let src = ctx.normalisation_table_path(&NormalizationMethod::WithInput);
    let table = read_paired_counts(&src)?;

    let rows: Vec<_> = samples
        .iter()
        .filter_map(|sample| table.get(*sample).copied())
        .collect();

    if rows.is_empty() {
        Ok(None)
    } else {
        Ok(Some(rows.into_iter().sum()))
    }
}

/// Reads the spike-in read count from a `{sample}_stats.tsv` file.
pub fn read_spikein_reads(src: &Path) -> Result<f64, NormalizationError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(open(src)?);

    let invalid_table = |source| NormalizationError::InvalidTable {
        path: src.into(),
        source,
    };

    let i = reader
        .headers()
        .map_err(invalid_table)?
        .iter()
        .position(|header| header == SPIKEIN_READS_COLUMN)
        .ok_or_else(|| NormalizationError::MissingColumn {
            path: src.into(),
            column: SPIKEIN_READS_COLUMN,
        })?;

    let record = reader
        .records()
        .next()
        .transpose()
        .map_err(invalid_table)?
        .ok_or_else(|| NormalizationError::EmptyTable(src.into()))?;

    parse_count(src, record.get(i).unwrap_or_default())
}

// Read counts must be finite and non-negative.
fn parse_count(src: &Path, s: &str) -> Result<f64, NormalizationError> {
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(n),
        _ => Err(NormalizationError::InvalidCount {
            path: src.into(),
            value: s.into(),
        }),
    }
}

#[derive(Deserialize)]
struct PairedCountsRecord {
    sample: String,
    spikein_reads_ip: String,
    spikein_reads_control: String,
    reference_reads_control: String,
}

/// Reads the `with_input` table of per-sample IP and control read counts.
pub fn read_paired_counts(
    src: &Path,
) -> Result<IndexMap<String, PairedCounts>, NormalizationError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(open(src)?);

    let mut table = IndexMap::new();

    for result in reader.deserialize() {
        let record: PairedCountsRecord =
            result.map_err(|source| NormalizationError::InvalidTable {
                path: src.into(),
                source,
            })?;

        let counts = PairedCounts::new(
            parse_count(src, &record.spikein_reads_ip)?,
            parse_count(src, &record.spikein_reads_control)?,
            parse_count(src, &record.reference_reads_control)?,
        );

        table.insert(record.sample, counts);
    }

    Ok(table)
}

#[cfg(test)]
pub(super) mod tests {
    use std::{fs, io};

    use super::*;
    use crate::{Design, design, normalization::assert_approx_eq};

    pub(in crate::normalization) fn write_stats(
        ctx: &Context,
        sample: &str,
        spikein_reads: u64,
    ) -> io::Result<()> {
        let dst = ctx.spikein_stats_path(sample);
        fs::create_dir_all(dst.parent().unwrap())?;
        fs::write(
            dst,
            format!("sample\treference_reads\tspikein_reads\n{sample}\t5000000\t{spikein_reads}\n"),
        )
    }

    pub(in crate::normalization) fn write_paired_counts(
        ctx: &Context,
        rows: &[(&str, u64, u64, u64)],
    ) -> io::Result<()> {
        use std::fmt::Write;

        let mut data =
            String::from("sample\tspikein_reads_ip\tspikein_reads_control\treference_reads_control\n");

        for (sample, s_ip, s_ctrl, r_ctrl) in rows {
            writeln!(data, "{sample}\t{s_ip}\t{s_ctrl}\t{r_ctrl}").unwrap();
        }

        let dst = ctx.normalisation_table_path(&NormalizationMethod::WithInput);
        fs::create_dir_all(dst.parent().unwrap())?;
        fs::write(dst, data)
    }

    fn build_design() -> Design {
        let data = b"sample_id,ip,consensus_group\ns1,H3K27me3,wt\ns2,H3K27me3,wt\ns3,H3K27me3,wt\n";
        design::read(&data[..]).unwrap()
    }

    #[test]
    fn test_orlando() -> Result<(), NormalizationError> {
        assert_approx_eq(orlando(250_000.0, "s1")?, 4.0);

        assert!(matches!(
            orlando(0.0, "s1"),
            Err(NormalizationError::DegenerateDivision { .. })
        ));

        assert!(matches!(
            orlando(f64::INFINITY, "s1"),
            Err(NormalizationError::DegenerateDivision { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_orlando_pools_exactly() -> Result<(), NormalizationError> {
        let spikein_reads = [100_000.0, 200_000.0, 300_000.0];
        let pooled = orlando(spikein_reads.iter().sum(), "wt")?;

        assert_approx_eq(pooled, 1e6 / 600_000.0);
        assert_approx_eq(pooled, orlando(600_000.0, "merged")?);

        Ok(())
    }

    #[test]
    fn test_with_input() -> Result<(), NormalizationError> {
        let counts = PairedCounts::new(2000.0, 1000.0, 500_000.0);
        assert_approx_eq(with_input(&counts, "s1")?, 1000.0 * 1e7 / (2000.0 * 500_000.0));

        let counts = PairedCounts::new(0.0, 1000.0, 500_000.0);
        assert!(matches!(
            with_input(&counts, "s1"),
            Err(NormalizationError::DegenerateDivision { quantity: "IP spike-in read count", .. })
        ));

        let counts = PairedCounts::new(2000.0, 1000.0, 0.0);
        assert!(matches!(
            with_input(&counts, "s1"),
            Err(NormalizationError::DegenerateDivision { quantity: "control reference read count", .. })
        ));

        let counts = PairedCounts::new(2000.0, 0.0, 500_000.0);
        assert!(matches!(
            with_input(&counts, "s1"),
            Err(NormalizationError::DegenerateDivision { quantity: "control spike-in read count", .. })
        ));

        let counts = PairedCounts::new(2000.0, -1000.0, 500_000.0);
        assert!(matches!(
            with_input(&counts, "s1"),
            Err(NormalizationError::DegenerateDivision { quantity: "control spike-in read count", .. })
        ));

        Ok(())
    }

    #[test]
    fn test_sum_paired_counts() {
        let counts = [
            PairedCounts::new(2000.0, 1000.0, 500_000.0),
            PairedCounts::new(2500.0, 1500.0, 600_000.0),
        ];

        let actual: PairedCounts = counts.into_iter().sum();
        assert_eq!(actual, PairedCounts::new(4500.0, 2500.0, 1_100_000.0));
    }

    #[test]
    fn test_calculate_scaling_factors_with_orlando() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let ctx = Context::new(dir.path(), build_design());

        write_stats(&ctx, "s1_H3K27me3", 100_000)?;
        write_stats(&ctx, "s2_H3K27me3", 200_000)?;
        write_stats(&ctx, "s3_H3K27me3", 400_000)?;

        let scaling_factors = calculate_scaling_factors(&ctx, &NormalizationMethod::Orlando)?;

        assert_eq!(scaling_factors.len(), 3);
        assert_approx_eq(scaling_factors.get("s1_H3K27me3").unwrap(), 10.0);
        assert_approx_eq(scaling_factors.get("s2_H3K27me3").unwrap(), 5.0);
        assert_approx_eq(scaling_factors.get("s3_H3K27me3").unwrap(), 2.5);

        Ok(())
    }

    #[test]
    fn test_calculate_scaling_factors_with_missing_stats() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let ctx = Context::new(dir.path(), build_design());

        write_stats(&ctx, "s1_H3K27me3", 100_000)?;

        assert!(matches!(
            calculate_scaling_factors(&ctx, &NormalizationMethod::Orlando),
            Err(NormalizationError::InputNotFound(path)) if path == ctx.spikein_stats_path("s2_H3K27me3")
        ));

        Ok(())
    }

    #[test]
    fn test_calculate_scaling_factors_with_with_input() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let ctx = Context::new(dir.path(), build_design());

        write_paired_counts(
            &ctx,
            &[
                ("s1_H3K27me3", 2000, 1000, 500_000),
                ("s2_H3K27me3", 2500, 1500, 600_000),
            ],
        )?;

        let scaling_factors = calculate_scaling_factors(&ctx, &NormalizationMethod::WithInput)?;

        assert_eq!(scaling_factors.len(), 2);
        assert_approx_eq(scaling_factors.get("s1_H3K27me3").unwrap(), 10.0);
        assert_approx_eq(
            scaling_factors.get("s2_H3K27me3").unwrap(),
            1500.0 * 1e7 / (2500.0 * 600_000.0),
        );

        Ok(())
    }

    #[test]
    fn test_calculate_scaling_factors_with_upstream_method() {
        let ctx = Context::new("seqnado_output", build_design());

        assert!(matches!(
            calculate_scaling_factors(&ctx, &NormalizationMethod::Deseq2),
            Err(NormalizationError::UnsupportedMethod(NormalizationMethod::Deseq2))
        ));
    }

    #[test]
    fn test_sample_scale_factor() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let ctx = Context::new(dir.path(), build_design());

        let dst = ctx.normalisation_factors_path(&NormalizationMethod::EdgeR);
        fs::create_dir_all(dst.parent().unwrap())?;
        fs::write(&dst, br#"{"s1_H3K27me3": 1.2, "s2_H3K27me3": 0.9}"#)?;

        let method = NormalizationMethod::EdgeR;
        assert_eq!(sample_scale_factor(&ctx, &method, "s1_H3K27me3", false)?, 1.2);
        assert_eq!(sample_scale_factor(&ctx, &method, "s1_H3K27me3", true)?, -1.2);
        assert_eq!(sample_scale_factor(&ctx, &method, "s3_H3K27me3", false)?, 1.0);

        Ok(())
    }

    #[test]
    fn test_read_spikein_reads() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;

        let src = dir.path().join("s1_stats.tsv");
        fs::write(&src, b"sample\tspikein_reads\ns1\t1234\n")?;
        assert_eq!(read_spikein_reads(&src)?, 1234.0);

        fs::write(&src, b"sample\treference_reads\ns1\t1234\n")?;
        assert!(matches!(
            read_spikein_reads(&src),
            Err(NormalizationError::MissingColumn { column: "spikein_reads", .. })
        ));

        fs::write(&src, b"sample\tspikein_reads\n")?;
        assert!(matches!(
            read_spikein_reads(&src),
            Err(NormalizationError::EmptyTable(_))
        ));

        fs::write(&src, b"sample\tspikein_reads\ns1\tn/a\n")?;
        assert!(matches!(
            read_spikein_reads(&src),
            Err(NormalizationError::InvalidCount { .. })
        ));

        for value in ["inf", "-5", "NaN"] {
            fs::write(&src, format!("sample\tspikein_reads\ns1\t{value}\n"))?;
            assert!(matches!(
                read_spikein_reads(&src),
                Err(NormalizationError::InvalidCount { value: actual, .. }) if actual == value
            ));
        }

        Ok(())
    }

    #[test]
    fn test_read_paired_counts() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("normalisation_factors.tsv");

        fs::write(
            &src,
            b"sample\tspikein_reads_ip\tspikein_reads_control\treference_reads_control\tscale_factor\n\
              s1\t2000\t1000.0\t500000\t10\n",
        )?;

        let table = read_paired_counts(&src)?;
        assert_eq!(table.len(), 1);
        assert_eq!(table["s1"], PairedCounts::new(2000.0, 1000.0, 500_000.0));

        for value in ["inf", "-1000", "NaN", "n/a"] {
            fs::write(
                &src,
                format!(
                    "sample\tspikein_reads_ip\tspikein_reads_control\treference_reads_control\n\
                     s1\t2000\t{value}\t500000\n"
                ),
            )?;

            assert!(matches!(
                read_paired_counts(&src),
                Err(NormalizationError::InvalidCount { value: actual, .. }) if actual == value
            ));
        }

        Ok(())
    }

    #[test]
    fn test_pooled_paired_counts_with_zero_control_spikein_reads()
    -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let ctx = Context::new(dir.path(), build_design());

        write_paired_counts(
            &ctx,
            &[("s1_H3K27me3", 2000, 0, 500_000), ("s2_H3K27me3", 2500, 0, 600_000)],
        )?;

        let counts = pooled_paired_counts(&ctx, &["s1_H3K27me3", "s2_H3K27me3"])?.unwrap();

        assert!(matches!(
            with_input(&counts, "wt"),
            Err(NormalizationError::DegenerateDivision { quantity: "control spike-in read count", .. })
        ));

        Ok(())
    }
}
