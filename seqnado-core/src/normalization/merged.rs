//! Scaling factors of merged groups.
//!
//! A merged group's BAM is the concatenation of its members' BAMs. Its factor
//! is derived from the pooled quantity the method is based on, not from the
//! arithmetic mean of its members' factors.
//!
//! For csaw, each member factor is `s_i = mean(L) / L_i`, so `L_i = mean(L) / s_i`
//! and the merged factor is
//!
//! ```text
//! mean(L) / Σ L_i = 1 / Σ (1 / s_i)
//! ```
//!
//! This keeps the merged track on the scale of a single normalized replicate.

use tracing::{info, warn};

use super::{
    NormalizationError, NormalizationMethod, check_divisor, orient, read_scaling_factors,
    spike_in,
};
use crate::{Context, Grouping, scaling_factors::DEFAULT_SCALE_FACTOR};

/// How a merged scale factor was derived.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Pooling {
    /// Recomputed from the pooled counts of the members.
    Exact,
    /// The arithmetic mean of the members' factors.
    Approximate,
    /// No member had usable inputs; the default factor is used.
    Fallback,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MergedScaleFactor {
    value: f64,
    pooling: Pooling,
}

impl MergedScaleFactor {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn pooling(&self) -> Pooling {
        self.pooling
    }
}

/// Calculates the scale factor of the merged BAM of `group`.
///
/// Group members are resolved in `grouping` (consensus groups by default).
pub fn calculate_scale_factor(
    ctx: &Context,
    group: &str,
    method: &NormalizationMethod,
    grouping: Grouping,
    negative: bool,
) -> Result<MergedScaleFactor, NormalizationError> {
    let samples = ctx.design().members(grouping, group);

    if samples.is_empty() {
        return Err(NormalizationError::UnresolvableGroup {
            group: group.into(),
            columns: vec![grouping.column()],
        });
    }

    info!(group, %method, ?samples, "calculating merged scale factor");

    let (value, pooling) = match method {
        NormalizationMethod::Csaw => csaw(ctx, group, &samples)?,
        NormalizationMethod::Orlando => {
            let spikein_reads = spike_in::pooled_spikein_reads(ctx, &samples)?;
            info!(group, spikein_reads, "pooled spike-in reads");
            (spike_in::orlando(spikein_reads, group)?, Pooling::Exact)
        }
        NormalizationMethod::WithInput => match spike_in::pooled_paired_counts(ctx, &samples)? {
            Some(counts) => {
                info!(group, ?counts, "pooled paired counts");
                (spike_in::with_input(&counts, group)?, Pooling::Exact)
            }
            None => {
                warn!(group, "no group samples in with_input table; using default");
                (DEFAULT_SCALE_FACTOR, Pooling::Fallback)
            }
        },
        NormalizationMethod::Deseq2
        | NormalizationMethod::EdgeR
        | NormalizationMethod::Other(_) => {
            if let NormalizationMethod::Other(name) = method {
                warn!(method = %name, "unrecognized normalization method");
            }

            warn!(
                group,
                %method,
                "merged factor approximated by the mean of the sample factors"
            );

            (mean_scale_factor(ctx, method, &samples)?, Pooling::Approximate)
        }
    };

    info!(group, value, ?pooling, "calculated merged scale factor");

    Ok(MergedScaleFactor {
        value: orient(value, negative),
        pooling,
    })
}

fn csaw(
    ctx: &Context,
    group: &str,
    samples: &[&str],
) -> Result<(f64, Pooling), NormalizationError> {
    let scaling_factors = read_scaling_factors(ctx.scaling_factors_path(group))?;

    let mut factors = Vec::with_capacity(samples.len());

    for &sample in samples {
        match scaling_factors.get(sample) {
            Some(scale_factor) => factors.push((sample, scale_factor)),
            None => warn!(sample, group, "sample missing from group scaling factors; skipping"),
        }
    }

    if factors.is_empty() {
        warn!(group, "no group samples in scaling factors; using default");
        return Ok((DEFAULT_SCALE_FACTOR, Pooling::Fallback));
    }

    Ok((harmonic_combination(&factors)?, Pooling::Exact))
}

/// Combines per-sample library size factors into the factor of their merged library.
pub fn harmonic_combination(factors: &[(&str, f64)]) -> Result<f64, NormalizationError> {
    let mut sum = 0.0;

    for &(sample, scale_factor) in factors {
        sum += 1.0 / check_divisor(scale_factor, "scale factor", sample)?;
    }

    Ok(1.0 / sum)
}

fn mean_scale_factor(
    ctx: &Context,
    method: &NormalizationMethod,
    samples: &[&str],
) -> Result<f64, NormalizationError> {
    assert!(!samples.is_empty());

    let scaling_factors = read_scaling_factors(ctx.normalisation_factors_path(method))?;

    let sum: f64 = samples
        .iter()
        .map(|sample| scaling_factors.get_or_default(sample))
        .sum();

    Ok(sum / (samples.len() as f64))
}
