//! Library size scaling factors over genomic bins (csaw).
//!
//! Each sample in a group is scaled to the group's mean library size, i.e.,
//!
//! ```text
//! s_i = mean(L) / L_i
//! ```
//!
//! where `L_i` is the total bin count of sample `i`.

use indexmap::IndexMap;
use tracing::{info, warn};

use super::{NormalizationError, check_divisor};
use crate::{Design, Grouping, ScalingFactors, counts::reader::FeatureCounts};

/// Calculates the scaling factors of the samples in `group`.
///
/// The group is first looked up in the scaling groups and then in the
/// consensus groups. If it is in neither, all samples in the design are used.
/// Group members missing from the counts are skipped.
pub fn calculate_scaling_factors(
    feature_counts: &FeatureCounts,
    design: &Design,
    group: &str,
) -> Result<ScalingFactors, NormalizationError> {
    info!(group, "calculating csaw scaling factors");

    let library_sizes: IndexMap<_, _> = feature_counts
        .sample_names()
        .iter()
        .map(String::as_str)
        .zip(feature_counts.library_sizes())
        .collect();

    info!(?library_sizes, "calculated library sizes");

    let members = resolve_group(design, group);

    let samples: Vec<_> = members
        .iter()
        .copied()
        .filter(|sample| library_sizes.contains_key(sample))
        .collect();

    if samples.is_empty() {
        return Err(NormalizationError::MissingGroupSamples {
            group: group.into(),
            expected: members.into_iter().map(String::from).collect(),
            available: feature_counts.sample_names().to_vec(),
        });
    }

    let group_library_sizes: Vec<_> = samples
        .iter()
        .map(|sample| (*sample, library_sizes[sample]))
        .collect();

    let scaling_factors = scale_to_mean(&group_library_sizes)?;

    info!(?scaling_factors, "calculated scaling factors");

    Ok(scaling_factors)
}

fn resolve_group<'d>(design: &'d Design, group: &str) -> Vec<&'d str> {
    for grouping in [Grouping::Scaling, Grouping::Consensus] {
        let members = design.members(grouping, group);

        if !members.is_empty() {
            info!(group, column = grouping.column(), "found group");
            return members;
        }
    }

    warn!(
        group,
        "group not found in scaling_group or consensus_group; using all samples"
    );

    design.uids().collect()
}

fn scale_to_mean(library_sizes: &[(&str, f64)]) -> Result<ScalingFactors, NormalizationError> {
    assert!(!library_sizes.is_empty());

    for &(sample, library_size) in library_sizes {
        check_divisor(library_size, "library size", sample)?;
    }

    let sum: f64 = library_sizes.iter().map(|(_, n)| n).sum();
    let mean = sum / (library_sizes.len() as f64);

    Ok(library_sizes
        .iter()
        .map(|&(sample, library_size)| (sample.into(), mean / library_size))
        .collect())
}
