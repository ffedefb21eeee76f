use std::path::{Path, PathBuf};

use crate::{Design, NormalizationMethod};

/// The inputs shared by every normalization step of a run.
///
/// All paths are derived from the run's output directory.
#[derive(Clone, Debug)]
pub struct Context {
    output_dir: PathBuf,
    design: Design,
}

impl Context {
    pub fn new<P>(output_dir: P, design: Design) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            output_dir: output_dir.into(),
            design,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn design(&self) -> &Design {
        &self.design
    }

    /// `{output_dir}/resources/{group}_scaling_factors.tsv`
    pub fn scaling_factors_path(&self, group: &str) -> PathBuf {
        self.resources_dir()
            .join(format!("{group}_scaling_factors.tsv"))
    }

    /// `{output_dir}/resources/{method}/normalisation_factors.json`
    pub fn normalisation_factors_path(&self, method: &NormalizationMethod) -> PathBuf {
        self.resources_dir()
            .join(method.as_str())
            .join("normalisation_factors.json")
    }

    /// `{output_dir}/resources/{method}/normalisation_factors.tsv`
    pub fn normalisation_table_path(&self, method: &NormalizationMethod) -> PathBuf {
        self.resources_dir()
            .join(method.as_str())
            .join("normalisation_factors.tsv")
    }

    /// `{output_dir}/aligned/spikein/{sample}_stats.tsv`
    pub fn spikein_stats_path(&self, sample: &str) -> PathBuf {
        self.output_dir
            .join("aligned")
            .join("spikein")
            .join(format!("{sample}_stats.tsv"))
    }

    fn resources_dir(&self) -> PathBuf {
        self.output_dir.join("resources")
    }
}
