//! Sample design metadata.
//!
//! The design table is the comma-separated `metadata.csv` describing each
//! sample. Only the columns needed to identify samples and resolve their
//! groups are read: `uid`, `sample_id`, `ip`, `scaling_group`, and
//! `consensus_group`.

use std::io::Read;

use thiserror::Error;

const UID_COLUMN: &str = "uid";
const SAMPLE_ID_COLUMN: &str = "sample_id";
const IP_COLUMN: &str = "ip";

/// A sample grouping dimension.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Grouping {
    /// Biological condition; samples merged for consensus peak calling.
    #[default]
    Consensus,
    /// Normalization batch.
    Scaling,
}

impl Grouping {
    /// Returns the design column holding the group names of this dimension.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Consensus => "consensus_group",
            Self::Scaling => "scaling_group",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sample {
    uid: String,
    scaling_group: Option<String>,
    consensus_group: Option<String>,
}

impl Sample {
    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn group(&self, grouping: Grouping) -> Option<&str> {
        match grouping {
            Grouping::Consensus => self.consensus_group.as_deref(),
            Grouping::Scaling => self.scaling_group.as_deref(),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Design {
    samples: Vec<Sample>,
}

impl Design {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn uids(&self) -> impl Iterator<Item = &str> {
        self.samples.iter().map(|sample| sample.uid())
    }

    /// Returns the uids of the samples in `group`, in design order.
    ///
    /// This is empty if no sample belongs to the group.
    pub fn members(&self, grouping: Grouping, group: &str) -> Vec<&str> {
        self.samples
            .iter()
            .filter(|sample| sample.group(grouping) == Some(group))
            .map(|sample| sample.uid())
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum ReadDesignError {
    #[error("invalid record")]
    InvalidRecord(#[from] csv::Error),
    #[error("cannot determine sample names: no 'uid' or 'sample_id' column")]
    MissingSampleNameColumns,
}

enum UidSource {
    Uid(usize),
    SampleIdAndIp(usize, usize),
    SampleId(usize),
}

/// Reads a comma-separated design table.
pub fn read<R>(reader: R) -> Result<Design, ReadDesignError>
where
    R: Read,
{
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let index_of = |name: &str| headers.iter().position(|header| header == name);

    let uid_source = match (
        index_of(UID_COLUMN),
        index_of(SAMPLE_ID_COLUMN),
        index_of(IP_COLUMN),
    ) {
        (Some(i), _, _) => UidSource::Uid(i),
        (None, Some(i), Some(j)) => UidSource::SampleIdAndIp(i, j),
        (None, Some(i), None) => UidSource::SampleId(i),
        (None, None, _) => return Err(ReadDesignError::MissingSampleNameColumns),
    };

    let scaling_group_index = index_of(Grouping::Scaling.column());
    let consensus_group_index = index_of(Grouping::Consensus.column());

    let mut samples = Vec::new();

    for result in reader.records() {
        let record = result?;

        let field = |i: usize| record.get(i).unwrap_or_default();

        let uid = match uid_source {
            UidSource::Uid(i) => field(i).into(),
            UidSource::SampleIdAndIp(i, j) => build_uid(field(i), field(j)),
            UidSource::SampleId(i) => field(i).into(),
        };

        let group = |index: Option<usize>| {
            index
                .map(field)
                .filter(|name| !name.is_empty())
                .map(String::from)
        };

        samples.push(Sample {
            uid,
            scaling_group: group(scaling_group_index),
            consensus_group: group(consensus_group_index),
        });
    }

    Ok(Design::new(samples))
}

fn build_uid(sample_id: &str, ip: &str) -> String {
    if ip.is_empty() {
        sample_id.into()
    } else {
        format!("{sample_id}_{ip}")
    }
}
