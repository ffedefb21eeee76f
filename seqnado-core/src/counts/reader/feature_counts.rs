use std::{
    io::{self, BufRead},
    path::Path,
};

use ndarray::{Array2, ArrayView2, Axis};

use super::read_line;

const COMMENT_PREFIX: char = '#';
const DELIMITER: char = '\t';

const META_COLUMN_NAMES: [&str; 6] = ["Geneid", "Chr", "Start", "End", "Strand", "Length"];

/// Binned read counts, one column per sample.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureCounts {
    sample_names: Vec<String>,
    counts: Array2<f64>,
}

impl FeatureCounts {
    pub fn new(sample_names: Vec<String>, counts: Array2<f64>) -> Self {
        assert_eq!(sample_names.len(), counts.ncols());

        Self {
            sample_names,
            counts,
        }
    }

    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    /// Returns the count matrix (bins x samples).
    pub fn counts(&self) -> ArrayView2<'_, f64> {
        self.counts.view()
    }

    /// Returns the total count of each sample, in column order.
    pub fn library_sizes(&self) -> Vec<f64> {
        self.counts.sum_axis(Axis(0)).to_vec()
    }
}

pub(super) fn read<R>(reader: &mut R) -> io::Result<FeatureCounts>
where
    R: BufRead,
{
    let mut line = String::new();

    let header = loop {
        line.clear();

        if read_line(reader, &mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "missing header"));
        }

        if !line.starts_with(COMMENT_PREFIX) {
            break parse_header(&line)?;
        }
    };

    let mut data = Vec::new();
    let mut row_count = 0;

    loop {
        line.clear();

        if read_line(reader, &mut line)? == 0 {
            break;
        }

        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            continue;
        }

        let fields: Vec<_> = line.split(DELIMITER).collect();

        if fields.len() != header.column_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "invalid row: expected {} columns, got {}",
                    header.column_count,
                    fields.len()
                ),
            ));
        }

        for &i in &header.sample_indices {
            data.push(parse_count(fields[i])?);
        }

        row_count += 1;
    }

    let counts = Array2::from_shape_vec((row_count, header.sample_names.len()), data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    Ok(FeatureCounts::new(header.sample_names, counts))
}

struct Header {
    column_count: usize,
    sample_indices: Vec<usize>,
    sample_names: Vec<String>,
}

fn parse_header(s: &str) -> io::Result<Header> {
    let mut column_count = 0;
    let mut sample_indices = Vec::new();
    let mut sample_names = Vec::new();

    for (i, name) in s.split(DELIMITER).enumerate() {
        column_count += 1;

        if META_COLUMN_NAMES.contains(&name) {
            continue;
        }

        let sample_name = parse_sample_name(name)?;

        if sample_names.iter().any(|n| n == sample_name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("duplicate sample name: {sample_name}"),
            ));
        }

        sample_indices.push(i);
        sample_names.push(sample_name.into());
    }

    Ok(Header {
        column_count,
        sample_indices,
        sample_names,
    })
}

// The column header is the path of the counted BAM, e.g., `aligned/s1_H3K4me3.bam`.
fn parse_sample_name(s: &str) -> io::Result<&str> {
    Path::new(s)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid sample column: {s}"),
            )
        })
}

fn parse_count(s: &str) -> io::Result<f64> {
    let n: f64 = s
        .parse()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if n.is_finite() && n >= 0.0 {
        Ok(n)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid count: {s}"),
        ))
    }
}
