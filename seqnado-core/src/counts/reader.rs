mod feature_counts;

use std::io::{self, BufRead};

pub use self::feature_counts::FeatureCounts;

/// Reads a featureCounts matrix.
pub fn read<R>(reader: &mut R) -> io::Result<FeatureCounts>
where
    R: BufRead,
{
    feature_counts::read(reader)
}

fn read_line<R>(reader: &mut R, buf: &mut String) -> io::Result<usize>
where
    R: BufRead,
{
    const LINE_FEED: char = '\n';
    const CARRIAGE_RETURN: char = '\r';

    match reader.read_line(buf)? {
        0 => Ok(0),
        n => {
            if buf.ends_with(LINE_FEED) {
                buf.pop();

                if buf.ends_with(CARRIAGE_RETURN) {
                    buf.pop();
                }
            }

            Ok(n)
        }
    }
}
