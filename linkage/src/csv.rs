//! Functions for reading/writing loci in CSV format.
//!
//! One row per snapshot, two columns (`{name}.x`, `{name}.y`) per joint.
use crate::{Linkage, Snapshot};
pub use csv::Error;
use csv::{ReaderBuilder, Writer};
use std::io::Cursor;

/// Parse snapshots from CSV, the header row is skipped.
pub fn parse_csv(s: &str) -> Result<Vec<Snapshot>, Error> {
    ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(b'#'))
        .from_reader(Cursor::new(s))
        .deserialize::<Vec<f64>>()
        .map(|row| -> Result<Snapshot, Error> {
            let row = row?;
            Ok(row.chunks_exact(2).map(|c| [c[0], c[1]]).collect())
        })
        .collect()
}

/// Dump snapshots to CSV with a header of the joint names.
pub fn dump_csv(
    linkage: &Linkage,
    snapshots: &[Snapshot],
) -> Result<String, Box<dyn std::error::Error>> {
    let mut w = Writer::from_writer(Vec::new());
    let header = linkage
        .joints()
        .iter()
        .flat_map(|j| [format!("{}.x", j.name), format!("{}.y", j.name)]);
    w.write_record(header)?;
    for s in snapshots {
        w.serialize(s.iter().flatten().collect::<Vec<_>>())?;
    }
    Ok(String::from_utf8(w.into_inner()?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;

    #[test]
    fn loci_table() {
        let mut l = demo::four_bar().unwrap();
        let mut snapshots = Vec::new();
        l.simulate(5, 1., &mut snapshots).unwrap();
        let s = dump_csv(&l, &snapshots).unwrap();
        assert!(s.starts_with("B.x,B.y,C.x,C.y\n"));
        assert_eq!(s.lines().count(), 6);
        let back = parse_csv(&s).unwrap();
        assert_eq!(back.len(), 5);
        assert_eq!(back[0].len(), 2);
        for (a, b) in back.iter().flatten().zip(snapshots.iter().flatten()) {
            approx::assert_abs_diff_eq!(a[0], b[0], epsilon = 1e-9);
            approx::assert_abs_diff_eq!(a[1], b[1], epsilon = 1e-9);
        }
    }
}
