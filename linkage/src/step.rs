//! The stepping loop.
use crate::{Coord, Linkage, Result, Snapshot};
use std::iter::FusedIterator;

/// A finite sequence of snapshots, created by [`Linkage::step()`].
///
/// Each item advances the cranks by `angle × dt` and resolves the other
/// joints in solve order. The iteration mutates the joints of the linkage,
/// so it cannot be restarted: reset the pose with [`Linkage::set_coords()`]
/// to replay it. After the first error, the sequence ends.
#[must_use = "iterators are lazy and do nothing unless consumed"]
#[derive(Debug)]
pub struct Step<'a> {
    linkage: &'a mut Linkage,
    remain: u64,
    dt: f64,
}

impl Iterator for Step<'_> {
    type Item = Result<Snapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remain == 0 {
            return None;
        }
        let s = self.linkage.solve_once(self.dt);
        self.remain = if s.is_ok() { self.remain - 1 } else { 0 };
        Some(s)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remain).unwrap_or(usize::MAX);
        (n.min(1), Some(n))
    }
}

impl FusedIterator for Step<'_> {}

impl Linkage {
    /// Step the linkage `iterations` times with the crank increment scaled
    /// by `dt`.
    pub fn step(&mut self, iterations: u64, dt: f64) -> Step<'_> {
        Step { linkage: self, remain: iterations, dt }
    }

    /// Step the linkage for one rotation period.
    ///
    /// With `dt < 1` the period is not covered, use
    /// `step((period as f64 / dt) as u64, dt)` for a finer revolution.
    pub fn step_period(&mut self, dt: f64) -> Result<Step<'_>> {
        let period = self.rotation_period()?;
        Ok(self.step(period, dt))
    }

    /// Step the linkage and append every snapshot to `buf`.
    ///
    /// The snapshots before an error are kept in the buffer.
    pub fn simulate(&mut self, iterations: u64, dt: f64, buf: &mut Vec<Snapshot>) -> Result<()> {
        buf.reserve(usize::try_from(iterations).unwrap_or_default());
        for s in self.step(iterations, dt) {
            buf.push(s?);
        }
        Ok(())
    }
}

/// Transpose snapshots into the locus of each joint.
///
/// ```
/// use planar_linkage::loci;
///
/// let snapshots = vec![vec![[0., 0.], [1., 0.]], vec![[0., 0.], [0., 1.]]];
/// assert_eq!(loci(&snapshots)[1], [[1., 0.], [0., 1.]]);
/// ```
pub fn loci(snapshots: &[Snapshot]) -> Vec<Vec<Coord>> {
    let n = snapshots.first().map(Vec::len).unwrap_or_default();
    (0..n)
        .map(|i| snapshots.iter().filter_map(|s| s.get(i).copied()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::*;

    fn broken() -> Linkage {
        let joints = vec![
            Joint::crank([0., 0.], 1., 0.5).with_coord([1., 0.]),
            Joint::revolute(0, [2.5, 0.], 1., 1.).with_coord([2., 1.]),
        ];
        Linkage::new("", joints).unwrap()
    }

    #[test]
    fn fused_after_error() {
        let mut l = broken();
        let mut s = l.step(100, 1.);
        // The crank pulls the pin out of reach on the second step
        let mut n = 0;
        for r in s.by_ref() {
            if r.is_err() {
                assert!(r.unwrap_err().is_unbuildable());
                break;
            }
            n += 1;
        }
        assert!(n < 100);
        assert!(s.next().is_none());
        assert_eq!(l.state(), State::Unsolved);
    }

    #[test]
    fn simulate_keeps_prefix() {
        let mut l = broken();
        let mut buf = Vec::new();
        let err = l.simulate(100, 1., &mut buf).unwrap_err();
        assert!(err.is_unbuildable());
        assert!(!buf.is_empty());
        assert!(buf.len() < 100);
    }

    #[test]
    fn zero_iterations() {
        let mut l = broken();
        assert_eq!(l.step(0, 1.).count(), 0);
    }
}
