//! Dimensional optimization of linkages.
//!
//! The optimizers treat the stepping engine as a black box behind the
//! [`Evaluator`] trait: a trial sets the constraints and the initial pose,
//! steps the linkage and scores the loci. Unbuildable trials get the penalty
//! of the [`Goal`] instead of an error.
//!
//! ```
//! use planar_linkage::{demo, opt::*, BoundingBox, Linkage, Snapshot};
//!
//! // Keep the coupler locus inside a box
//! let target = BoundingBox::from_array([-1., 4., 2., 1.]);
//! let eval = Kinematic::new(move |l: &Linkage, snapshots: &[Snapshot]| {
//!     bbox_fitness(l, snapshots, 1, &target)
//! });
//! let mut linkage = demo::four_bar().unwrap();
//! let center = linkage.constraints();
//! let cfg = GridSearch::new().divisions(3).n_results(2);
//! let agents = grid_search(&eval, &mut linkage, &center, &cfg, |_, _| ()).unwrap();
//! assert_eq!(agents.len(), 2);
//! ```
pub use self::grid::*;
#[cfg(feature = "swarm")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "swarm")))]
pub use self::pso::*;
use crate::{bounding_box, Coord, Linkage, Result, Snapshot};

mod grid;
#[cfg(feature = "swarm")]
mod pso;

/// Direction of the optimization.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Goal {
    /// Lower is better
    #[default]
    Minimize,
    /// Higher is better
    Maximize,
}

impl Goal {
    /// The score of an unbuildable trial.
    pub const fn penalty(self) -> f64 {
        match self {
            Self::Minimize => f64::INFINITY,
            Self::Maximize => f64::NEG_INFINITY,
        }
    }

    /// Return true if `a` is strictly better than `b`.
    pub fn is_better(self, a: f64, b: f64) -> bool {
        match self {
            Self::Minimize => a < b,
            Self::Maximize => a > b,
        }
    }
}

/// A scored trial.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    /// Score of the trial
    pub score: f64,
    /// Constraints of the trial (flat)
    pub dims: Vec<f64>,
    /// Initial pose of the trial
    pub init_pos: Vec<Option<Coord>>,
}

/// Search space, one pair of limits per constraint.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Lower limits
    pub lower: Vec<f64>,
    /// Upper limits
    pub upper: Vec<f64>,
}

impl Bounds {
    /// Number of dimensions.
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    /// Return true if there is no dimension.
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Swap the limits where the lower one is greater.
    ///
    /// Negative centers produce reversed limits.
    pub fn sorted(mut self) -> Self {
        for (lo, hi) in self.lower.iter_mut().zip(&mut self.upper) {
            if *lo > *hi {
                std::mem::swap(lo, hi);
            }
        }
        self
    }

    /// Limits as `[lower, upper]` pairs.
    pub fn to_pairs(&self) -> Vec<[f64; 2]> {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(lo, hi)| [*lo, *hi])
            .collect()
    }
}

/// Default divisor of [`generate_bounds()`].
pub const MIN_RATIO: f64 = 5.;
/// Default factor of [`generate_bounds()`].
pub const MAX_FACTOR: f64 = 5.;

/// Bounds around a center: `center / min_ratio` and `center * max_factor`.
///
/// ```
/// use planar_linkage::opt::generate_bounds;
///
/// let b = generate_bounds(&[5., 1.], 5., 5.);
/// assert_eq!(b.lower, [1., 0.2]);
/// assert_eq!(b.upper, [25., 5.]);
/// ```
pub fn generate_bounds(center: &[f64], min_ratio: f64, max_factor: f64) -> Bounds {
    Bounds {
        lower: center.iter().map(|c| c / min_ratio).collect(),
        upper: center.iter().map(|c| c * max_factor).collect(),
    }
}

/// Score a trial of a linkage.
pub trait Evaluator {
    /// Direction of the score.
    fn goal(&self) -> Goal;

    /// Run a trial with the constraints `params` starting from `init_pos`.
    ///
    /// Unbuildable trials return the penalty, other errors are returned.
    fn try_evaluate(
        &self,
        linkage: &mut Linkage,
        params: &[f64],
        init_pos: &[Option<Coord>],
    ) -> Result<f64>;

    /// Run a trial, any error gives the penalty.
    fn evaluate(&self, linkage: &mut Linkage, params: &[f64], init_pos: &[Option<Coord>]) -> f64 {
        self.try_evaluate(linkage, params, init_pos)
            .unwrap_or_else(|e| {
                tracing::warn!(linkage = linkage.name(), "evaluation failed: {e}");
                self.goal().penalty()
            })
    }
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn goal(&self) -> Goal {
        (**self).goal()
    }

    fn try_evaluate(
        &self,
        linkage: &mut Linkage,
        params: &[f64],
        init_pos: &[Option<Coord>],
    ) -> Result<f64> {
        (**self).try_evaluate(linkage, params, init_pos)
    }
}

/// The standard kinematic trial.
///
/// Restore the pose, apply the constraints, run one warm-up revolution, then
/// gather the snapshots of one revolution with at least `res` points and
/// score them with the fitness function.
#[derive(Clone, Debug)]
pub struct Kinematic<F> {
    fitness: F,
    /// Direction of the fitness
    pub goal: Goal,
    /// Minimum number of points per revolution
    pub res: u64,
    /// Number of points of the warm-up revolution
    pub warmup: u64,
}

impl<F> Kinematic<F>
where
    F: Fn(&Linkage, &[Snapshot]) -> f64,
{
    /// Default resolution.
    pub const RES: u64 = 96;
    /// Default warm-up points.
    pub const WARMUP: u64 = 12;

    /// Create a minimizing trial with a fitness function.
    pub fn new(fitness: F) -> Self {
        Self { fitness, goal: Goal::Minimize, res: Self::RES, warmup: Self::WARMUP }
    }

    /// Set the direction of the fitness.
    pub fn with_goal(self, goal: Goal) -> Self {
        Self { goal, ..self }
    }

    impl_builders! {
        /// Minimum number of points per revolution.
        fn res(u64)
        /// Number of points of the warm-up revolution.
        fn warmup(u64)
    }

    fn run(&self, linkage: &mut Linkage) -> Result<f64> {
        let period = linkage.rotation_period()?;
        if self.warmup > 0 {
            let dt = period as f64 / self.warmup as f64;
            for s in linkage.step(self.warmup, dt) {
                s?;
            }
        }
        let factor = self.res.div_ceil(period).max(1);
        let mut snapshots = Vec::new();
        linkage.simulate(period * factor, 1. / factor as f64, &mut snapshots)?;
        Ok((self.fitness)(linkage, &snapshots))
    }
}

impl<F> Evaluator for Kinematic<F>
where
    F: Fn(&Linkage, &[Snapshot]) -> f64,
{
    fn goal(&self) -> Goal {
        self.goal
    }

    fn try_evaluate(
        &self,
        linkage: &mut Linkage,
        params: &[f64],
        init_pos: &[Option<Coord>],
    ) -> Result<f64> {
        linkage.set_completely(params, init_pos)?;
        match self.run(linkage) {
            Err(e) if e.is_unbuildable() => Ok(self.goal.penalty()),
            r => r,
        }
    }
}

/// Squared distance between the bounding box of a joint locus and a target
/// box.
///
/// Returns infinity for an empty locus.
pub fn bbox_fitness(
    _linkage: &Linkage,
    snapshots: &[Snapshot],
    joint: usize,
    target: &crate::BoundingBox,
) -> f64 {
    match bounding_box(snapshots.iter().filter_map(|s| s.get(joint))) {
        Some(b) => b
            .to_array()
            .iter()
            .zip(target.to_array())
            .map(|(a, b)| (a - b) * (a - b))
            .sum(),
        None => f64::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{demo, Joint};

    #[test]
    fn goals() {
        assert_eq!(Goal::Minimize.penalty(), f64::INFINITY);
        assert!(Goal::Minimize.is_better(1., 2.));
        assert!(Goal::Maximize.is_better(2., 1.));
        assert!(!Goal::Maximize.is_better(1., 1.));
    }

    #[test]
    fn sorted_bounds() {
        let b = generate_bounds(&[2., -1.], MIN_RATIO, MAX_FACTOR).sorted();
        assert_eq!(b.lower, [0.4, -5.]);
        assert_eq!(b.upper, [10., -0.2]);
        assert_eq!(b.to_pairs(), [[0.4, 10.], [-5., -0.2]]);
    }

    #[test]
    fn kinematic_penalty() {
        let eval = Kinematic::new(|_: &Linkage, _: &[Snapshot]| 0.);
        let mut l = demo::four_bar().unwrap();
        let init = l.coords();
        let score = eval.evaluate(&mut l, &[1., 3., 1.], &init);
        assert_eq!(score, 0.);
        // The coupler cannot reach the rocker
        let score = eval.evaluate(&mut l, &[1., 0.5, 0.5], &init);
        assert_eq!(score, f64::INFINITY);
        let eval = eval.with_goal(Goal::Maximize);
        let score = eval.evaluate(&mut l, &[1., 0.5, 0.5], &init);
        assert_eq!(score, f64::NEG_INFINITY);
    }

    #[test]
    fn kinematic_structural_error() {
        let eval = Kinematic::new(|_: &Linkage, _: &[Snapshot]| 0.);
        let mut l = demo::four_bar().unwrap();
        let init = l.coords();
        assert!(eval.try_evaluate(&mut l, &[1.], &init).is_err());
        assert_eq!(eval.evaluate(&mut l, &[1.], &init), f64::INFINITY);
    }

    #[test]
    fn kinematic_resolution() {
        let eval = Kinematic::new(|_: &Linkage, s: &[Snapshot]| s.len() as f64).res(30);
        let joints = vec![Joint::crank([0., 0.], 1., std::f64::consts::TAU / 12.)];
        let mut l = Linkage::new("", joints).unwrap();
        let init = vec![Some([1., 0.])];
        // 12 steps per revolution, 3 points per step
        assert_eq!(eval.evaluate(&mut l, &[1.], &init), 36.);
    }
}
