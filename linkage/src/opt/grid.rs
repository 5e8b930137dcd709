use super::*;
use crate::Error;

/// Grid ("trials and errors") search configuration.
///
/// The number of trials grows as `divisions ^ dimensions`, keep it for small
/// problems.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct GridSearch {
    /// Number of subdivisions between the bounds
    pub divisions: usize,
    /// Number of the best agents to keep
    pub n_results: usize,
    /// Search space, generated around the center if `None`
    pub bounds: Option<Bounds>,
    /// Use the sequential variator and carry the pose between trials
    pub sequential: bool,
}

impl Default for GridSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl GridSearch {
    /// Default value.
    pub const fn new() -> Self {
        Self { divisions: 5, n_results: 10, bounds: None, sequential: false }
    }

    impl_builders! {
        /// Number of subdivisions between the bounds.
        fn divisions(usize)
        /// Number of the best agents to keep.
        fn n_results(usize)
        /// Search space.
        fn bounds(Option<Bounds>)
        /// Use the sequential variator.
        fn sequential(bool)
    }

    /// Number of trials for `dim` dimensions.
    pub fn trials(&self, dim: usize) -> usize {
        if self.sequential {
            sequential_len(self.divisions)
        } else {
            u32::try_from(dim)
                .ok()
                .and_then(|d| self.divisions.checked_pow(d))
                .unwrap_or(usize::MAX)
        }
    }
}

/// Evenly spaced values, both ends included.
fn linspace(a: f64, b: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = if n > 1 { (b - a) / (n - 1) as f64 } else { 0. };
    (0..n).map(move |i| if i + 1 == n && n > 1 { b } else { a + step * i as f64 })
}

fn linspace_vec(a: &[f64], b: &[f64], n: usize) -> Vec<Vec<f64>> {
    let columns = a
        .iter()
        .zip(b)
        .map(|(a, b)| linspace(*a, *b, n).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    (0..n)
        .map(|i| columns.iter().map(|c| c[i]).collect())
        .collect()
}

fn sequential_len(divisions: usize) -> usize {
    let half = divisions / 2;
    let back = if divisions % 2 == 1 {
        half.saturating_sub(1).div_ceil(2)
    } else {
        half.div_ceil(2)
    };
    half.div_ceil(2) + back + divisions.div_ceil(2)
}

/// All the combinations of `divisions` values per dimension.
///
/// The order of the trials is the lexicographic order of the grid.
pub fn fast_variator(bounds: &Bounds, divisions: usize) -> impl Iterator<Item = Vec<f64>> {
    let axes = bounds
        .lower
        .iter()
        .zip(&bounds.upper)
        .map(|(lo, hi)| linspace(*lo, *hi, divisions).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    let mut index = vec![0; axes.len()];
    let mut done = axes.iter().any(Vec::is_empty);
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        let item = axes.iter().zip(&index).map(|(v, i)| v[*i]).collect();
        // Odometer increment, the last dimension moves first
        done = true;
        for (i, v) in index.iter_mut().zip(&axes).rev() {
            *i += 1;
            if *i < v.len() {
                done = false;
                break;
            }
            *i = 0;
        }
        Some(item)
    })
}

/// Trials with small variations between two consecutive items.
///
/// From the center to the lower bounds every other step, back to the center
/// with the remaining steps, then from the center to the upper bounds. All
/// dimensions move together.
pub fn sequential_variator(center: &[f64], bounds: &Bounds, divisions: usize) -> Vec<Vec<f64>> {
    let fall = linspace_vec(center, &bounds.lower, divisions / 2);
    let mut out = fall.iter().step_by(2).cloned().collect::<Vec<_>>();
    if divisions % 2 == 1 {
        let n = fall.len().saturating_sub(1);
        out.extend(fall[..n].iter().rev().step_by(2).cloned());
    } else {
        out.extend(fall.iter().rev().step_by(2).cloned());
    }
    out.extend(linspace_vec(center, &bounds.upper, divisions.div_ceil(2)));
    out
}

/// Try every trial of the grid and keep the best agents, best first.
///
/// The trials start from the current pose of the linkage. The callback
/// receives the index of the trial and the number of trials. The linkage is
/// left in the state of the last trial.
pub fn grid_search<E, C>(
    eval: &E,
    linkage: &mut Linkage,
    center: &[f64],
    cfg: &GridSearch,
    mut callback: C,
) -> Result<Vec<Agent>>
where
    E: Evaluator + ?Sized,
    C: FnMut(usize, usize),
{
    let expected = linkage.constraint_num();
    if center.len() != expected {
        return Err(Error::ConstraintCount { expected, got: center.len() });
    }
    let bounds = match &cfg.bounds {
        Some(b) if b.len() != expected || b.upper.len() != expected => {
            return Err(Error::ConstraintCount { expected, got: b.len() });
        }
        Some(b) => b.clone().sorted(),
        None => generate_bounds(center, MIN_RATIO, MAX_FACTOR).sorted(),
    };
    let total = cfg.trials(center.len());
    let variator: Box<dyn Iterator<Item = Vec<f64>>> = if cfg.sequential {
        Box::new(sequential_variator(center, &bounds, cfg.divisions).into_iter())
    } else {
        Box::new(fast_variator(&bounds, cfg.divisions))
    };
    let goal = eval.goal();
    let mut prev = linkage.coords();
    let mut results = Vec::<Agent>::with_capacity(cfg.n_results + 1);
    for (i, dims) in variator.enumerate() {
        let score = eval.evaluate(linkage, &dims, &prev);
        let agent = Agent { score, dims, init_pos: prev.clone() };
        if cfg.sequential && score != goal.penalty() {
            prev = linkage.coords();
        }
        let pos = results
            .iter()
            .position(|a| goal.is_better(agent.score, a.score))
            .unwrap_or(results.len());
        if pos < cfg.n_results {
            results.insert(pos, agent);
            results.truncate(cfg.n_results);
        }
        callback(i + 1, total);
    }
    if let Some(best) = results.first() {
        tracing::info!(score = best.score, dims = ?best.dims, "grid search finished");
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn bounds() -> Bounds {
        Bounds { lower: vec![0., 10.], upper: vec![1., 20.] }
    }

    #[test]
    fn spaces() {
        assert_eq!(linspace(0., 1., 3).collect::<Vec<_>>(), [0., 0.5, 1.]);
        assert_eq!(linspace(2., 1., 1).collect::<Vec<_>>(), [2.]);
        assert_eq!(linspace(0., 1., 0).count(), 0);
    }

    #[test]
    fn fast_grid() {
        let trials = fast_variator(&bounds(), 3).collect::<Vec<_>>();
        assert_eq!(trials.len(), 9);
        assert_eq!(trials[0], [0., 10.]);
        assert_eq!(trials[1], [0., 15.]);
        assert_eq!(trials[3], [0.5, 10.]);
        assert_eq!(trials[8], [1., 20.]);
        assert_eq!(fast_variator(&Bounds::default(), 3).count(), 1);
        assert_eq!(fast_variator(&bounds(), 0).count(), 0);
    }

    #[test]
    fn sequential_steps() {
        let center = [0.5, 15.];
        for divisions in [4, 5, 6, 7, 10] {
            let trials = sequential_variator(&center, &bounds(), divisions);
            let cfg = GridSearch::new().divisions(divisions).sequential(true);
            assert_eq!(trials.len(), cfg.trials(2), "divisions = {divisions}");
            assert_eq!(trials[0], center);
            assert_eq!(trials.last().unwrap(), &[1., 20.]);
        }
        // Fall [0.5, 0.25, 0] by two, back by two, then the rise
        let trials = sequential_variator(&center, &bounds(), 6);
        let x = trials.iter().map(|t| t[0]).collect::<Vec<_>>();
        let expected = [0.5, 0., 0., 0.5, 0.5, 0.75, 1.];
        assert_eq!(x.len(), expected.len());
        for (a, b) in x.iter().zip(expected) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
        }
        // All the dimensions move together
        for t in &trials {
            assert_abs_diff_eq!(t[1] - 15., (t[0] - 0.5) * 10., epsilon = 1e-12);
        }
    }
}
