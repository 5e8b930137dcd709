use super::*;
use crate::{mh, Error};

/// Particle swarm configuration.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleSwarm {
    /// Number of particles
    pub n_particles: usize,
    /// Number of iterations
    pub iters: u64,
    /// Attraction to the personal best
    pub leader: f64,
    /// Attraction to the global best
    pub follower: f64,
    /// Inertia of the velocity
    pub inertia: f64,
    /// Random seed
    pub seed: Option<u64>,
}

impl Default for ParticleSwarm {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleSwarm {
    /// Default value.
    pub const fn new() -> Self {
        Self {
            n_particles: 100,
            iters: 200,
            leader: 3.,
            follower: 0.1,
            inertia: 0.6,
            seed: None,
        }
    }

    impl_builders! {
        /// Number of particles.
        fn n_particles(usize)
        /// Number of iterations.
        fn iters(u64)
        /// Attraction to the personal best.
        fn leader(f64)
        /// Attraction to the global best.
        fn follower(f64)
        /// Inertia of the velocity.
        fn inertia(f64)
        /// Random seed.
        fn seed(Option<u64>)
    }
}

/// Objective function of a linkage for the metaheuristic solver.
///
/// Every fitness call works on its own copy of the linkage.
struct SwarmFunc<'a, E: ?Sized> {
    eval: &'a E,
    linkage: Linkage,
    init_pos: Vec<Option<Coord>>,
    bound: Vec<[f64; 2]>,
}

impl<E> mh::Bounded for SwarmFunc<'_, E>
where
    E: Evaluator + Sync + ?Sized,
{
    fn bound(&self) -> &[[f64; 2]] {
        &self.bound
    }
}

impl<E> mh::ObjFunc for SwarmFunc<'_, E>
where
    E: Evaluator + Sync + ?Sized,
{
    type Ys = f64;

    fn fitness(&self, xs: &[f64]) -> Self::Ys {
        let mut linkage = self.linkage.clone();
        let score = self.eval.evaluate(&mut linkage, xs, &self.init_pos);
        // The solver minimizes
        match self.eval.goal() {
            Goal::Minimize => score,
            Goal::Maximize => -score,
        }
    }
}

/// Particle swarm search in `bounds`.
///
/// The trials start from the current pose of the linkage. The callback
/// receives the current iteration. The linkage is left in the state of the
/// best agent.
pub fn particle_swarm<E, C>(
    eval: &E,
    linkage: &mut Linkage,
    bounds: &Bounds,
    cfg: &ParticleSwarm,
    mut callback: C,
) -> Result<Agent>
where
    E: Evaluator + Sync + ?Sized,
    C: FnMut(u64) + Send,
{
    let expected = linkage.constraint_num();
    if bounds.len() != expected || bounds.upper.len() != expected {
        return Err(Error::ConstraintCount { expected, got: bounds.len() });
    }
    let init_pos = linkage.coords();
    let func = SwarmFunc {
        eval,
        linkage: linkage.clone(),
        init_pos: init_pos.clone(),
        bound: bounds.clone().sorted().to_pairs(),
    };
    let method = mh::Pso::new()
        .cognition(cfg.leader)
        .social(cfg.follower)
        .velocity(cfg.inertia);
    let s = mh::Solver::build(method, func)
        .seed(mh::random::SeedOpt::from(cfg.seed))
        .pop_num(cfg.n_particles)
        .task(|ctx| ctx.gen >= cfg.iters)
        .callback(|ctx| callback(ctx.gen))
        .solve();
    let dims = s.as_best_xs().to_vec();
    let score = eval.try_evaluate(linkage, &dims, &init_pos)?;
    tracing::info!(score, ?dims, "particle swarm finished");
    Ok(Agent { score, dims, init_pos })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;

    #[test]
    fn swarm_keeps_bounds() {
        let eval = Kinematic::new(|l: &Linkage, s: &[Snapshot]| {
            let loci = crate::loci(s);
            crate::bounding_box(&loci[l.len() - 1]).map_or(f64::INFINITY, |b| b.width())
        });
        let mut linkage = demo::four_bar().unwrap();
        let bounds = generate_bounds(&linkage.constraints(), 2., 2.);
        let cfg = ParticleSwarm::new().n_particles(8).iters(3).seed(Some(0));
        let mut last = 0;
        let agent = particle_swarm(&eval, &mut linkage, &bounds, &cfg, |i| last = i).unwrap();
        assert!(last > 0);
        assert_eq!(agent.dims.len(), 3);
        for ((x, lo), hi) in agent.dims.iter().zip(&bounds.lower).zip(&bounds.upper) {
            assert!(lo <= x && x <= hi);
        }
        let wrong = Bounds { lower: vec![1.], upper: vec![2.] };
        assert!(particle_swarm(&eval, &mut linkage, &wrong, &cfg, |_| ()).is_err());
    }
}
