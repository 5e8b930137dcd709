use super::{write_ron, AnyResult, Source};
use indicatif::{ProgressBar, ProgressStyle};
use planar_linkage::{opt::*, BoundingBox, Linkage, Snapshot};
use std::path::PathBuf;

type Fitness = fn(&Linkage, &[Snapshot]) -> f64;

const STYLE: &str = "[{prefix}] {elapsed_precise} {wide_bar} {pos}/{len} {msg}";

#[derive(clap::Args)]
pub(super) struct Opt {
    #[clap(flatten)]
    source: Source,
    /// Name of the joint to fit
    #[clap(long)]
    joint: String,
    /// Target bounding box of the joint locus
    #[clap(long, required = true, num_args = 4, allow_negative_numbers = true,
        value_names = ["Y_MIN", "X_MAX", "Y_MAX", "X_MIN"])]
    bbox: Vec<f64>,
    /// Minimum number of points per revolution
    #[clap(long, default_value_t = Kinematic::<Fitness>::RES)]
    res: u64,
    /// Output path of the optimized linkage (in RON format)
    #[clap(short, long)]
    output: Option<PathBuf>,
    /// Optimization method, default to grid search
    #[clap(subcommand)]
    method: Option<Method>,
}

#[derive(clap::Subcommand)]
enum Method {
    /// Grid search around the current dimensions
    Grid {
        /// Number of values per dimension
        #[clap(long, default_value_t = GridSearch::new().divisions)]
        divisions: usize,
        /// Number of kept results
        #[clap(long, default_value_t = GridSearch::new().n_results)]
        n_results: usize,
        /// Move all dimensions together from the center to each bound,
        /// carrying the pose between trials
        #[clap(long)]
        sequential: bool,
    },
    /// Particle swarm optimization
    Pso {
        /// Number of particles
        #[clap(long, default_value_t = ParticleSwarm::new().n_particles)]
        n_particles: usize,
        /// Number of iterations
        #[clap(long, default_value_t = ParticleSwarm::new().iters)]
        iters: u64,
        /// Attraction to the personal best
        #[clap(long, default_value_t = ParticleSwarm::new().leader)]
        leader: f64,
        /// Attraction to the global best
        #[clap(long, default_value_t = ParticleSwarm::new().follower)]
        follower: f64,
        /// Inertia of the velocity
        #[clap(long, default_value_t = ParticleSwarm::new().inertia)]
        inertia: f64,
        /// Random seed
        #[clap(short, long)]
        seed: Option<u64>,
    },
}

impl Default for Method {
    fn default() -> Self {
        let cfg = GridSearch::new();
        Self::Grid {
            divisions: cfg.divisions,
            n_results: cfg.n_results,
            sequential: cfg.sequential,
        }
    }
}

pub(super) fn opt(opt: Opt) -> AnyResult {
    let Opt { source, joint, bbox, res, output, method } = opt;
    let mut linkage = source.load()?;
    let index = linkage
        .position(&joint)
        .ok_or_else(|| format!("no joint named {joint:?}"))?;
    let target = match <[f64; 4]>::try_from(bbox) {
        Ok(v) => BoundingBox::from_array(v),
        Err(_) => return Err("bounding box needs 4 values".into()),
    };
    let fitness = move |l: &Linkage, s: &[Snapshot]| bbox_fitness(l, s, index, &target);
    let eval = Kinematic::new(fitness).res(res);
    let init = linkage.coords();
    let center = linkage.constraints();
    let before = eval.evaluate(&mut linkage, &center, &init);
    linkage.set_coords(&init)?;
    let pb = ProgressBar::new(0);
    pb.set_style(ProgressStyle::with_template(STYLE)?);
    let best = match method.unwrap_or_default() {
        Method::Grid { divisions, n_results, sequential } => {
            let cfg = GridSearch::new()
                .divisions(divisions)
                .n_results(n_results)
                .sequential(sequential);
            pb.set_length(cfg.trials(center.len()) as u64);
            pb.set_prefix("grid");
            let agents = grid_search(&eval, &mut linkage, &center, &cfg, |i, _| {
                pb.set_position(i as u64);
            })?;
            for (rank, agent) in agents.iter().enumerate() {
                println!("#{rank}: {:.6}", agent.score);
            }
            agents.into_iter().next().ok_or("no result")?
        }
        Method::Pso { n_particles, iters, leader, follower, inertia, seed } => {
            let cfg = ParticleSwarm::new()
                .n_particles(n_particles)
                .iters(iters)
                .leader(leader)
                .follower(follower)
                .inertia(inertia)
                .seed(seed);
            pb.set_length(iters);
            pb.set_prefix("pso");
            let bounds = generate_bounds(&center, MIN_RATIO, MAX_FACTOR);
            particle_swarm(&eval, &mut linkage, &bounds, &cfg, |gen| {
                pb.set_position(gen);
            })?
        }
    };
    pb.finish_with_message(format!("{:.6}", best.score));
    println!("before: {before:.6}");
    println!("best: {:.6}", best.score);
    println!("dims: {:?}", best.dims);
    linkage.set_completely(&best.dims, &best.init_pos)?;
    if output.is_some() {
        write_ron(output.as_deref(), &linkage)?;
    }
    Ok(())
}
