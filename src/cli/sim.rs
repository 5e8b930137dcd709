use super::{AnyResult, Source};
use indicatif::{ProgressBar, ProgressStyle};
use planar_linkage::{bounding_box, csv::dump_csv, loci};
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct Sim {
    #[clap(flatten)]
    source: Source,
    /// Number of steps, default to one rotation period
    #[clap(long)]
    iter: Option<u64>,
    /// Fraction of the crank rotation per step
    #[clap(long, default_value_t = 1.)]
    dt: f64,
    /// Output path of the loci (in CSV format)
    #[clap(short, long)]
    output: Option<PathBuf>,
}

pub(super) fn sim(sim: Sim) -> AnyResult {
    let Sim { source, iter, dt, output } = sim;
    let mut linkage = source.load()?;
    let iter = match iter {
        Some(iter) => iter,
        None => linkage.rotation_period()?,
    };
    let cranks = linkage.joints().iter().filter(|j| j.is_crank()).count();
    let statics = linkage.joints().iter().filter(|j| j.is_static()).count();
    println!(
        "{}: {} joints ({cranks} cranks, {statics} static), {iter} steps, dt={dt}",
        linkage.name(),
        linkage.len()
    );
    const STYLE: &str = "{elapsed_precise} {wide_bar} {pos}/{len}";
    let pb = ProgressBar::new(iter);
    pb.set_style(ProgressStyle::with_template(STYLE)?);
    let mut snapshots = Vec::with_capacity(usize::try_from(iter).unwrap_or_default());
    for s in linkage.step(iter, dt) {
        match s {
            Ok(s) => snapshots.push(s),
            Err(e) => {
                pb.abandon_with_message(e.to_string());
                return Err(e.into());
            }
        }
        pb.inc(1);
    }
    pb.finish();
    for (joint, locus) in linkage.joints().iter().zip(loci(&snapshots)) {
        if let Some(bb) = bounding_box(&locus) {
            let [y_min, x_max, y_max, x_min] = bb.to_array();
            println!("{joint}: x=[{x_min:.4}, {x_max:.4}] y=[{y_min:.4}, {y_max:.4}]");
        }
    }
    for d in linkage.take_diagnostics() {
        let joint = &linkage.joints()[d.index];
        println!("{joint}: {:?}", d.kind);
    }
    if let Some(path) = output {
        std::fs::write(path, dump_csv(&linkage, &snapshots)?)?;
    }
    Ok(())
}
