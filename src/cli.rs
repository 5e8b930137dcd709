use planar_linkage::{demo, Linkage};
use std::path::{Path, PathBuf};

mod opt;
mod sim;

const APP_NAME: &str = env!("CARGO_BIN_NAME");

type AnyResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

#[derive(clap::Parser)]
#[clap(name = APP_NAME, version, author, about)]
pub(crate) struct Entry {
    #[clap(subcommand)]
    cmd: Cmd,
}

#[derive(clap::Subcommand)]
enum Cmd {
    /// Simulate a linkage and write the loci
    Sim(sim::Sim),
    /// Optimize the dimensions of a linkage
    Opt(opt::Opt),
    /// Write a demo linkage
    Demo {
        /// Demo name (four-bar, stroke-engine, strider)
        name: String,
        /// Output path (in RON format), default to stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

impl Entry {
    pub(super) fn main() {
        let entry = <Self as clap::Parser>::parse_from(wild::args());
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .init();
        register_panic_hook();
        let res = match entry.cmd {
            Cmd::Sim(sim) => sim::sim(sim),
            Cmd::Opt(opt) => opt::opt(opt),
            Cmd::Demo { name, output } => write_demo(&name, output.as_deref()),
        };
        if let Err(e) = res {
            eprintln!("{APP_NAME}: {e}");
            std::process::exit(1);
        }
    }
}

/// Linkage from a RON file or a demo.
#[derive(clap::Args)]
struct Source {
    /// Linkage path (in RON format)
    #[clap(required_unless_present = "demo", conflicts_with = "demo")]
    file: Option<PathBuf>,
    /// Use a demo linkage instead of a file
    #[clap(long)]
    demo: Option<String>,
}

impl Source {
    fn load(&self) -> AnyResult<Linkage> {
        match (&self.file, &self.demo) {
            (Some(path), _) => {
                let s = std::fs::read_to_string(path)?;
                Ok(ron::from_str(&s)?)
            }
            (None, Some(name)) => {
                let f = demo_by_name(name)?;
                Ok(f()?)
            }
            (None, None) => Err("no linkage given".into()),
        }
    }
}

fn demo_by_name(name: &str) -> AnyResult<fn() -> planar_linkage::Result<Linkage>> {
    demo::by_name(name).ok_or_else(|| {
        let names = demo::NAMES.join(", ");
        format!("unknown demo {name:?}, expected one of {names}").into()
    })
}

fn write_ron<S: serde::Serialize>(path: Option<&Path>, value: &S) -> AnyResult {
    let s = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())?;
    match path {
        Some(path) => std::fs::write(path, s)?,
        None => println!("{s}"),
    }
    Ok(())
}

fn write_demo(name: &str, output: Option<&Path>) -> AnyResult {
    let f = demo_by_name(name)?;
    write_ron(output, &f()?)
}

fn register_panic_hook() {
    // Print panic messages without stack trace
    std::panic::set_hook(Box::new(|info| {
        match info.payload().downcast_ref::<&str>() {
            Some(s) => eprintln!("{s}"),
            None => eprintln!("{info}"),
        }
        std::process::exit(1);
    }));
}
