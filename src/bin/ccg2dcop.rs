//! # `ccg2dcop`
//!
//! A small tool for converting weighted conflict graph (CCG) files into
//! DCOP instances in the XCSP, WCSP, and JSON formats.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use ccg2dcop::instances::{Ccg, Dcop};
use clap::Parser;

/// Name written into the instance headers of the generated files
const INSTANCE_NAME: &str = "ccg_dcop";

/// Process exit code reported on an infeasible input (-2 truncated to the
/// u8 range of process exit codes)
const INFEASIBLE_EXIT: u8 = -2i8 as u8;

/// Process exit code reported when the input is already fully decided
const SOLVED_EXIT: u8 = 1;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The CCG input file
    #[arg(short, long)]
    input: PathBuf,
    /// Base path of the generated output files; the tool writes
    /// `<base>.json`, `<base>_dcop.xml`, `<base>_dcop.wcsp`, and
    /// `<base>_dcop.json`
    #[arg(short, long)]
    output: PathBuf,
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut path = base.as_os_str().to_os_string();
    path.push(suffix);
    PathBuf::from(path)
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let graph = Ccg::from_path(&args.input).context("error parsing the input file")?;
    let kernel = match graph.kernelize() {
        Ok(kernel) => kernel,
        Err(err) => {
            println!("{err}");
            return Ok(ExitCode::from(INFEASIBLE_EXIT));
        }
    };
    if kernel.is_solved() {
        println!("Problem already solved");
        return Ok(ExitCode::from(SOLVED_EXIT));
    }

    let dcop = Dcop::build(kernel);
    println!(
        "saving dcop: agents={} variables={} constraints={}",
        dcop.n_agents(),
        dcop.n_variables(),
        dcop.n_constraints(),
    );
    dcop.write_json_path(with_suffix(&args.output, ".json"))
        .context("error writing the dcop dump")?;

    let inst = dcop.to_instance(INSTANCE_NAME);
    inst.write_xcsp_path(with_suffix(&args.output, "_dcop.xml"))
        .context("error writing the XCSP file")?;
    inst.write_wcsp_path(with_suffix(&args.output, "_dcop.wcsp"))
        .context("error writing the WCSP file")?;
    inst.write_json_path(with_suffix(&args.output, "_dcop.json"))
        .context("error writing the JSON file")?;
    Ok(ExitCode::SUCCESS)
}
