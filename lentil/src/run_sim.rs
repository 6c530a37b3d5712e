use crate::run_fit::FitOptions;

use clap::Args;
use lentil::common::*;
use lentil::fit::PointEstimateFitter;
use lentil::fit_outcome::FitOutcome;
use lentil::input::CloneAlignInput;
use lentil::sampling_plan::ScenarioGrid;
use lentil::simulate::Simulator;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

#[derive(Args, Debug, Clone)]
pub struct SimArgs {
    /// directory of a saved fit (`lentil fit`); skips fitting
    #[arg(short = 'f', long, conflicts_with_all = ["expr", "cnv", "clone"])]
    fit_dir: Option<Box<str>>,

    /// expression matrix, genes x cells (`.csv`, `.tsv`, optionally `.gz`)
    #[arg(short = 'e', long, requires_all = ["cnv", "clone"])]
    expr: Option<Box<str>>,

    /// copy number matrix, genes x cells
    #[arg(short = 'c', long)]
    cnv: Option<Box<str>>,

    /// clone table with `cell_id` and `clone_id` columns
    #[arg(short = 'l', long)]
    clone: Option<Box<str>>,

    #[command(flatten)]
    options: FitOptions,

    /// also save the fitted parameters under `{out_dir}/fit`
    #[arg(long, default_value_t = false)]
    save_fit: bool,

    /// run index used in the output file names
    #[arg(short, long, default_value_t = 1)]
    index: usize,

    /// number of genes sampled per run
    #[arg(short, long, default_value_t = 500)]
    gene_count: usize,

    /// nested numbers of synthetic cells
    #[arg(long, value_delimiter = ',', default_values_t = vec![100, 1000, 5000])]
    cell_counts: Vec<usize>,

    /// fractions of copy-number-dependent genes
    #[arg(long, value_delimiter = ',',
	  default_values_t = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0])]
    cnv_freqs: Vec<f64>,

    /// random seed
    #[arg(short, long, default_value_t = 42)]
    rseed: u64,

    /// output directory
    #[arg(short, long, required = true)]
    out_dir: Box<str>,
}

fn build_simulator(args: &SimArgs) -> anyhow::Result<Simulator> {
    if let Some(fit_dir) = args.fit_dir.as_ref() {
        return Simulator::from_fit(FitOutcome::read_dir(fit_dir)?);
    }

    let (Some(expr), Some(cnv), Some(clone)) = (&args.expr, &args.cnv, &args.clone) else {
        anyhow::bail!("need either --fit-dir or all of --expr, --cnv, --clone");
    };

    let input = CloneAlignInput::read(expr, cnv, clone)?;
    let fitter = PointEstimateFitter::new(args.options.to_config());
    let simulator = Simulator::new(&input, &fitter)?;

    if args.save_fit {
        let fit_dir = Path::new(&*args.out_dir).join("fit");
        let fit_dir = fit_dir
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("invalid output directory"))?;
        simulator.fit_outcome().write_dir(fit_dir)?;
    }

    Ok(simulator)
}

pub fn run_sim(args: &SimArgs) -> anyhow::Result<()> {
    let simulator = build_simulator(args)?;

    let mut grid = ScenarioGrid {
        index: args.index,
        gene_count: args.gene_count,
        cell_counts: args.cell_counts.clone(),
        cnv_dependency_freqs: args.cnv_freqs.clone(),
    };

    let mut rng = StdRng::seed_from_u64(args.rseed);
    let written = simulator.simulate_data(&args.out_dir, &mut grid, &mut rng)?;

    info!(
        "wrote {} scenarios ({} files) under {}",
        written.len(),
        written.len() * 3,
        args.out_dir
    );
    Ok(())
}
