use clap::Args;
use lentil::common::*;
use lentil::fit::{CloneModelFit, FitConfig, PointEstimateFitter};
use lentil::input::CloneAlignInput;

/// Hyperparameters of the point estimator
#[derive(Args, Debug, Clone)]
pub struct FitOptions {
    /// copy numbers above this value are clipped
    #[arg(long, default_value_t = 10)]
    pub cnv_cutoff: u32,

    /// clones with fewer cells are dropped
    #[arg(long, default_value_t = 20)]
    pub min_clone_cells: usize,

    /// use raw copy numbers instead of ploidy-normalized ones
    #[arg(long, default_value_t = false)]
    pub no_normalize_cnv: bool,

    /// number of latent covariate factors
    #[arg(long, default_value_t = 1)]
    pub num_latent: usize,
}

impl FitOptions {
    pub fn to_config(&self) -> FitConfig {
        FitConfig {
            normalize_cnv: !self.no_normalize_cnv,
            cnv_cutoff: self.cnv_cutoff,
            min_clone_cell_count: self.min_clone_cells,
            num_latent: self.num_latent,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct FitArgs {
    /// expression matrix, genes x cells (`.csv`, `.tsv`, optionally `.gz`)
    #[arg(short = 'e', long, required = true)]
    expr: Box<str>,

    /// copy number matrix, genes x cells
    #[arg(short = 'c', long, required = true)]
    cnv: Box<str>,

    /// clone table with `cell_id` and `clone_id` columns
    #[arg(short = 'l', long, required = true)]
    clone: Box<str>,

    #[command(flatten)]
    options: FitOptions,

    /// output directory of the fitted parameters
    #[arg(short, long, required = true)]
    out_dir: Box<str>,
}

pub fn run_fit(args: &FitArgs) -> anyhow::Result<()> {
    let input = CloneAlignInput::read(&args.expr, &args.cnv, &args.clone)?;
    let fitter = PointEstimateFitter::new(args.options.to_config());
    info!("{:?}", fitter.config());

    let outcome = fitter.fit(&input)?;
    outcome.write_dir(&args.out_dir)?;
    Ok(())
}
