mod run_fit;
mod run_sim;

use run_fit::*;
use run_sim::*;

use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser, Debug)]
#[command(
    name = "lentil",
    version,
    about = "Clone-aware synthetic single-cell expression",
    long_about = "Fit a clone expression model on single-cell expression, copy number,\n\
		  and clone labels, then sample synthetic expression data sets over a grid\n\
		  of cell counts and copy-number-dependent gene fractions."
)]
struct Cli {
    /// show info-level log messages
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fit the clone expression model and save point estimates
    Fit(FitArgs),

    #[command(
        about = "Simulate synthetic data sets from a fitted model",
        long_about = "Simulate synthetic data sets in three steps:\n\
		      (1) Fit the model on the inputs (or read a saved fit)\n\
		      (2) Sample nested cell tiers and a gene set once\n\
		      (3) Draw expression for every (dependency frequency, cell tier) pair.\n"
    )]
    Simulate(SimArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    match &cli.commands {
        Commands::Fit(args) => {
            run_fit(args)?;
        }
        Commands::Simulate(args) => {
            run_sim(args)?;
        }
    }

    info!("Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lentil::common::Mat;
    use matrix_util::common_io::write_lines;
    use matrix_util::traits::IoOps;

    /// expression, copy number, and clone tables for 3 clones x 20 cells
    fn write_inputs(dir: &std::path::Path) -> anyhow::Result<Vec<String>> {
        let (ng, nc) = (12, 60);
        let genes: Vec<Box<str>> = (0..ng).map(|g| format!("g{}", g).into()).collect();
        let cells: Vec<Box<str>> = (0..nc).map(|c| format!("cell{}", c).into()).collect();
        let clone_of = |c: usize| c % 3;

        let cnv = Mat::from_fn(ng, nc, |g, c| 1. + ((g + clone_of(c)) % 3) as f32);
        let expr = Mat::from_fn(ng, nc, |g, c| (3. * cnv[(g, c)] * (1 + c % 4) as f32).round());

        let file = |name: &str| dir.join(name).to_string_lossy().into_owned();
        let (expr_file, cnv_file, clone_file) =
            (file("expr.csv"), file("cnv.csv.gz"), file("clones.csv"));

        expr.to_csv_with_names(&expr_file, &genes, &cells)?;
        cnv.to_csv_with_names(&cnv_file, &genes, &cells)?;

        let mut lines: Vec<Box<str>> = vec!["cell_id,clone_id".into()];
        lines.extend((0..nc).map(|c| format!("{},clone{}", cells[c], clone_of(c)).into()));
        write_lines(&lines, &clone_file)?;

        Ok(vec![expr_file, cnv_file, clone_file])
    }

    fn run(args: &[&str]) -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(std::iter::once("lentil").chain(args.iter().copied()))?;
        match &cli.commands {
            Commands::Fit(args) => run_fit(args),
            Commands::Simulate(args) => run_sim(args),
        }
    }

    fn count_files(dir: &str, prefix: &str) -> anyhow::Result<usize> {
        Ok(std::fs::read_dir(dir)?
            .filter_map(|x| x.ok())
            .filter(|x| x.file_name().to_string_lossy().starts_with(prefix))
            .count())
    }

    #[test]
    fn fit_then_simulate_from_saved_fit() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let inputs = write_inputs(dir.path())?;
        let fit_dir = dir.path().join("fit").to_string_lossy().into_owned();
        let sim_dir = dir.path().join("sim").to_string_lossy().into_owned();

        for num_latent in ["1", "0"] {
            run(&[
                "fit", "-e", inputs[0].as_str(), "-c", inputs[1].as_str(), "-l", inputs[2].as_str(),
                "--num-latent", num_latent, "-o", fit_dir.as_str(),
            ])?;

            run(&[
                "simulate", "-f", fit_dir.as_str(), "-g", "4", "--cell-counts", "5,2",
                "--cnv-freqs", "0.5,1", "-o", sim_dir.as_str(),
            ])?;
        }

        assert_eq!(count_files(&sim_dir, "simulated_expr_")?, 4);
        assert_eq!(count_files(&sim_dir, "simulated_clone_assignment_")?, 4);
        Ok(())
    }

    #[test]
    fn simulate_from_inputs_saves_fit() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let inputs = write_inputs(dir.path())?;
        let out_dir = dir.path().join("out").to_string_lossy().into_owned();

        run(&[
            "simulate", "-e", inputs[0].as_str(), "-c", inputs[1].as_str(), "-l", inputs[2].as_str(),
            "--save-fit", "-g", "3", "--cell-counts", "4", "--cnv-freqs", "0.3",
            "-i", "2", "-o", out_dir.as_str(),
        ])?;

        assert_eq!(count_files(&out_dir, "simulated_")?, 3);
        let fit_dir = std::path::Path::new(&out_dir).join("fit");
        let fit = lentil::fit_outcome::FitOutcome::read_dir(&fit_dir.to_string_lossy())?;
        assert_eq!(fit.clone_cnv.num_clones(), 3);
        Ok(())
    }

    #[test]
    fn simulate_needs_one_source() {
        assert!(run(&["simulate", "-o", "unused"]).is_err());
        assert!(run(&["simulate", "-f", "a", "-e", "b", "-o", "unused"]).is_err());
        assert!(run(&["simulate", "-e", "b", "-o", "unused"]).is_err());
    }
}
