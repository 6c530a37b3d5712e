use crate::clone_cnv::CloneCnvTable;
use crate::common::*;
use crate::fit::CloneModelFit;
use crate::fit_outcome::FitOutcome;
use crate::input::CloneAlignInput;
use crate::multinomial::sample_multinomial;
use crate::params::{softplus, FittedParams};
use crate::sampling_plan::{SamplingPlan, ScenarioGrid};

use indicatif::ParallelProgressIterator;
use matrix_util::common_io::{mkdir_all, quote_field, write_lines};
use matrix_util::traits::IoOps;
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::path::Path;

/// Simulation session: holds one fit outcome for its whole lifetime
/// and samples synthetic data sets from it
pub struct Simulator {
    fit: FitOutcome,
}

/// One synthetic data set
///
/// * `genes` - sampled gene names, in sample order
/// * `expr` - genes x synthetic cells counts
/// * `dependency` - 1 if the gene's expression follows copy number
/// * `clone_ids` - source clone of each synthetic cell
#[derive(Debug, Clone)]
pub struct ScenarioData {
    pub genes: Vec<Box<str>>,
    pub expr: DMatrix<u64>,
    pub dependency: Vec<u8>,
    pub clone_ids: Vec<Box<str>>,
}

/// Output files of one scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioFiles {
    pub clone_assignment: Box<str>,
    pub gene_type_score: Box<str>,
    pub expr: Box<str>,
}

impl ScenarioFiles {
    /// `{output_dir}/simulated_{kind}_gene_{G}_cell_{N}_cnv_{f}_index_{i}.csv`
    pub fn new(
        output_dir: &str,
        gene_count: usize,
        cell_count: usize,
        cnv_freq: f64,
        index: usize,
    ) -> Self {
        let file = |kind: &str| -> Box<str> {
            let name = format!(
                "simulated_{}_gene_{}_cell_{}_cnv_{}_index_{}.csv",
                kind, gene_count, cell_count, cnv_freq, index
            );
            Path::new(output_dir)
                .join(name)
                .to_string_lossy()
                .into_owned()
                .into_boxed_str()
        };

        Self {
            clone_assignment: file("clone_assignment"),
            gene_type_score: file("gene_type_score"),
            expr: file("expr"),
        }
    }
}

impl ScenarioData {
    pub fn num_cells(&self) -> usize {
        self.expr.ncols()
    }

    pub fn num_genes(&self) -> usize {
        self.expr.nrows()
    }

    /// Write the three tables, each with a leading row index column
    pub fn write(&self, files: &ScenarioFiles) -> anyhow::Result<()> {
        let cells: Vec<Box<str>> = (0..self.num_cells())
            .map(|c| c.to_string().into_boxed_str())
            .collect();

        self.expr.to_csv_with_names(&files.expr, &self.genes, &cells)?;

        let mut score_lines: Vec<Box<str>> = vec![",gene,gene_type_score".into()];
        score_lines.extend(
            self.genes
                .iter()
                .zip(self.dependency.iter())
                .enumerate()
                .map(|(i, (g, d))| format!("{},{},{}", i, quote_field(g), d).into_boxed_str()),
        );
        write_lines(&score_lines, &files.gene_type_score)?;

        let mut assign_lines: Vec<Box<str>> = vec![",expr_cell_id,clone_id".into()];
        assign_lines.extend(
            self.clone_ids
                .iter()
                .enumerate()
                .map(|(c, k)| format!("{},{},{}", c, c, quote_field(k)).into_boxed_str()),
        );
        write_lines(&assign_lines, &files.clone_assignment)?;

        Ok(())
    }
}

impl Simulator {
    /// Fit the model once and keep the outcome
    pub fn new<F>(input: &CloneAlignInput, fitter: &F) -> anyhow::Result<Self>
    where
        F: CloneModelFit + ?Sized,
    {
        info!("fitting the clone model...");
        let fit = fitter.fit(input)?;
        Self::from_fit(fit)
    }

    /// Start from an existing fit outcome
    pub fn from_fit(fit: FitOutcome) -> anyhow::Result<Self> {
        fit.validate()?;
        Ok(Self { fit })
    }

    pub fn fit_outcome(&self) -> &FitOutcome {
        &self.fit
    }

    pub fn clone_cnv(&self) -> &CloneCnvTable {
        &self.fit.clone_cnv
    }

    pub fn params(&self) -> &FittedParams {
        &self.fit.params
    }

    /// Simulate every (dependency frequency, cell-count tier) scenario of
    /// the grid and write three CSV files for each.
    ///
    /// The grid is sorted in place first. Cell tiers and the gene sample
    /// are drawn once and shared by all scenarios.
    pub fn simulate_data<R: Rng + ?Sized>(
        &self,
        output_dir: &str,
        grid: &mut ScenarioGrid,
        rng: &mut R,
    ) -> anyhow::Result<Vec<ScenarioFiles>> {
        let cnv = self.clone_cnv();
        let plan = SamplingPlan::draw(grid, cnv.num_genes(), cnv.num_clones(), rng)?;

        mkdir_all(output_dir)?;

        info!(
            "simulating {} scenarios: {} genes, cells {:?}, dependency {:?}",
            grid.num_scenarios(),
            grid.gene_count,
            grid.cell_counts,
            grid.cnv_dependency_freqs
        );

        let mut written = Vec::with_capacity(grid.num_scenarios());

        for (freq, dependency) in plan.dependency.iter() {
            for cell_sample in plan.cell_tiers.iter() {
                let data =
                    self.simulate_individual_data(&plan.gene_ids, cell_sample, dependency, rng)?;

                let files = ScenarioFiles::new(
                    output_dir,
                    grid.gene_count,
                    cell_sample.len(),
                    *freq,
                    grid.index,
                );
                data.write(&files)?;

                info!(
                    "cnv freq {}, {} cells: {}",
                    freq,
                    cell_sample.len(),
                    files.expr
                );
                written.push(files);
            }
        }

        Ok(written)
    }

    /// Sample one synthetic data set
    ///
    /// ```text
    /// μ(g,c) = ρ(g) [cnv(g, k(c)) d(g) + (1 - d(g))] exp(ψ(c)' w(g))
    /// y(:,c) ~ Multinomial(3000, μ(:,c))
    /// ```
    ///
    /// * `gene_ids` - sampled gene rows of the copy number reference
    /// * `cell_sample` - clone column per synthetic cell (repeats allowed)
    /// * `dependency` - 0/1 copy number dependency per sampled gene
    pub fn simulate_individual_data<R: Rng + ?Sized>(
        &self,
        gene_ids: &[usize],
        cell_sample: &[usize],
        dependency: &[u8],
        rng: &mut R,
    ) -> anyhow::Result<ScenarioData> {
        if dependency.len() != gene_ids.len() {
            anyhow::bail!(
                "{} dependency flags for {} genes",
                dependency.len(),
                gene_ids.len()
            );
        }

        let cnv_table = self.clone_cnv();
        let params = self.params();

        let cnv = cnv_table.select_genes(gene_ids)?;

        let clone_ids = cell_sample
            .iter()
            .map(|&k| cnv_table.clone_label(k).map(Box::from))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let genes = gene_ids
            .iter()
            .map(|&g| cnv_table.gene_label(g).map(Box::from))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let rate: Vec<f32> = gene_ids
            .iter()
            .map(|&g| softplus(params.per_copy_expr[g]))
            .collect();

        let w = params.w.select_rows(gene_ids.iter());

        // latent factors of random fitted cells
        let nn = cell_sample.len();
        let n_fit = params.num_cells();
        let psi_rows: Vec<usize> = (0..nn).map(|_| rng.random_range(0..n_fit)).collect();
        let psi = params.psi.select_rows(psi_rows.iter());

        let log_scale = &w * psi.transpose(); // genes x cells

        let seeds: Vec<u64> = (0..nn).map(|_| rng.random()).collect();
        let ng = gene_ids.len();

        let columns = cell_sample
            .par_iter()
            .enumerate()
            .progress_count(nn as u64)
            .map(|(c, &k)| -> anyhow::Result<Vec<u64>> {
                let expected: Vec<f64> = (0..ng)
                    .map(|g| {
                        let d = dependency[g] as f32;
                        let mu = rate[g] * (cnv[(g, k)] as f32) * d + rate[g] * (1. - d);
                        (mu * log_scale[(g, c)].exp()) as f64
                    })
                    .collect();
                let mut rng = StdRng::seed_from_u64(seeds[c]);
                sample_multinomial(SIMULATED_TOTAL_COUNT, &expected, &mut rng)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let expr = DMatrix::<u64>::from_fn(ng, nn, |g, c| columns[c][g]);

        Ok(ScenarioData {
            genes,
            expr,
            dependency: dependency.to_vec(),
            clone_ids,
        })
    }
}
