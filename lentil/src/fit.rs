use crate::clone_cnv::CloneCnvTable;
use crate::common::*;
use crate::fit_outcome::{CloneSummary, FitOutcome};
use crate::input::CloneAlignInput;
use crate::params::{inv_softplus, FittedParams};

use fnv::FnvHashMap as HashMap;
use nalgebra::DMatrix;
use std::collections::BTreeMap;

/// Anything that turns observed expression, copy number, and clone
/// labels into model point estimates
pub trait CloneModelFit {
    fn fit(&self, input: &CloneAlignInput) -> anyhow::Result<FitOutcome>;
}

/// Fixed hyperparameters of the point estimator
///
/// * `normalize_cnv` - divide copy numbers by the clone's mean ploidy
///   when estimating per-copy rates
/// * `cnv_cutoff` - copy numbers above this are clipped
/// * `min_clone_cell_count` - clones with fewer cells are dropped
/// * `num_latent` - number of latent covariate factors (K)
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub normalize_cnv: bool,
    pub cnv_cutoff: u32,
    pub min_clone_cell_count: usize,
    pub num_latent: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            normalize_cnv: true,
            cnv_cutoff: 10,
            min_clone_cell_count: 20,
            num_latent: 1,
        }
    }
}

/// Closed-form point estimates of the clone expression model
///
/// ```text
/// E[y(g,c)] ∝ softplus(ρ(g)) * cnv(g, clone(c)) * exp(ψ(c)' w(g))
/// ```
///
/// 1. clone copy number = rounded median over the clone's cells
/// 2. ρ(g) = inverse softplus of the library-size normalized mean
///    expression per copy
/// 3. ψ, w = rank-K SVD of the centred log residuals
pub struct PointEstimateFitter {
    config: FitConfig,
}

impl PointEstimateFitter {
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }
}

impl Default for PointEstimateFitter {
    fn default() -> Self {
        Self::new(FitConfig::default())
    }
}

/// A cell seen in all three input tables
struct AlignedCell {
    expr_col: usize,
    cnv_col: usize,
    name: Box<str>,
}

const RATE_EPS: f32 = 1e-4;

fn position_map(names: &[Box<str>]) -> HashMap<&str, usize> {
    names
        .iter()
        .enumerate()
        .map(|(i, x)| (x.as_ref(), i))
        .collect()
}

/// Rounded median of the valid (finite, non-negative) copy numbers,
/// clipped at `cutoff`; 0 if nothing is valid
fn clipped_median(values: impl Iterator<Item = f32>, cutoff: u32) -> u32 {
    let cutoff = cutoff as f32;
    let mut xx: Vec<f32> = values
        .filter(|x| x.is_finite() && *x >= 0.)
        .map(|x| x.min(cutoff))
        .collect();

    if xx.is_empty() {
        return 0;
    }

    xx.sort_by(|a, b| a.total_cmp(b));
    let n = xx.len();
    let med = if n % 2 == 1 {
        xx[n / 2]
    } else {
        0.5 * (xx[n / 2 - 1] + xx[n / 2])
    };
    med.round() as u32
}

impl CloneModelFit for PointEstimateFitter {
    fn fit(&self, input: &CloneAlignInput) -> anyhow::Result<FitOutcome> {
        let config = &self.config;
        let expr = &input.expr;
        let cnv = &input.cnv;

        // 1. genes and cells shared by the tables
        let cnv_gene_pos = position_map(&cnv.rows);
        let genes: Vec<(usize, usize)> = expr
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, g)| cnv_gene_pos.get(g.as_ref()).map(|&j| (i, j)))
            .collect();

        if genes.is_empty() {
            anyhow::bail!("no shared genes between expression and copy number data");
        }

        let cnv_cell_pos = position_map(&cnv.cols);
        let mut clone_cells: BTreeMap<Box<str>, Vec<AlignedCell>> = BTreeMap::new();
        for (expr_col, name) in expr.cols.iter().enumerate() {
            if let (Some(&cnv_col), Some(clone)) = (
                cnv_cell_pos.get(name.as_ref()),
                input.clones.get(name.as_ref()),
            ) {
                clone_cells.entry(clone.into()).or_default().push(AlignedCell {
                    expr_col,
                    cnv_col,
                    name: name.clone(),
                });
            }
        }

        if clone_cells.is_empty() {
            anyhow::bail!("no cells shared by expression, copy number, and clone tables");
        }

        info!(
            "{} shared genes, {} shared cells in {} clones",
            genes.len(),
            clone_cells.values().map(|x| x.len()).sum::<usize>(),
            clone_cells.len()
        );

        // 2. clones with enough cells
        let (kept, dropped): (Vec<_>, Vec<_>) = clone_cells
            .into_iter()
            .partition(|(_, cells)| cells.len() >= config.min_clone_cell_count);

        for (clone, cells) in dropped.iter() {
            warn!(
                "dropping clone {} with {} cells (< {})",
                clone,
                cells.len(),
                config.min_clone_cell_count
            );
        }

        if kept.is_empty() {
            anyhow::bail!(
                "no clone has at least {} cells",
                config.min_clone_cell_count
            );
        }

        let num_clones = kept.len();

        // 3. clone-level copy number reference
        let ref_all = DMatrix::<u32>::from_fn(genes.len(), num_clones, |g, k| {
            let cnv_row = genes[g].1;
            clipped_median(
                kept[k].1.iter().map(|c| cnv.mat[(cnv_row, c.cnv_col)]),
                config.cnv_cutoff,
            )
        });

        let informative: Vec<usize> = (0..genes.len())
            .filter(|&g| {
                let row = ref_all.row(g);
                num_clones == 1 || row.iter().any(|&x| x != row[0])
            })
            .collect();

        if informative.is_empty() {
            anyhow::bail!("copy number is identical across clones for every gene");
        }

        if informative.len() < genes.len() {
            info!(
                "dropped {} genes without copy number difference between clones",
                genes.len() - informative.len()
            );
        }

        let ref_cnv = ref_all.select_rows(informative.iter());
        let gene_names: Vec<Box<str>> = informative
            .iter()
            .map(|&g| expr.rows[genes[g].0].clone())
            .collect();
        let clone_names: Vec<Box<str>> = kept.iter().map(|(k, _)| k.clone()).collect();

        // 4. per-copy expression rates
        let cells: Vec<(usize, &AlignedCell)> = kept
            .iter()
            .enumerate()
            .flat_map(|(k, (_, cc))| cc.iter().map(move |c| (k, c)))
            .collect();

        let ng = informative.len();
        let nc = cells.len();

        let yy = Mat::from_fn(ng, nc, |g, c| {
            let x = expr.mat[(genes[informative[g]].0, cells[c].1.expr_col)];
            if x.is_finite() {
                x.max(0.)
            } else {
                0.
            }
        });

        let lib_size: Vec<f32> = yy.column_iter().map(|y| y.sum()).collect();
        let lib_mean = lib_size.iter().sum::<f32>() / (nc as f32);
        if lib_mean <= 0. {
            anyhow::bail!("no expression counts in the shared genes and cells");
        }

        let yy_norm = Mat::from_fn(ng, nc, |g, c| {
            yy[(g, c)] * lib_mean / lib_size[c].max(1.)
        });

        let ploidy: Vec<f32> = (0..num_clones)
            .map(|k| {
                if config.normalize_cnv {
                    let m = ref_cnv.column(k).iter().map(|&x| x as f32).sum::<f32>() / (ng as f32);
                    m.max(RATE_EPS)
                } else {
                    1.
                }
            })
            .collect();

        let cnv_gc = Mat::from_fn(ng, nc, |g, c| {
            let k = cells[c].0;
            ref_cnv[(g, k)] as f32 / ploidy[k]
        });

        let rate: Vec<f32> = (0..ng)
            .map(|g| {
                let mean_y = yy_norm.row(g).mean();
                let mean_cnv = cnv_gc.row(g).mean();
                (mean_y / mean_cnv.max(RATE_EPS)).max(RATE_EPS)
            })
            .collect();

        // 5. latent covariates from the log residuals (cells x genes)
        let mut resid = Mat::from_fn(nc, ng, |c, g| {
            yy_norm[(g, c)].ln_1p() - (rate[g] * cnv_gc[(g, c)]).ln_1p()
        });
        for mut col in resid.column_iter_mut() {
            let mu = col.mean();
            col.add_scalar_mut(-mu);
        }

        let (psi, w) = truncated_svd_factors(&resid, config.num_latent)?;

        let params = FittedParams {
            per_copy_expr: DVec::from_iterator(ng, rate.iter().map(|&r| inv_softplus(r))),
            w,
            psi,
            cells: cells.iter().map(|(_, c)| c.name.clone()).collect(),
        };

        let clones = kept
            .iter()
            .map(|(k, cc)| CloneSummary {
                clone_id: k.clone(),
                num_cells: cc.len(),
            })
            .collect();

        let ret = FitOutcome {
            params,
            clone_cnv: CloneCnvTable::new(gene_names, clone_names, ref_cnv)?,
            clones,
        };
        ret.validate()?;

        info!(
            "fitted {} genes x {} clones on {} cells with {} latent factors",
            ng,
            num_clones,
            nc,
            ret.params.num_latent()
        );

        Ok(ret)
    }
}

/// `xx ≈ (U √S) (V √S)'` with the top `rank` singular values
///
/// Returns `(U √S, V √S)`
fn truncated_svd_factors(xx: &Mat, rank: usize) -> anyhow::Result<(Mat, Mat)> {
    let (nr, nc) = (xx.nrows(), xx.ncols());
    let rank = rank.min(nr).min(nc);

    if rank == 0 {
        return Ok((Mat::zeros(nr, 0), Mat::zeros(nc, 0)));
    }

    let svd = xx.clone().svd(true, true);

    let (Some(uu), Some(vt)) = (svd.u, svd.v_t) else {
        anyhow::bail!("SVD failed");
    };

    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&a, &b| svd.singular_values[b].total_cmp(&svd.singular_values[a]));

    let mut left = Mat::zeros(nr, rank);
    let mut right = Mat::zeros(nc, rank);

    for (k, &j) in order.iter().take(rank).enumerate() {
        let s = svd.singular_values[j].max(0.).sqrt();
        left.column_mut(k).copy_from(&(uu.column(j) * s));
        right.column_mut(k).copy_from(&(vt.row(j).transpose() * s));
    }

    Ok((left, right))
}
