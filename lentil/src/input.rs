use crate::common::*;
use matrix_util::membership::Membership;
use matrix_util::traits::{IoOps, MatWithNames};

/// Observed data a clone assignment model is fitted on
///
/// * `expr` - genes x cells expression counts
/// * `cnv` - genes x cells copy numbers
/// * `clones` - cell -> clone membership
pub struct CloneAlignInput {
    pub expr: MatWithNames<Mat>,
    pub cnv: MatWithNames<Mat>,
    pub clones: Membership,
}

impl CloneAlignInput {
    pub fn new(
        expr: MatWithNames<Mat>,
        cnv: MatWithNames<Mat>,
        clones: Membership,
    ) -> anyhow::Result<Self> {
        if expr.mat.nrows() == 0 || expr.mat.ncols() == 0 {
            anyhow::bail!("empty expression matrix");
        }
        if cnv.mat.nrows() == 0 || cnv.mat.ncols() == 0 {
            anyhow::bail!("empty copy number matrix");
        }
        if clones.is_empty() {
            anyhow::bail!("empty clone membership");
        }
        Ok(Self { expr, cnv, clones })
    }

    /// Read the three input tables
    ///
    /// * `expr_file` - genes x cells, header line of cell ids, gene id first on each line
    /// * `cnv_file` - genes x cells, same layout
    /// * `clone_file` - header line, then `cell_id` and `clone_id` columns
    pub fn read(expr_file: &str, cnv_file: &str, clone_file: &str) -> anyhow::Result<Self> {
        let expr = Mat::read_named(expr_file)?;
        info!(
            "expression: {} genes x {} cells from {}",
            expr.mat.nrows(),
            expr.mat.ncols(),
            expr_file
        );

        let cnv = Mat::read_named(cnv_file)?;
        info!(
            "copy number: {} genes x {} cells from {}",
            cnv.mat.nrows(),
            cnv.mat.ncols(),
            cnv_file
        );

        let clones = Membership::from_file(clone_file, 0, 1, true)?;
        info!("clones: {:?}", clones.unique_groups());

        let stats = clones.count_matches(&expr.cols);
        if stats.unmatched > 0 {
            warn!(
                "{} of {} expression cells have no clone label",
                stats.unmatched,
                stats.total()
            );
        }

        Self::new(expr, cnv, clones)
    }
}
