use crate::common::*;

/// Point estimates of a clone assignment model
///
/// * `per_copy_expr` - per-gene expression rate per copy, before the
///   softplus link (G)
/// * `w` - per-gene covariate weights (G x K)
/// * `psi` - per-cell latent factors of the fitted cells (N x K)
/// * `cells` - names of the fitted cells (N)
#[derive(Debug, Clone, PartialEq)]
pub struct FittedParams {
    pub per_copy_expr: DVec,
    pub w: Mat,
    pub psi: Mat,
    pub cells: Vec<Box<str>>,
}

impl FittedParams {
    pub fn num_genes(&self) -> usize {
        self.per_copy_expr.len()
    }

    pub fn num_latent(&self) -> usize {
        self.w.ncols()
    }

    pub fn num_cells(&self) -> usize {
        self.psi.nrows()
    }

    /// Check that the shapes agree with each other and with `num_genes`
    pub fn validate(&self, num_genes: usize) -> anyhow::Result<()> {
        if self.per_copy_expr.len() != num_genes || self.w.nrows() != num_genes {
            anyhow::bail!(
                "parameters for {} / {} genes, but {} genes in the copy number reference",
                self.per_copy_expr.len(),
                self.w.nrows(),
                num_genes
            );
        }
        if self.w.ncols() != self.psi.ncols() {
            anyhow::bail!(
                "covariate weights have {} columns but latent factors have {}",
                self.w.ncols(),
                self.psi.ncols()
            );
        }
        if self.psi.nrows() == 0 {
            anyhow::bail!("no fitted cells to resample latent factors from");
        }
        if self.cells.len() != self.psi.nrows() {
            anyhow::bail!(
                "{} cell names for {} latent factor rows",
                self.cells.len(),
                self.psi.nrows()
            );
        }
        Ok(())
    }
}

/// `ln(1 + exp(x))`
#[inline]
pub fn softplus(x: f32) -> f32 {
    if x > 20.0 {
        x
    } else {
        x.exp().ln_1p()
    }
}

/// Inverse of `softplus` for `y > 0`
#[inline]
pub fn inv_softplus(y: f32) -> f32 {
    if y > 20.0 {
        y
    } else {
        y.exp_m1().ln()
    }
}
