use crate::clone_cnv::CloneCnvTable;
use crate::common::*;
use crate::params::FittedParams;

use matrix_util::common_io::{mkdir_all, quote_field, read_lines_of_words_delim, write_lines};
use matrix_util::traits::IoOps;
use std::path::Path;

pub const CLONE_CNV_FILE: &str = "clone_cnv.csv";
pub const PER_COPY_EXPR_FILE: &str = "per_copy_expr.csv";
pub const COVARIATE_WEIGHT_FILE: &str = "w.csv";
pub const LATENT_FACTOR_FILE: &str = "psi.csv";
pub const CLONE_SUMMARY_FILE: &str = "clones.csv";

/// A clone kept by the fit and the number of cells behind it
#[derive(Debug, Clone, PartialEq)]
pub struct CloneSummary {
    pub clone_id: Box<str>,
    pub num_cells: usize,
}

/// Everything a fitter hands over to the simulator
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub params: FittedParams,
    pub clone_cnv: CloneCnvTable,
    pub clones: Vec<CloneSummary>,
}

fn dir_file(dir: &str, name: &str) -> anyhow::Result<Box<str>> {
    Path::new(dir)
        .join(name)
        .to_str()
        .map(|x| x.into())
        .ok_or_else(|| anyhow::anyhow!("invalid path under {}", dir))
}

fn latent_names(kk: usize) -> Vec<Box<str>> {
    (0..kk).map(|k| format!("k{}", k).into_boxed_str()).collect()
}

impl FitOutcome {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.params.validate(self.clone_cnv.num_genes())
    }

    /// Write the fitted parameters and the copy number reference as
    /// CSV files under `dir`
    pub fn write_dir(&self, dir: &str) -> anyhow::Result<()> {
        self.validate()?;
        mkdir_all(dir)?;

        let genes = self.clone_cnv.genes();
        let params = &self.params;

        self.clone_cnv.to_csv(&dir_file(dir, CLONE_CNV_FILE)?)?;

        Mat::from_column_slice(params.num_genes(), 1, params.per_copy_expr.as_slice())
            .to_csv_with_names(
                &dir_file(dir, PER_COPY_EXPR_FILE)?,
                genes,
                &["per_copy_expr".into()],
            )?;

        let kk = latent_names(params.num_latent());
        params
            .w
            .to_csv_with_names(&dir_file(dir, COVARIATE_WEIGHT_FILE)?, genes, &kk)?;
        params
            .psi
            .to_csv_with_names(&dir_file(dir, LATENT_FACTOR_FILE)?, &params.cells, &kk)?;

        let mut lines: Vec<Box<str>> = vec!["clone_id,num_cells".into()];
        lines.extend(
            self.clones
                .iter()
                .map(|c| format!("{},{}", quote_field(&c.clone_id), c.num_cells).into_boxed_str()),
        );
        write_lines(&lines, &dir_file(dir, CLONE_SUMMARY_FILE)?)?;

        info!("wrote fitted parameters under {}", dir);
        Ok(())
    }

    /// Read what `write_dir` wrote
    pub fn read_dir(dir: &str) -> anyhow::Result<Self> {
        let clone_cnv = CloneCnvTable::from_csv(&dir_file(dir, CLONE_CNV_FILE)?)?;

        let per_copy = Mat::read_named(&dir_file(dir, PER_COPY_EXPR_FILE)?)?;
        if per_copy.mat.ncols() != 1 {
            anyhow::bail!("expected a single column of per-copy expression");
        }
        if per_copy.rows.as_slice() != clone_cnv.genes() {
            anyhow::bail!("per-copy expression genes don't match the copy number reference");
        }

        let w = Mat::read_named(&dir_file(dir, COVARIATE_WEIGHT_FILE)?)?;
        if w.rows.as_slice() != clone_cnv.genes() {
            anyhow::bail!("covariate weight genes don't match the copy number reference");
        }

        let psi = Mat::read_named(&dir_file(dir, LATENT_FACTOR_FILE)?)?;

        let clone_lines =
            read_lines_of_words_delim(&dir_file(dir, CLONE_SUMMARY_FILE)?, ",", 0)?.lines;
        let clones = clone_lines
            .into_iter()
            .map(|words| -> anyhow::Result<CloneSummary> {
                if words.len() < 2 {
                    anyhow::bail!("malformed clone summary line");
                }
                Ok(CloneSummary {
                    clone_id: words[0].clone(),
                    num_cells: words[1].parse()?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let ret = Self {
            params: FittedParams {
                per_copy_expr: DVec::from_column_slice(per_copy.mat.as_slice()),
                w: w.mat,
                psi: psi.mat,
                cells: psi.rows,
            },
            clone_cnv,
            clones,
        };
        ret.validate()?;

        info!(
            "read fitted parameters: {} genes, {} clones, {} cells, {} latent factors",
            ret.clone_cnv.num_genes(),
            ret.clone_cnv.num_clones(),
            ret.params.num_cells(),
            ret.params.num_latent()
        );
        Ok(ret)
    }
}
