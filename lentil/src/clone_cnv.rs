use matrix_util::traits::IoOps;
use nalgebra::DMatrix;

/// Clone-level copy number reference: genes x clones.
///
/// Column `j` of `cnv` belongs to the clone labelled `clones[j]`;
/// sampled column indices are turned back into clone ids through
/// `clone_label`.
#[derive(Debug, Clone, PartialEq)]
pub struct CloneCnvTable {
    genes: Vec<Box<str>>,
    clones: Vec<Box<str>>,
    cnv: DMatrix<u32>,
}

impl CloneCnvTable {
    pub fn new(
        genes: Vec<Box<str>>,
        clones: Vec<Box<str>>,
        cnv: DMatrix<u32>,
    ) -> anyhow::Result<Self> {
        if genes.len() != cnv.nrows() || clones.len() != cnv.ncols() {
            anyhow::bail!(
                "{} genes and {} clones for a {} x {} copy number table",
                genes.len(),
                clones.len(),
                cnv.nrows(),
                cnv.ncols()
            );
        }
        Ok(Self { genes, clones, cnv })
    }

    pub fn num_genes(&self) -> usize {
        self.cnv.nrows()
    }

    pub fn num_clones(&self) -> usize {
        self.cnv.ncols()
    }

    pub fn genes(&self) -> &[Box<str>] {
        &self.genes
    }

    pub fn clones(&self) -> &[Box<str>] {
        &self.clones
    }

    pub fn cnv(&self) -> &DMatrix<u32> {
        &self.cnv
    }

    pub fn gene_label(&self, gene: usize) -> anyhow::Result<&str> {
        self.genes
            .get(gene)
            .map(|x| x.as_ref())
            .ok_or_else(|| anyhow::anyhow!("gene index {} out of range ({})", gene, self.num_genes()))
    }

    pub fn clone_label(&self, clone: usize) -> anyhow::Result<&str> {
        self.clones.get(clone).map(|x| x.as_ref()).ok_or_else(|| {
            anyhow::anyhow!("clone index {} out of range ({})", clone, self.num_clones())
        })
    }

    /// Copy number rows of the selected genes, in the given order
    pub fn select_genes(&self, gene_ids: &[usize]) -> anyhow::Result<DMatrix<u32>> {
        if let Some(&g) = gene_ids.iter().find(|&&g| g >= self.num_genes()) {
            anyhow::bail!("gene index {} out of range ({})", g, self.num_genes());
        }
        Ok(self.cnv.select_rows(gene_ids.iter()))
    }

    pub fn to_csv(&self, file: &str) -> anyhow::Result<()> {
        self.cnv.to_csv_with_names(file, &self.genes, &self.clones)
    }

    pub fn from_csv(file: &str) -> anyhow::Result<Self> {
        let read = DMatrix::<u32>::read_named(file)?;
        Self::new(read.rows, read.cols, read.mat)
    }
}
