use rand::Rng;

/// Scenario grid of one simulation run
///
/// * `index` - run index, only used in output file names
/// * `gene_count` - number of genes sampled (without replacement)
/// * `cell_counts` - nested cell-count tiers
/// * `cnv_dependency_freqs` - fractions of copy-number dependent genes
#[derive(Debug, Clone)]
pub struct ScenarioGrid {
    pub index: usize,
    pub gene_count: usize,
    pub cell_counts: Vec<usize>,
    pub cnv_dependency_freqs: Vec<f64>,
}

impl Default for ScenarioGrid {
    fn default() -> Self {
        Self {
            index: 1,
            gene_count: 500,
            cell_counts: vec![100, 1000, 5000],
            cnv_dependency_freqs: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0],
        }
    }
}

impl ScenarioGrid {
    /// Sort cell counts and dependency frequencies in place
    pub fn sort(&mut self) {
        self.cell_counts.sort_unstable();
        self.cnv_dependency_freqs.sort_by(|a, b| a.total_cmp(b));
    }

    pub fn num_scenarios(&self) -> usize {
        self.cell_counts.len() * self.cnv_dependency_freqs.len()
    }
}

/// Index samples shared by every scenario of a run
///
/// * `cell_tiers` - clone column index per synthetic cell, one list per
///   tier; each tier extends the previous one
/// * `gene_ids` - sampled gene rows
/// * `dependency` - `(freq, 0/1 flag per sampled gene)`
#[derive(Debug, Clone)]
pub struct SamplingPlan {
    pub cell_tiers: Vec<Vec<usize>>,
    pub gene_ids: Vec<usize>,
    pub dependency: Vec<(f64, Vec<u8>)>,
}

impl SamplingPlan {
    /// Sort the grid in place, then draw the cell tiers and the gene
    /// sample
    ///
    /// * `num_genes` - genes available in the copy number reference
    /// * `num_clones` - clones available in the copy number reference
    pub fn draw<R: Rng + ?Sized>(
        grid: &mut ScenarioGrid,
        num_genes: usize,
        num_clones: usize,
        rng: &mut R,
    ) -> anyhow::Result<Self> {
        grid.sort();

        if grid.cell_counts.is_empty() {
            anyhow::bail!("no cell counts");
        }
        if grid.cnv_dependency_freqs.is_empty() {
            anyhow::bail!("no copy number dependency frequencies");
        }

        let cell_tiers = nested_cell_samples(&grid.cell_counts, num_clones, rng)?;
        let gene_ids = sample_genes(num_genes, grid.gene_count, rng)?;

        let dependency = grid
            .cnv_dependency_freqs
            .iter()
            .map(|&f| Ok((f, dependency_indicator(grid.gene_count, f)?)))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            cell_tiers,
            gene_ids,
            dependency,
        })
    }
}

/// Draw clone column indices uniformly with replacement for nested
/// tiers. Only the increment of each tier is drawn and appended to a
/// copy of the previous tier, so tier `i - 1` is a prefix of tier `i`.
///
/// * `cell_counts` - sorted tier sizes
/// * `num_clones` - number of clone columns to choose from
pub fn nested_cell_samples<R: Rng + ?Sized>(
    cell_counts: &[usize],
    num_clones: usize,
    rng: &mut R,
) -> anyhow::Result<Vec<Vec<usize>>> {
    if num_clones == 0 {
        anyhow::bail!("no clones to sample cells from");
    }

    let mut tiers: Vec<Vec<usize>> = Vec::with_capacity(cell_counts.len());
    let mut prev = 0;

    for &count in cell_counts {
        if count < prev {
            anyhow::bail!("cell counts must be sorted: {} after {}", count, prev);
        }
        let mut tier = tiers.last().cloned().unwrap_or_default();
        tier.extend((prev..count).map(|_| rng.random_range(0..num_clones)));
        tiers.push(tier);
        prev = count;
    }

    Ok(tiers)
}

/// Sample `gene_count` distinct gene rows out of `num_genes`
pub fn sample_genes<R: Rng + ?Sized>(
    num_genes: usize,
    gene_count: usize,
    rng: &mut R,
) -> anyhow::Result<Vec<usize>> {
    if gene_count > num_genes {
        anyhow::bail!(
            "gene count {} out of range: only {} genes in the reference",
            gene_count,
            num_genes
        );
    }
    if gene_count == 0 {
        anyhow::bail!("gene count must be positive");
    }
    Ok(rand::seq::index::sample(rng, num_genes, gene_count).into_vec())
}

/// `1` for the first `floor(gene_count * freq)` genes, `0` for the rest
pub fn dependency_indicator(gene_count: usize, freq: f64) -> anyhow::Result<Vec<u8>> {
    if !freq.is_finite() || !(0.0..=1.0).contains(&freq) {
        anyhow::bail!("dependency frequency {} not in [0, 1]", freq);
    }
    let n_dep = ((gene_count as f64) * freq).floor() as usize;
    let n_dep = n_dep.min(gene_count);
    Ok((0..gene_count).map(|g| u8::from(g < n_dep)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn tiers_are_nested_prefixes() -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(3);
        let tiers = nested_cell_samples(&[2, 5, 5, 9], 4, &mut rng)?;
        assert_eq!(
            tiers.iter().map(|t| t.len()).collect::<Vec<_>>(),
            vec![2, 5, 5, 9]
        );
        for i in 1..tiers.len() {
            assert_eq!(&tiers[i][..tiers[i - 1].len()], tiers[i - 1].as_slice());
        }
        assert!(tiers.iter().flatten().all(|&j| j < 4));
        Ok(())
    }

    #[test]
    fn unsorted_tiers_are_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(nested_cell_samples(&[5, 2], 4, &mut rng).is_err());
        assert!(nested_cell_samples(&[5], 0, &mut rng).is_err());
    }

    #[test]
    fn genes_are_distinct() -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(11);
        let mut genes = sample_genes(50, 50, &mut rng)?;
        genes.sort_unstable();
        assert_eq!(genes, (0..50).collect::<Vec<_>>());
        assert!(sample_genes(50, 51, &mut rng).is_err());
        Ok(())
    }

    #[test]
    fn dependency_split_point() -> anyhow::Result<()> {
        assert_eq!(dependency_indicator(4, 0.5)?, vec![1, 1, 0, 0]);
        assert_eq!(dependency_indicator(10, 0.3)?.iter().sum::<u8>(), 3);
        assert_eq!(dependency_indicator(10, 0.7)?.iter().sum::<u8>(), 7);
        assert_eq!(dependency_indicator(3, 1.0)?, vec![1, 1, 1]);
        assert_eq!(dependency_indicator(3, 0.0)?, vec![0, 0, 0]);
        assert_eq!(dependency_indicator(7, 0.5)?, vec![1, 1, 1, 0, 0, 0, 0]);
        assert!(dependency_indicator(3, 1.5).is_err());
        assert!(dependency_indicator(3, f64::NAN).is_err());
        Ok(())
    }

    #[test]
    fn plan_sorts_grid_in_place() -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(5);
        let mut grid = ScenarioGrid {
            index: 1,
            gene_count: 4,
            cell_counts: vec![5, 2],
            cnv_dependency_freqs: vec![1.0, 0.5],
        };
        let plan = SamplingPlan::draw(&mut grid, 10, 3, &mut rng)?;
        assert_eq!(grid.cell_counts, vec![2, 5]);
        assert_eq!(grid.cnv_dependency_freqs, vec![0.5, 1.0]);
        assert_eq!(plan.gene_ids.len(), 4);
        assert_eq!(plan.dependency[0], (0.5, vec![1, 1, 0, 0]));
        assert_eq!(plan.dependency[1], (1.0, vec![1, 1, 1, 1]));
        assert_eq!(plan.cell_tiers[1].len(), 5);
        Ok(())
    }
}
