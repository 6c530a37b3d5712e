use rand::Rng;
use rand_distr::{Binomial, Distribution};

/// Draw one multinomial vector by the conditional binomial method
///
/// ```text
/// x(k) | x(1..k-1) ~ Binomial(n - sum x(1..k-1), w(k) / sum w(k..K))
/// ```
///
/// * `total` - number of trials
/// * `weights` - un-normalized category probabilities
///
/// The draw always sums to `total`.
pub fn sample_multinomial<R: Rng + ?Sized>(
    total: u64,
    weights: &[f64],
    rng: &mut R,
) -> anyhow::Result<Vec<u64>> {
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.) {
        anyhow::bail!("invalid multinomial weight: {}", w);
    }

    let mut remaining_w: f64 = weights.iter().sum();
    if remaining_w <= 0. {
        anyhow::bail!("multinomial weights sum to zero");
    }

    // the remaining count goes here
    let last = weights
        .iter()
        .rposition(|&w| w > 0.)
        .ok_or_else(|| anyhow::anyhow!("no positive multinomial weight"))?;

    let mut ret = vec![0_u64; weights.len()];
    let mut remaining_n = total;

    for (k, &w_k) in weights.iter().enumerate() {
        if remaining_n == 0 {
            break;
        }
        if k == last {
            ret[k] = remaining_n;
            break;
        }
        if w_k <= 0. {
            continue;
        }
        let p_k = if remaining_w > 0. {
            (w_k / remaining_w).clamp(0., 1.)
        } else {
            1.
        };
        let x_k = Binomial::new(remaining_n, p_k)?.sample(rng);
        ret[k] = x_k;
        remaining_n -= x_k;
        remaining_w -= w_k;
    }

    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn draws_sum_to_total() -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let weights = vec![0.5, 0.0, 2.0, 10.0, 0.25];
        for _ in 0..50 {
            let x = sample_multinomial(3000, &weights, &mut rng)?;
            assert_eq!(x.iter().sum::<u64>(), 3000);
            assert_eq!(x[1], 0);
        }
        Ok(())
    }

    #[test]
    fn trailing_zero_weights_get_nothing() -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(1);
        let x = sample_multinomial(100, &[1.0, 1.0, 0.0, 0.0], &mut rng)?;
        assert_eq!(x[0] + x[1], 100);
        assert_eq!(x[2] + x[3], 0);
        Ok(())
    }

    #[test]
    fn proportions_follow_weights() -> anyhow::Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let x = sample_multinomial(1_000_000, &[1.0, 3.0], &mut rng)?;
        let p0 = x[0] as f64 / 1e6;
        approx::assert_abs_diff_eq!(p0, 0.25, epsilon = 0.01);
        Ok(())
    }

    #[test]
    fn rejects_bad_weights() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_multinomial(10, &[], &mut rng).is_err());
        assert!(sample_multinomial(10, &[0.0, 0.0], &mut rng).is_err());
        assert!(sample_multinomial(10, &[1.0, -1.0], &mut rng).is_err());
        assert!(sample_multinomial(10, &[1.0, f64::NAN], &mut rng).is_err());
    }
}
