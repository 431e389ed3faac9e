use crate::errors::RatingError;

/// Quantities from one rating period that determine the new volatility,
/// all on the Glicko-2 internal scale
#[derive(Debug, Clone, Copy)]
pub struct VolatilityInputs {
    pub deviation: f64,
    pub volatility: f64,
    pub variance: f64,
    pub improvement: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    pub tau: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

/// New volatility via the Illinois (regula falsi) search over x = ln(σ²).
///
/// Bracketing and the search loop are both bounded by `max_iterations`.
pub fn solve_volatility(
    inputs: &VolatilityInputs,
    search: &SearchSettings,
) -> Result<f64, RatingError> {
    let phi_sq = inputs.deviation * inputs.deviation;
    let delta_sq = inputs.improvement * inputs.improvement;
    let v = inputs.variance;
    let tau = search.tau;
    let a = (inputs.volatility * inputs.volatility).ln();

    let f = |x: f64| {
        let ex = x.exp();
        let denom = phi_sq + v + ex;
        ex * (delta_sq - phi_sq - v - ex) / (2.0 * denom * denom) - (x - a) / (tau * tau)
    };

    let mut lower = a;
    let mut upper = initial_upper_bound(a, delta_sq, phi_sq, v, tau, &f, search.max_iterations)?;
    let mut f_lower = f(lower);
    let mut f_upper = f(upper);

    let mut iterations = 0;
    while (upper - lower).abs() > search.tolerance {
        iterations += 1;
        if iterations > search.max_iterations {
            return Err(RatingError::VolatilityDidNotConverge(search.max_iterations));
        }

        let candidate = lower + (lower - upper) * f_lower / (f_upper - f_lower);
        let f_candidate = f(candidate);

        if f_candidate * f_upper <= 0.0 {
            lower = upper;
            f_lower = f_upper;
        } else {
            f_lower /= 2.0;
        }

        upper = candidate;
        f_upper = f_candidate;
    }

    Ok((lower / 2.0).exp())
}

fn initial_upper_bound(
    a: f64,
    delta_sq: f64,
    phi_sq: f64,
    v: f64,
    tau: f64,
    f: &impl Fn(f64) -> f64,
    max_iterations: usize,
) -> Result<f64, RatingError> {
    if delta_sq > phi_sq + v {
        return Ok((delta_sq - phi_sq - v).ln());
    }

    let mut k = 1.0;
    for _ in 0..max_iterations {
        let candidate = a - k * tau;
        if f(candidate) >= 0.0 {
            return Ok(candidate);
        }
        k += 1.0;
    }
    Err(RatingError::VolatilityDidNotConverge(max_iterations))
}
