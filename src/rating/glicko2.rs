use std::f64::consts::PI;

use super::types::{Outcome, Rating};
use super::volatility::{solve_volatility, SearchSettings, VolatilityInputs};
use crate::config::RatingSettings;
use crate::errors::RatingError;

/// Conversion factor between the public scale and the Glicko-2 scale (400 / ln 10)
pub const SCALE: f64 = 173.7178;
const CENTER: f64 = 1500.0;

fn to_mu(rating: f64) -> f64 {
    (rating - CENTER) / SCALE
}

fn to_phi(deviation: f64) -> f64 {
    deviation / SCALE
}

/// Weight that shrinks an opponent's influence as their deviation grows
pub fn g(phi: f64) -> f64 {
    1.0 / (1.0 + 3.0 * phi * phi / (PI * PI)).sqrt()
}

/// Expected score against an opponent
pub fn expected_score(mu: f64, opponent_mu: f64, opponent_phi: f64) -> f64 {
    1.0 / (1.0 + (-g(opponent_phi) * (mu - opponent_mu)).exp())
}

/// Rate one player for one period.
///
/// Every outcome must be built from the opponents' pre-period ratings.
/// Deviations and volatilities that are not strictly positive are rejected.
pub fn update_rating(
    prior: &Rating,
    outcomes: &[Outcome],
    settings: &RatingSettings,
) -> Result<Rating, RatingError> {
    prior.validate()?;
    for outcome in outcomes {
        outcome.validate()?;
    }

    let phi = to_phi(prior.deviation);
    let sigma = prior.volatility;

    if outcomes.is_empty() {
        let inflated = (phi * phi + sigma * sigma).sqrt();
        return Ok(Rating {
            rating: prior.rating,
            deviation: inflated * SCALE,
            volatility: sigma,
        });
    }

    let mu = to_mu(prior.rating);
    let (information, score_sum) = accumulate(mu, outcomes);
    let variance = 1.0 / information;
    let improvement = variance * score_sum;

    let new_sigma = solve_volatility(
        &VolatilityInputs {
            deviation: phi,
            volatility: sigma,
            variance,
            improvement,
        },
        &SearchSettings {
            tau: settings.tau,
            tolerance: settings.convergence_tolerance,
            max_iterations: settings.max_iterations,
        },
    )?;

    let phi_star = (phi * phi + new_sigma * new_sigma).sqrt();
    let new_phi = 1.0 / (1.0 / (phi_star * phi_star) + 1.0 / variance).sqrt();
    let new_mu = mu + new_phi * new_phi * score_sum;

    Ok(Rating {
        rating: new_mu * SCALE + CENTER,
        deviation: (new_phi * SCALE).max(settings.min_deviation),
        volatility: new_sigma,
    })
}

// Returns (Σ g²E(1-E), Σ g(s-E))
fn accumulate(mu: f64, outcomes: &[Outcome]) -> (f64, f64) {
    outcomes.iter().fold((0.0, 0.0), |(information, score_sum), outcome| {
        let opponent_mu = to_mu(outcome.opponent_rating);
        let opponent_phi = to_phi(outcome.opponent_deviation);
        let weight = g(opponent_phi);
        let expected = expected_score(mu, opponent_mu, opponent_phi);

        (
            information + weight * weight * expected * (1.0 - expected),
            score_sum + weight * (outcome.result.score() - expected),
        )
    })
}
