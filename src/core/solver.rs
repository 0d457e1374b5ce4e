use log::debug;

use super::deductions::compute_deductions;
use super::input::coerce_amount;
use super::tax_year::TaxYearConfig;
use super::types::DeductionOptions;

pub const MAX_SOLVER_ITERATIONS: u32 = 50;
pub const SOLVER_TOLERANCE: f64 = 0.01;

const SEARCH_LOW_FACTOR: f64 = 1.0;
const SEARCH_HIGH_FACTOR: f64 = 2.5;
const INITIAL_GUESS_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveIteration {
    pub iteration: u32,
    pub low: f64,
    pub high: f64,
    pub guess: f64,
    pub take_home: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrossSolveResult {
    pub target_net_annual: f64,
    pub gross_annual: f64,
    pub converged: bool,
    /// Take-home at `gross_annual` minus the target.
    pub residual: f64,
    pub iterations: Vec<SolveIteration>,
}

pub fn solve_gross_from_net(
    target_net_annual: f64,
    options: &DeductionOptions,
    year: &TaxYearConfig,
) -> f64 {
    solve_gross_from_net_detailed(target_net_annual, options, year).gross_annual
}

/// Bisects gross income until take-home is within [`SOLVER_TOLERANCE`] of the
/// target. Returns the last guess if [`MAX_SOLVER_ITERATIONS`] run out.
pub fn solve_gross_from_net_detailed(
    target_net_annual: f64,
    options: &DeductionOptions,
    year: &TaxYearConfig,
) -> GrossSolveResult {
    let target = coerce_amount(target_net_annual);

    let mut low = target * SEARCH_LOW_FACTOR;
    let mut high = target * SEARCH_HIGH_FACTOR;
    let mut guess = target * INITIAL_GUESS_FACTOR;
    let mut iterations = Vec::with_capacity(MAX_SOLVER_ITERATIONS as usize);

    for iteration in 1..=MAX_SOLVER_ITERATIONS {
        let take_home = compute_deductions(guess, options, year).take_home_annual;
        iterations.push(SolveIteration {
            iteration,
            low,
            high,
            guess,
            take_home,
        });

        let diff = take_home - target;
        if within_tolerance(diff) {
            return GrossSolveResult {
                target_net_annual: target,
                gross_annual: guess,
                converged: true,
                residual: diff,
                iterations,
            };
        }

        if diff < 0.0 {
            low = guess;
        } else {
            high = guess;
        }
        guess = (low + high) * 0.5;
    }

    let residual = compute_deductions(guess, options, year).take_home_annual - target;
    debug!(
        "net-to-gross search for {target:.2} stopped after {MAX_SOLVER_ITERATIONS} iterations at {guess:.2}, residual {residual:.4} ({})",
        year.key
    );
    GrossSolveResult {
        target_net_annual: target,
        gross_annual: guess,
        converged: false,
        residual,
        iterations,
    }
}

fn within_tolerance(diff: f64) -> bool {
    diff.abs() <= SOLVER_TOLERANCE
}
