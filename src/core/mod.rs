mod debt;
mod deductions;
mod input;
mod solver;
mod tax_year;
mod types;

pub use debt::{MAX_SIMULATION_MONTHS, PayoffConfig, simulate_payoff, simulate_payoff_with};
pub use deductions::{compute_deductions, marginal_rate};
pub use input::{coerce_amount, parse_amount, parse_tax_code};
pub use solver::{
    GrossSolveResult, MAX_SOLVER_ITERATIONS, SOLVER_TOLERANCE, SolveIteration,
    solve_gross_from_net, solve_gross_from_net_detailed,
};
pub use tax_year::{
    Band, StudentLoanRates, TaxYearConfig, TaxYearError, supported_tax_years, tax_year,
};
pub use types::{
    Debt, DeductionOptions, DeductionResult, IncomeTax, Location, NationalInsurance, NiBandSlice,
    PaidOffDebt, PayoffResult, PayoffStrategy, PensionContribution, PensionMode, PeriodBreakdown,
    PeriodFigures, StudentLoanPlan, TaxBandSlice,
};
