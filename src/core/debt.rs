use std::cmp::Ordering;

use log::debug;

use super::input::coerce_amount;
use super::types::{Debt, PaidOffDebt, PayoffResult, PayoffStrategy};

/// Fifty years. Minimum payments below accruing interest never terminate.
pub const MAX_SIMULATION_MONTHS: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoffConfig {
    pub strategy: PayoffStrategy,
    pub extra_monthly_payment: f64,
    /// Roll a cleared debt's minimum payment into the extra-payment pool.
    pub reallocate_freed_minimums: bool,
    pub month_cap: u32,
}

impl PayoffConfig {
    pub fn new(strategy: PayoffStrategy, extra_monthly_payment: f64) -> Self {
        Self {
            strategy,
            extra_monthly_payment,
            reallocate_freed_minimums: true,
            month_cap: MAX_SIMULATION_MONTHS,
        }
    }
}

#[derive(Debug, Clone)]
struct LiveDebt {
    name: String,
    balance: f64,
    apr: f64,
    minimum_payment: f64,
    original_balance: f64,
    paid_off: bool,
}

impl LiveDebt {
    fn from_input(debt: &Debt) -> Self {
        let balance = coerce_amount(debt.balance);
        Self {
            name: debt.name.clone(),
            balance,
            apr: coerce_amount(debt.apr),
            minimum_payment: coerce_amount(debt.minimum_payment),
            original_balance: balance,
            paid_off: false,
        }
    }
}

#[derive(Debug)]
struct SimulationRun {
    months: u32,
    interest_paid: f64,
    payoff_order: Vec<PaidOffDebt>,
    remaining_balance: f64,
}

pub fn simulate_payoff(
    debts: &[Debt],
    strategy: PayoffStrategy,
    extra_monthly_payment: f64,
) -> PayoffResult {
    simulate_payoff_with(debts, &PayoffConfig::new(strategy, extra_monthly_payment))
}

pub fn simulate_payoff_with(debts: &[Debt], config: &PayoffConfig) -> PayoffResult {
    let live: Vec<LiveDebt> = debts
        .iter()
        .map(LiveDebt::from_input)
        .filter(|debt| debt.balance > 0.0)
        .collect();
    if live.is_empty() {
        return PayoffResult::default();
    }

    let extra = coerce_amount(config.extra_monthly_payment);
    let total_balance = live.iter().map(|d| d.balance).sum();
    let total_monthly_payment = live.iter().map(|d| d.minimum_payment).sum::<f64>() + extra;

    let run = run_simulation(live.clone(), config, extra);
    let baseline = run_simulation(live, config, 0.0);
    let interest_savings = (baseline.interest_paid - run.interest_paid).max(0.0);

    let hit_month_cap = run.remaining_balance > 0.0;
    if hit_month_cap {
        debug!(
            "payoff simulation hit the {} month cap with {:.2} outstanding",
            config.month_cap, run.remaining_balance
        );
    }

    PayoffResult {
        total_months: run.months,
        total_interest_paid: run.interest_paid,
        total_balance,
        total_monthly_payment,
        payoff_order: run.payoff_order,
        interest_savings,
        hit_month_cap,
        remaining_balance: run.remaining_balance,
    }
}

fn run_simulation(mut debts: Vec<LiveDebt>, config: &PayoffConfig, extra: f64) -> SimulationRun {
    let mut month = 0;
    let mut interest_paid = 0.0;
    let mut freed_minimums = 0.0;
    let mut payoff_order = Vec::with_capacity(debts.len());

    while month < config.month_cap && debts.iter().any(|d| !d.paid_off) {
        month += 1;

        for debt in debts.iter_mut().filter(|d| d.balance > 0.0) {
            let interest = debt.balance * debt.apr / 1200.0;
            debt.balance += interest;
            interest_paid += interest;
            debt.balance -= debt.minimum_payment.min(debt.balance);
        }

        rank_debts(&mut debts, config.strategy);

        let mut pool = extra + freed_minimums;
        for debt in debts.iter_mut().filter(|d| !d.paid_off && d.balance > 0.0) {
            if pool <= 0.0 {
                break;
            }
            let applied = pool.min(debt.balance);
            debt.balance -= applied;
            pool -= applied;
        }

        for debt in debts.iter_mut().filter(|d| !d.paid_off && d.balance <= 0.0) {
            debt.paid_off = true;
            debt.balance = 0.0;
            payoff_order.push(PaidOffDebt {
                debt_name: debt.name.clone(),
                month_paid_off: month,
                original_balance: debt.original_balance,
            });
            if config.reallocate_freed_minimums {
                freed_minimums += debt.minimum_payment;
            }
        }
    }

    SimulationRun {
        months: month,
        interest_paid,
        payoff_order,
        remaining_balance: debts.iter().map(|d| d.balance).sum(),
    }
}

/// Outstanding debts first in strategy priority, cleared debts after them.
/// The sort is stable so equal keys keep last month's order.
fn rank_debts(debts: &mut [LiveDebt], strategy: PayoffStrategy) {
    debts.sort_by(|a, b| match (a.paid_off, b.paid_off) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => Ordering::Equal,
        (false, false) => match strategy {
            PayoffStrategy::Avalanche => b.apr.total_cmp(&a.apr),
            PayoffStrategy::Snowball => a.balance.total_cmp(&b.balance),
        },
    });
}
