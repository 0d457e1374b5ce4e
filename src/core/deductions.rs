use log::trace;

use super::input::coerce_amount;
use super::tax_year::{Band, TaxYearConfig};
use super::types::{
    DeductionOptions, DeductionResult, IncomeTax, NationalInsurance, NiBandSlice, PensionMode,
    StudentLoanPlan, TaxBandSlice,
};

const ALLOWANCE_TAPER_START: f64 = 100_000.0;
const SEIS_RELIEF_RATE: f64 = 0.50;
const EIS_RELIEF_RATE: f64 = 0.30;

pub fn compute_deductions(
    gross_annual: f64,
    options: &DeductionOptions,
    year: &TaxYearConfig,
) -> DeductionResult {
    let gross = coerce_amount(gross_annual);
    let advanced = options.use_advanced_options;

    let personal_allowance = personal_allowance(gross, options, year);
    let pension_amount = if advanced {
        pension_contribution(gross, options)
    } else {
        0.0
    };
    let taxable_income = (gross - personal_allowance - pension_amount).max(0.0);

    let bands = if advanced {
        year.income_tax_bands_for(options.location)
    } else {
        year.income_tax_bands
    };
    let mut income_tax = income_tax(taxable_income, personal_allowance, bands);

    let (seis_relief, eis_relief) = if advanced {
        (
            coerce_amount(options.seis_investment) * SEIS_RELIEF_RATE,
            coerce_amount(options.eis_investment) * EIS_RELIEF_RATE,
        )
    } else {
        (0.0, 0.0)
    };
    income_tax.total = (income_tax.total - seis_relief - eis_relief).max(0.0);

    let national_insurance = national_insurance(gross, year.national_insurance_bands);

    let student_loan_amount = if advanced {
        student_loan_repayment(gross, options.student_loan_plan, year)
    } else {
        0.0
    };

    let total_deductions =
        income_tax.total + national_insurance.total + student_loan_amount + pension_amount;
    let take_home_annual = gross - total_deductions;

    trace!(
        "deductions for gross {gross:.2} ({}): allowance {personal_allowance:.2}, tax {:.2}, ni {:.2}, take-home {take_home_annual:.2}",
        year.key,
        income_tax.total,
        national_insurance.total
    );

    DeductionResult {
        gross_annual: gross,
        personal_allowance,
        pension_amount,
        taxable_income,
        income_tax,
        national_insurance,
        student_loan_amount,
        seis_relief,
        eis_relief,
        total_deductions,
        take_home_annual,
    }
}

/// Share of the next pound of gross pay lost to deductions.
pub fn marginal_rate(gross_annual: f64, options: &DeductionOptions, year: &TaxYearConfig) -> f64 {
    let gross = coerce_amount(gross_annual);
    let here = compute_deductions(gross, options, year).take_home_annual;
    let next = compute_deductions(gross + 1.0, options, year).take_home_annual;
    1.0 - (next - here)
}

fn personal_allowance(gross: f64, options: &DeductionOptions, year: &TaxYearConfig) -> f64 {
    let mut allowance = year.base_personal_allowance;
    if options.use_advanced_options {
        if let Some(code_allowance) = options.tax_code_allowance.filter(|a| a.is_finite()) {
            allowance = coerce_amount(code_allowance);
        }
        allowance += coerce_amount(options.other_allowances);
    }

    // £1 of allowance is withdrawn for every £2 above the taper start.
    let reduction = ((gross - ALLOWANCE_TAPER_START) / 2.0).max(0.0);
    (allowance - reduction).max(0.0)
}

fn pension_contribution(gross: f64, options: &DeductionOptions) -> f64 {
    let value = coerce_amount(options.pension.value);
    if value <= 0.0 {
        return 0.0;
    }
    match options.pension.mode {
        PensionMode::Percent => gross * value / 100.0,
        PensionMode::FixedMonthly => value * 12.0,
    }
}

/// Band bounds are gross-income figures shifted down by the personal
/// allowance. The first charged band always starts at zero taxable income so
/// a reduced allowance cannot leave income in the zero-rate band.
fn income_tax(taxable_income: f64, personal_allowance: f64, bands: &[Band]) -> IncomeTax {
    let mut result = IncomeTax::default();
    for (position, band) in bands.iter().filter(|b| b.rate > 0.0).enumerate() {
        let lower = if position == 0 {
            0.0
        } else {
            (band.min - personal_allowance).max(0.0)
        };
        let upper = band.max - personal_allowance;
        let taxable_amount = slice_width(taxable_income, lower, upper);
        if taxable_amount <= 0.0 {
            continue;
        }
        let tax_amount = taxable_amount * band.rate;
        result.total += tax_amount;
        result.breakdown.push(TaxBandSlice {
            band_name: band.name,
            rate: band.rate,
            taxable_amount,
            tax_amount,
        });
    }
    result
}

fn national_insurance(gross: f64, bands: &[Band]) -> NationalInsurance {
    let mut result = NationalInsurance::default();
    for band in bands.iter().filter(|b| b.rate > 0.0) {
        let niable_amount = slice_width(gross, band.min, band.max);
        if niable_amount <= 0.0 {
            continue;
        }
        let amount = niable_amount * band.rate;
        result.total += amount;
        result.breakdown.push(NiBandSlice {
            rate: band.rate,
            niable_amount,
            amount,
        });
    }
    result
}

fn student_loan_repayment(gross: f64, plan: StudentLoanPlan, year: &TaxYearConfig) -> f64 {
    match year.student_loan(plan) {
        Some(rates) => (gross - rates.threshold).max(0.0) * rates.rate,
        None => 0.0,
    }
}

fn slice_width(amount: f64, lower: f64, upper: f64) -> f64 {
    (amount.min(upper) - lower).max(0.0)
}
