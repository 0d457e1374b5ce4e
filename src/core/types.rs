use serde::Serialize;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Location {
    #[default]
    RestOfUk,
    Scotland,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PensionMode {
    #[default]
    Percent,
    FixedMonthly,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum StudentLoanPlan {
    #[default]
    None,
    Plan1,
    Plan2,
    Plan4,
    Plan5,
    Postgraduate,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PensionContribution {
    pub mode: PensionMode,
    /// Percent of gross in `Percent` mode, pounds per month in `FixedMonthly` mode.
    pub value: f64,
}

/// Salary calculator settings. With `use_advanced_options` off only the
/// personal allowance taper, income tax and NI apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeductionOptions {
    pub location: Location,
    pub tax_code_allowance: Option<f64>,
    pub other_allowances: f64,
    pub pension: PensionContribution,
    pub student_loan_plan: StudentLoanPlan,
    pub seis_investment: f64,
    pub eis_investment: f64,
    pub use_advanced_options: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBandSlice {
    pub band_name: &'static str,
    pub rate: f64,
    pub taxable_amount: f64,
    pub tax_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeTax {
    pub total: f64,
    pub breakdown: Vec<TaxBandSlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NiBandSlice {
    pub rate: f64,
    pub niable_amount: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalInsurance {
    pub total: f64,
    pub breakdown: Vec<NiBandSlice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionResult {
    pub gross_annual: f64,
    pub personal_allowance: f64,
    pub pension_amount: f64,
    pub taxable_income: f64,
    pub income_tax: IncomeTax,
    pub national_insurance: NationalInsurance,
    pub student_loan_amount: f64,
    pub seis_relief: f64,
    pub eis_relief: f64,
    pub total_deductions: f64,
    pub take_home_annual: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodFigures {
    pub gross: f64,
    pub income_tax: f64,
    pub national_insurance: f64,
    pub student_loan: f64,
    pub pension: f64,
    pub take_home: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBreakdown {
    pub annual: PeriodFigures,
    pub monthly: PeriodFigures,
    pub weekly: PeriodFigures,
}

impl DeductionResult {
    pub fn periods(&self) -> PeriodBreakdown {
        let per = |divisor: f64| PeriodFigures {
            gross: self.gross_annual / divisor,
            income_tax: self.income_tax.total / divisor,
            national_insurance: self.national_insurance.total / divisor,
            student_loan: self.student_loan_amount / divisor,
            pension: self.pension_amount / divisor,
            take_home: self.take_home_annual / divisor,
        };
        PeriodBreakdown {
            annual: per(1.0),
            monthly: per(12.0),
            weekly: per(52.0),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PayoffStrategy {
    /// Highest APR first.
    #[default]
    Avalanche,
    /// Smallest balance first.
    Snowball,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Debt {
    pub name: String,
    pub balance: f64,
    /// Annual percentage rate, e.g. 19.9.
    pub apr: f64,
    pub minimum_payment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidOffDebt {
    pub debt_name: String,
    pub month_paid_off: u32,
    pub original_balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffResult {
    pub total_months: u32,
    pub total_interest_paid: f64,
    pub total_balance: f64,
    pub total_monthly_payment: f64,
    pub payoff_order: Vec<PaidOffDebt>,
    pub interest_savings: f64,
    pub hit_month_cap: bool,
    pub remaining_balance: f64,
}
