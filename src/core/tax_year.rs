use thiserror::Error;

use super::types::{Location, StudentLoanPlan};

/// One slice of a progressive schedule. Bounds are in gross-income terms,
/// `min` and `max` inclusive, `max` of the last band is infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
    pub rate: f64,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentLoanRates {
    pub threshold: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxYearConfig {
    pub key: &'static str,
    pub income_tax_bands: &'static [Band],
    pub scottish_income_tax_bands: &'static [Band],
    pub national_insurance_bands: &'static [Band],
    pub student_loan_plans: &'static [(StudentLoanPlan, StudentLoanRates)],
    pub base_personal_allowance: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum TaxYearError {
    #[error("unsupported tax year '{0}' (expected one of: {supported})", supported = SUPPORTED_KEYS.join(", "))]
    Unknown(String),
    #[error("tax year {year}: {schedule} bands invalid: {reason}")]
    InvalidBands {
        year: &'static str,
        schedule: &'static str,
        reason: String,
    },
}

const fn band(min: f64, max: f64, rate: f64, name: &'static str) -> Band {
    Band {
        min,
        max,
        rate,
        name,
    }
}

const UK_INCOME_TAX: [Band; 4] = [
    band(0.0, 12_570.0, 0.0, "Personal Allowance"),
    band(12_570.0, 50_270.0, 0.20, "Basic rate"),
    band(50_270.0, 125_140.0, 0.40, "Higher rate"),
    band(125_140.0, f64::INFINITY, 0.45, "Additional rate"),
];

const CLASS_1_NI: [Band; 3] = [
    band(0.0, 12_570.0, 0.0, "Below primary threshold"),
    band(12_570.0, 50_270.0, 0.08, "Main rate"),
    band(50_270.0, f64::INFINITY, 0.02, "Upper rate"),
];

static TAX_YEAR_2025_26: TaxYearConfig = TaxYearConfig {
    key: "2025-26",
    income_tax_bands: &UK_INCOME_TAX,
    scottish_income_tax_bands: &[
        band(0.0, 12_570.0, 0.0, "Personal Allowance"),
        band(12_570.0, 15_397.0, 0.19, "Starter rate"),
        band(15_397.0, 27_491.0, 0.20, "Basic rate"),
        band(27_491.0, 43_662.0, 0.21, "Intermediate rate"),
        band(43_662.0, 75_000.0, 0.42, "Higher rate"),
        band(75_000.0, 125_140.0, 0.45, "Advanced rate"),
        band(125_140.0, f64::INFINITY, 0.48, "Top rate"),
    ],
    national_insurance_bands: &CLASS_1_NI,
    student_loan_plans: &[
        (
            StudentLoanPlan::Plan1,
            StudentLoanRates {
                threshold: 26_065.0,
                rate: 0.09,
            },
        ),
        (
            StudentLoanPlan::Plan2,
            StudentLoanRates {
                threshold: 28_470.0,
                rate: 0.09,
            },
        ),
        (
            StudentLoanPlan::Plan4,
            StudentLoanRates {
                threshold: 32_745.0,
                rate: 0.09,
            },
        ),
        (
            StudentLoanPlan::Plan5,
            StudentLoanRates {
                threshold: 25_000.0,
                rate: 0.09,
            },
        ),
        (
            StudentLoanPlan::Postgraduate,
            StudentLoanRates {
                threshold: 21_000.0,
                rate: 0.06,
            },
        ),
    ],
    base_personal_allowance: 12_570.0,
};

static TAX_YEAR_2024_25: TaxYearConfig = TaxYearConfig {
    key: "2024-25",
    income_tax_bands: &UK_INCOME_TAX,
    scottish_income_tax_bands: &[
        band(0.0, 12_570.0, 0.0, "Personal Allowance"),
        band(12_570.0, 14_876.0, 0.19, "Starter rate"),
        band(14_876.0, 26_561.0, 0.20, "Basic rate"),
        band(26_561.0, 43_662.0, 0.21, "Intermediate rate"),
        band(43_662.0, 75_000.0, 0.42, "Higher rate"),
        band(75_000.0, 125_140.0, 0.45, "Advanced rate"),
        band(125_140.0, f64::INFINITY, 0.48, "Top rate"),
    ],
    national_insurance_bands: &CLASS_1_NI,
    student_loan_plans: &[
        (
            StudentLoanPlan::Plan1,
            StudentLoanRates {
                threshold: 24_990.0,
                rate: 0.09,
            },
        ),
        (
            StudentLoanPlan::Plan2,
            StudentLoanRates {
                threshold: 27_295.0,
                rate: 0.09,
            },
        ),
        (
            StudentLoanPlan::Plan4,
            StudentLoanRates {
                threshold: 31_395.0,
                rate: 0.09,
            },
        ),
        (
            StudentLoanPlan::Plan5,
            StudentLoanRates {
                threshold: 25_000.0,
                rate: 0.09,
            },
        ),
        (
            StudentLoanPlan::Postgraduate,
            StudentLoanRates {
                threshold: 21_000.0,
                rate: 0.06,
            },
        ),
    ],
    base_personal_allowance: 12_570.0,
};

static TAX_YEARS: [&TaxYearConfig; 2] = [&TAX_YEAR_2025_26, &TAX_YEAR_2024_25];

const SUPPORTED_KEYS: [&str; 2] = ["2025-26", "2024-25"];

pub fn supported_tax_years() -> &'static [&'static str] {
    &SUPPORTED_KEYS
}

/// Looks up a tax year by key. Accepts `2025-26`, `2025/26` and `2025-2026`.
pub fn tax_year(key: &str) -> Result<&'static TaxYearConfig, TaxYearError> {
    let normalized = normalize_key(key);
    TAX_YEARS
        .iter()
        .copied()
        .find(|year| year.key == normalized)
        .ok_or_else(|| TaxYearError::Unknown(key.trim().to_string()))
}

fn normalize_key(key: &str) -> String {
    let key = key.trim().replace('/', "-");
    match key.split_once('-') {
        Some((start, end)) if end.len() == 4 && end.chars().all(|c| c.is_ascii_digit()) => {
            format!("{start}-{}", &end[2..])
        }
        _ => key,
    }
}

impl TaxYearConfig {
    pub fn current() -> &'static TaxYearConfig {
        &TAX_YEAR_2025_26
    }

    pub fn income_tax_bands_for(&self, location: Location) -> &'static [Band] {
        match location {
            Location::RestOfUk => self.income_tax_bands,
            Location::Scotland => self.scottish_income_tax_bands,
        }
    }

    pub fn student_loan(&self, plan: StudentLoanPlan) -> Option<StudentLoanRates> {
        self.student_loan_plans
            .iter()
            .find(|(candidate, _)| *candidate == plan)
            .map(|(_, rates)| *rates)
    }

    pub fn validate(&self) -> Result<(), TaxYearError> {
        for (schedule, bands) in [
            ("income tax", self.income_tax_bands),
            ("scottish income tax", self.scottish_income_tax_bands),
            ("national insurance", self.national_insurance_bands),
        ] {
            validate_bands(bands).map_err(|reason| TaxYearError::InvalidBands {
                year: self.key,
                schedule,
                reason,
            })?;
        }
        Ok(())
    }
}

fn validate_bands(bands: &[Band]) -> Result<(), String> {
    let Some(first) = bands.first() else {
        return Err("no bands".to_string());
    };
    if first.min != 0.0 {
        return Err(format!("first band starts at {} instead of 0", first.min));
    }
    if first.rate != 0.0 {
        return Err(format!("first band '{}' is not the zero-rate band", first.name));
    }
    for pair in bands.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        if lower.max <= lower.min {
            return Err(format!("band '{}' is empty", lower.name));
        }
        if upper.min != lower.max {
            return Err(format!(
                "band '{}' ends at {} but '{}' starts at {}",
                lower.name, lower.max, upper.name, upper.min
            ));
        }
    }
    if bands.iter().any(|b| !(0.0..=1.0).contains(&b.rate)) {
        return Err("rates must be between 0 and 1".to_string());
    }
    if bands.last().is_some_and(|last| last.max != f64::INFINITY) {
        return Err("last band must be unbounded".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_tax_years_have_valid_bands() {
        for key in supported_tax_years() {
            let year = tax_year(key).expect("supported year");
            year.validate().expect("bands must tile");
            assert_eq!(year.key, *key);
        }
    }

    #[test]
    fn lookup_accepts_common_key_spellings() {
        assert_eq!(tax_year("2025/26").expect("slash form").key, "2025-26");
        assert_eq!(tax_year(" 2024-2025 ").expect("long form").key, "2024-25");
    }

    #[test]
    fn lookup_rejects_unknown_year() {
        let err = tax_year("1999-00").expect_err("unsupported");
        assert_eq!(err, TaxYearError::Unknown("1999-00".to_string()));
        assert!(err.to_string().contains("2025-26"));
    }

    #[test]
    fn validate_reports_gap_between_bands() {
        static GAPPY: [Band; 2] = [
            band(0.0, 10.0, 0.0, "Zero"),
            band(11.0, f64::INFINITY, 0.2, "Basic"),
        ];
        let mut year = TaxYearConfig::current().clone();
        year.national_insurance_bands = &GAPPY;
        let err = year.validate().expect_err("gap must be rejected");
        assert!(err.to_string().contains("national insurance"));
    }

    #[test]
    fn student_loan_lookup_has_no_entry_for_none() {
        let year = TaxYearConfig::current();
        assert!(year.student_loan(StudentLoanPlan::None).is_none());
        let plan2 = year.student_loan(StudentLoanPlan::Plan2).expect("plan 2");
        assert_eq!(plan2.threshold, 28_470.0);
    }
}
