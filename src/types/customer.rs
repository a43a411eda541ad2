//! Customer record submitted through the form

use crate::error::{ChurnError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const AGE_RANGE: (u32, u32) = (18, 100);
pub const CREDIT_SCORE_RANGE: (u32, u32) = (350, 850);
pub const TENURE_RANGE: (u32, u32) = (0, 10);
pub const PRODUCTS_RANGE: (u32, u32) = (0, 10);

/// Customer gender as offered by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    /// Label as it appears in the label mapping artifact
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ChurnError;

    fn from_str(s: &str) -> Result<Self> {
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ChurnError::validation("gender", format!("expected Male or Female, got '{}'", s))
            })
    }
}

/// Country of residence as offered by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    Germany,
    Spain,
    France,
}

impl Country {
    pub const ALL: [Country; 3] = [Country::Germany, Country::Spain, Country::France];

    /// Category name as it appears in the one-hot scheme artifact
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Germany => "Germany",
            Country::Spain => "Spain",
            Country::France => "France",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Country {
    type Err = ChurnError;

    fn from_str(s: &str) -> Result<Self> {
        Country::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ChurnError::validation(
                    "country",
                    format!("expected Germany, Spain or France, got '{}'", s),
                )
            })
    }
}

/// Parse a Yes/No form answer
pub fn parse_yes_no(field: &'static str, s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" => Ok(false),
        other => Err(ChurnError::validation(
            field,
            format!("expected Yes or No, got '{}'", other),
        )),
    }
}

/// One form submission. Consumed by a single prediction and then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub gender: Gender,

    /// Age in years (18-100)
    pub age: u32,

    /// Credit score (350-850)
    pub credit_score: u32,

    /// Years with the bank (0-10)
    pub tenure: u32,

    /// Account balance
    pub balance: f64,

    /// Number of bank products held (0-10)
    #[serde(alias = "products_number")]
    pub products: u32,

    /// Estimated yearly salary
    #[serde(alias = "estimated_salary")]
    pub salary: f64,

    #[serde(alias = "credit_card")]
    pub has_credit_card: bool,

    #[serde(alias = "active_member")]
    pub is_active_member: bool,

    pub country: Country,
}

impl CustomerRecord {
    /// Check every numeric field against its accepted range.
    pub fn validate(&self) -> Result<()> {
        check_range("age", self.age, AGE_RANGE)?;
        check_range("credit_score", self.credit_score, CREDIT_SCORE_RANGE)?;
        check_range("tenure", self.tenure, TENURE_RANGE)?;
        check_range("products", self.products, PRODUCTS_RANGE)?;
        check_non_negative("balance", self.balance)?;
        check_non_negative("salary", self.salary)?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: u32, (min, max): (u32, u32)) -> Result<()> {
    if value < min || value > max {
        return Err(ChurnError::validation(
            field,
            format!("must be between {} and {}, got {}", min, max, value),
        ));
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ChurnError::validation(
            field,
            format!("must be a finite number >= 0, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CustomerRecord {
        CustomerRecord {
            gender: Gender::Female,
            age: 40,
            credit_score: 650,
            tenure: 5,
            balance: 50000.0,
            products: 2,
            salary: 60000.0,
            has_credit_card: true,
            is_active_member: true,
            country: Country::Germany,
        }
    }

    #[test]
    fn test_boundary_values_accepted() {
        let mut r = record();
        for (age, score) in [(18, 350), (100, 850)] {
            r.age = age;
            r.credit_score = score;
            r.balance = 0.0;
            r.products = 0;
            r.tenure = 10;
            assert!(r.validate().is_ok(), "age={} score={}", age, score);
        }
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut r = record();
        r.age = 17;
        assert!(matches!(
            r.validate(),
            Err(ChurnError::Validation { field: "age", .. })
        ));

        let mut r = record();
        r.credit_score = 851;
        assert!(matches!(
            r.validate(),
            Err(ChurnError::Validation { field: "credit_score", .. })
        ));

        let mut r = record();
        r.products = 11;
        assert!(r.validate().is_err());

        let mut r = record();
        r.balance = -0.01;
        assert!(matches!(
            r.validate(),
            Err(ChurnError::Validation { field: "balance", .. })
        ));

        let mut r = record();
        r.salary = f64::NAN;
        assert!(matches!(
            r.validate(),
            Err(ChurnError::Validation { field: "salary", .. })
        ));
    }

    #[test]
    fn test_parse_categoricals() {
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" Spain ".parse::<Country>().unwrap(), Country::Spain);
        assert!(matches!(
            "Italy".parse::<Country>(),
            Err(ChurnError::Validation { field: "country", .. })
        ));
        assert!("Other".parse::<Gender>().is_err());
    }

    #[test]
    fn test_parse_yes_no() {
        assert!(parse_yes_no("credit_card", "Yes").unwrap());
        assert!(!parse_yes_no("credit_card", "no").unwrap());
        assert!(parse_yes_no("active_member", "1").unwrap());
        assert!(parse_yes_no("active_member", "maybe").is_err());
    }

    #[test]
    fn test_record_deserializes_training_column_names() {
        let json = r#"{
            "gender": "Male", "age": 30, "credit_score": 600, "tenure": 3,
            "balance": 1000.0, "products_number": 1, "estimated_salary": 50000.0,
            "credit_card": true, "active_member": false, "country": "France"
        }"#;
        let r: CustomerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.products, 1);
        assert_eq!(r.salary, 50000.0);
        assert!(r.has_credit_card);
        assert!(!r.is_active_member);
        assert_eq!(r.country, Country::France);
    }
}
