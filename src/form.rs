//! Terminal form for churn predictions
//!
//! Prompts for each customer field in turn (empty input keeps the shown
//! default), renders the verdict, and stays open for the next customer until
//! end of input or `q`.

use crate::error::{ChurnError, Result};
use crate::metrics::SessionMetrics;
use crate::models::inference::InferenceEngine;
use crate::types::customer::{
    parse_yes_no, Country, CustomerRecord, Gender, AGE_RANGE, CREDIT_SCORE_RANGE, PRODUCTS_RANGE,
    TENURE_RANGE,
};
use crate::types::prediction::PredictionResult;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Upper bound of the balance widget
pub const BALANCE_WIDGET_MAX: f64 = 1_000_000.0;

const RED: &str = "\x1b[31;1m";
const GREEN: &str = "\x1b[32;1m";
const RESET: &str = "\x1b[0m";

/// Values pre-filled in the form
pub fn default_record() -> CustomerRecord {
    CustomerRecord {
        gender: Gender::Male,
        age: 30,
        credit_score: 600,
        tenure: 3,
        balance: 1000.0,
        products: 1,
        salary: 50000.0,
        has_credit_card: true,
        is_active_member: true,
        country: Country::Germany,
    }
}

/// Parse an integer field and check it against its range
pub fn parse_bounded(field: &'static str, s: &str, (min, max): (u32, u32)) -> Result<u32> {
    let value: u32 = s
        .trim()
        .parse()
        .map_err(|_| ChurnError::validation(field, format!("'{}' is not a whole number", s.trim())))?;
    if value < min || value > max {
        return Err(ChurnError::validation(
            field,
            format!("must be between {} and {}, got {}", min, max, value),
        ));
    }
    Ok(value)
}

/// Parse a non-negative amount, optionally capped
pub fn parse_amount(field: &'static str, s: &str, max: Option<f64>) -> Result<f64> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| ChurnError::validation(field, format!("'{}' is not a number", s.trim())))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ChurnError::validation(field, format!("must be >= 0, got {}", value)));
    }
    if let Some(max) = max {
        if value > max {
            return Err(ChurnError::validation(
                field,
                format!("must be at most {:.0}, got {}", max, value),
            ));
        }
    }
    Ok(value)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Interactive form over any line-based input and output
pub struct ChurnForm<R, W> {
    input: R,
    output: W,
    color: bool,
}

impl<R: BufRead, W: Write> ChurnForm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            color: false,
        }
    }

    /// Enable ANSI colors for the verdict
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Read one answer. `None` means the user is done.
    fn prompt(&mut self, label: &str, default: &str) -> io::Result<Option<String>> {
        write!(self.output, "{} [{}]: ", label, default)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        if answer.is_empty() {
            return Ok(Some(default.to_string()));
        }
        Ok(Some(answer.to_string()))
    }

    /// Ask until the answer parses, like a widget refusing bad input
    fn ask<T, F>(&mut self, label: &str, default: impl Display, parse: F) -> io::Result<Option<T>>
    where
        F: Fn(&str) -> Result<T>,
    {
        let default = default.to_string();
        loop {
            let Some(answer) = self.prompt(label, &default)? else {
                return Ok(None);
            };
            match parse(&answer) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.output, "  {}", e)?,
            }
        }
    }

    /// Collect one customer record
    pub fn read_record(&mut self) -> io::Result<Option<CustomerRecord>> {
        let d = default_record();
        writeln!(self.output, "\nCustomer Information")?;

        let Some(gender) = self.ask("Gender (Male/Female)", d.gender, |s: &str| s.parse::<Gender>())?
        else {
            return Ok(None);
        };
        let Some(age) = self.ask("Age", d.age, |s: &str| parse_bounded("age", s, AGE_RANGE))? else {
            return Ok(None);
        };
        let Some(credit_score) = self.ask("Credit Score", d.credit_score, |s: &str| {
            parse_bounded("credit_score", s, CREDIT_SCORE_RANGE)
        })?
        else {
            return Ok(None);
        };
        let Some(tenure) = self.ask("Tenure (Years)", d.tenure, |s: &str| {
            parse_bounded("tenure", s, TENURE_RANGE)
        })?
        else {
            return Ok(None);
        };
        let Some(balance) = self.ask("Account Balance", d.balance, |s: &str| {
            parse_amount("balance", s, Some(BALANCE_WIDGET_MAX))
        })?
        else {
            return Ok(None);
        };
        let Some(products) = self.ask("Number of Products", d.products, |s: &str| {
            parse_bounded("products", s, PRODUCTS_RANGE)
        })?
        else {
            return Ok(None);
        };
        let Some(salary) = self.ask("Estimated Salary", d.salary, |s: &str| {
            parse_amount("salary", s, None)
        })?
        else {
            return Ok(None);
        };
        let Some(has_credit_card) = self.ask("Credit Card (Yes/No)", yes_no(d.has_credit_card), |s: &str| {
            parse_yes_no("credit_card", s)
        })?
        else {
            return Ok(None);
        };
        let Some(is_active_member) = self.ask(
            "Active Member (Yes/No)",
            yes_no(d.is_active_member),
            |s: &str| parse_yes_no("active_member", s),
        )?
        else {
            return Ok(None);
        };
        let Some(country) = self.ask("Country (Germany/Spain/France)", d.country, |s: &str| {
            s.parse::<Country>()
        })?
        else {
            return Ok(None);
        };

        Ok(Some(CustomerRecord {
            gender,
            age,
            credit_score,
            tenure,
            balance,
            products,
            salary,
            has_credit_card,
            is_active_member,
            country,
        }))
    }

    /// Render a prediction or the error that prevented it
    pub fn render(&mut self, outcome: &Result<PredictionResult>) -> io::Result<()> {
        writeln!(self.output, "\nPrediction Result")?;
        match outcome {
            Ok(result) => {
                let color = if result.label { RED } else { GREEN };
                if self.color {
                    writeln!(self.output, "{}{}{}", color, result.headline(), RESET)?;
                } else {
                    writeln!(self.output, "{}", result.headline())?;
                }
                writeln!(self.output, "{}", result.probability_text())?;
            }
            Err(e) => writeln!(self.output, "Prediction failed: {}", e)?,
        }
        Ok(())
    }

    /// Run the form until the user is done; returns the number of submissions
    pub fn run(&mut self, engine: &InferenceEngine, metrics: &SessionMetrics) -> io::Result<usize> {
        writeln!(self.output, "🏦 Bank Churn Predictor")?;
        writeln!(
            self.output,
            "Enter the customer details below to predict if the customer is likely to churn. \
             Press Enter to keep a default, q to quit."
        )?;

        let mut submissions = 0;
        while let Some(record) = self.read_record()? {
            submissions += 1;
            let submission_id = Uuid::new_v4();

            let start = Instant::now();
            let outcome = engine.infer(&record);
            let latency = start.elapsed();

            match &outcome {
                Ok(result) => {
                    metrics.record_prediction(latency, result);
                    info!(
                        submission_id = %submission_id,
                        label = result.label,
                        probability = result.probability,
                        latency_us = latency.as_micros() as u64,
                        "Prediction rendered"
                    );
                }
                Err(e) => {
                    metrics.record_failure(e.kind());
                    warn!(
                        submission_id = %submission_id,
                        kind = e.kind(),
                        error = %e,
                        "Prediction failed"
                    );
                }
            }

            self.render(&outcome)?;
        }

        writeln!(self.output, "\nGoodbye.")?;
        Ok(submissions)
    }
}
