//! Typed extraction and bounds checking of hike submissions

use serde_json::{Map, Value};
use thiserror::Error;

use crate::sanitize::{coerce_f64, coerce_i64, trim_text};

pub const MIN_HIKE_YEAR: i32 = 2010;
pub const MAX_TEXT_LEN: usize = 100;
pub const MAX_ANNUAL_SALARY: f64 = 1_000_000_000.0;
pub const MAX_HIKE_PERCENTAGE: f64 = 1000.0;

pub const COMPANY_NAME: &str = "companyName";
pub const DESIGNATION: &str = "designation";
pub const ANNUAL_SALARY: &str = "annualSalary";
pub const HIKE_YEAR: &str = "hikeYear";
pub const HIKE_PERCENTAGE: &str = "hikePercentage";
pub const TOKEN_FIELDS: [&str; 2] = ["recaptchaToken", "verificationToken"];

/// Bounds applied after type checks. The upper year bound is always
/// `current_year + 1` and is supplied per call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationPolicy {
    pub min_hike_year: i32,
    pub max_text_len: usize,
    pub max_annual_salary: f64,
    pub max_hike_percentage: f64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_hike_year: MIN_HIKE_YEAR,
            max_text_len: MAX_TEXT_LEN,
            max_annual_salary: MAX_ANNUAL_SALARY,
            max_hike_percentage: MAX_HIKE_PERCENTAGE,
        }
    }
}

/// A submission that passed every check, with sanitized values
#[derive(Debug, Clone, PartialEq)]
pub struct HikeSubmission {
    pub company_name: String,
    pub designation: String,
    pub annual_salary: f64,
    pub hike_year: i32,
    pub hike_percentage: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Submission must be a JSON object.")]
    NotAnObject,

    #[error("Missing required field: {0}.")]
    MissingField(&'static str),

    #[error("Field {field} must be {expected}.")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Field {field} is too long (max {max} characters).")]
    TooLong { field: &'static str, max: usize },

    #[error("Hike Year must be between {min} and {max}.")]
    YearOutOfRange { min: i32, max: i32 },

    #[error("Invalid annual salary amount.")]
    SalaryOutOfRange,

    #[error("Hike percentage is unrealistic.")]
    PercentageOutOfRange,
}

/// Validate a raw payload. Type checks run over every field first, then
/// bounds; the first violation is returned.
pub fn validate(
    payload: &Value,
    policy: &ValidationPolicy,
    current_year: i32,
) -> Result<HikeSubmission, ValidationError> {
    let fields = payload.as_object().ok_or(ValidationError::NotAnObject)?;

    let company_name = required_text(fields, COMPANY_NAME)?;
    let designation = required_text(fields, DESIGNATION)?;
    let annual_salary = required_number(fields, ANNUAL_SALARY)?;
    let hike_year = required_integer(fields, HIKE_YEAR)?;
    let hike_percentage = required_number(fields, HIKE_PERCENTAGE)?;

    for (field, value) in [(COMPANY_NAME, company_name), (DESIGNATION, designation)] {
        if value.chars().count() > policy.max_text_len {
            return Err(ValidationError::TooLong {
                field,
                max: policy.max_text_len,
            });
        }
    }

    let max_year = current_year + 1;
    let hike_year = i32::try_from(hike_year)
        .ok()
        .filter(|y| (policy.min_hike_year..=max_year).contains(y))
        .ok_or(ValidationError::YearOutOfRange {
            min: policy.min_hike_year,
            max: max_year,
        })?;

    if !(annual_salary > 0.0 && annual_salary <= policy.max_annual_salary) {
        return Err(ValidationError::SalaryOutOfRange);
    }

    if !(0.0..=policy.max_hike_percentage).contains(&hike_percentage) {
        return Err(ValidationError::PercentageOutOfRange);
    }

    Ok(HikeSubmission {
        company_name: company_name.to_string(),
        designation: designation.to_string(),
        annual_salary,
        hike_year,
        hike_percentage,
    })
}

/// Verification token carried in the payload, if any.
pub fn verification_token(payload: &Value) -> Option<&str> {
    TOKEN_FIELDS
        .iter()
        .filter_map(|name| payload.get(name).and_then(Value::as_str))
        .map(str::trim)
        .find(|token| !token.is_empty())
}

fn present<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) if trim_text(s).is_empty() => {
            Err(ValidationError::MissingField(field))
        }
        Some(value) => Ok(value),
    }
}

fn required_text<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match present(fields, field)? {
        Value::String(s) => Ok(trim_text(s)),
        _ => Err(ValidationError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

fn required_number(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<f64, ValidationError> {
    coerce_f64(present(fields, field)?).ok_or(ValidationError::WrongType {
        field,
        expected: "a number",
    })
}

fn required_integer(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<i64, ValidationError> {
    coerce_i64(present(fields, field)?).ok_or(ValidationError::WrongType {
        field,
        expected: "an integer",
    })
}
