use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::trip::{TripDraft, TripPatch};

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Error)]
#[error("validation failed")]
pub struct ValidationErrors {
    pub issues: Vec<FieldIssue>,
}

#[derive(Default)]
struct IssueList {
    issues: Vec<FieldIssue>,
}

impl IssueList {
    fn push(&mut self, path: &str, message: &str) {
        self.issues.push(FieldIssue {
            path: path.to_string(),
            message: message.to_string(),
        });
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                issues: self.issues,
            })
        }
    }
}

fn check_non_empty(issues: &mut IssueList, path: &str, value: &str) {
    if value.trim().is_empty() {
        issues.push(path, &format!("{path} must be a non-empty string"));
    }
}

/// Strict `YYYY-MM-DD`: zero-padded, dashes in place, and a real calendar
/// date. `NaiveDate` alone is lenient about padding, hence the structural
/// check first.
fn is_strict_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit());
    digits_ok && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// `HH:mm`, hours 00-23 and minutes 00-59.
fn is_valid_time(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    if ![0usize, 1, 3, 4]
        .iter()
        .all(|&i| bytes[i].is_ascii_digit())
    {
        return false;
    }
    let hours = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
    let minutes = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
    hours < 24 && minutes < 60
}

/// Optional leading `+`, then 8-20 characters of digits, whitespace or `-`.
fn is_valid_phone(value: &str) -> bool {
    let rest = value.strip_prefix('+').unwrap_or(value);
    let count = rest.chars().count();
    (8..=20).contains(&count)
        && rest
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_whitespace() || c == '-')
}

fn check_date(issues: &mut IssueList, path: &str, value: &str) {
    if !is_strict_date(value) {
        issues.push(path, &format!("{path} must be in YYYY-MM-DD format"));
    }
}

fn check_time(issues: &mut IssueList, path: &str, value: &str) {
    if !is_valid_time(value) {
        issues.push(path, &format!("{path} must be in HH:mm format"));
    }
}

fn check_phone(issues: &mut IssueList, path: &str, value: &str) {
    if !is_valid_phone(value) {
        issues.push(path, &format!("{path} must be a valid phone number"));
    }
}

fn check_price(issues: &mut IssueList, path: &str, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        issues.push(path, &format!("{path} must be a positive number"));
    }
}

fn check_total_seats(issues: &mut IssueList, path: &str, value: i32) {
    if value < 1 {
        issues.push(path, &format!("{path} must be at least 1"));
    }
}

impl TripDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut issues = IssueList::default();
        check_non_empty(&mut issues, "fromCity", &self.from_city);
        check_non_empty(&mut issues, "toCity", &self.to_city);
        check_date(&mut issues, "date", &self.date);
        check_time(&mut issues, "time", &self.time);
        check_non_empty(&mut issues, "carModel", &self.car_model);
        check_non_empty(&mut issues, "carColor", &self.car_color);
        check_price(&mut issues, "price", self.price);
        check_phone(&mut issues, "phoneNumber", &self.phone_number);
        check_total_seats(&mut issues, "totalSeats", self.total_seats);
        issues.finish()
    }
}

impl TripPatch {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            return Err(ValidationErrors {
                issues: vec![FieldIssue {
                    path: String::new(),
                    message: "At least one field must be provided to update".to_string(),
                }],
            });
        }

        let mut issues = IssueList::default();
        if let Some(v) = &self.from_city {
            check_non_empty(&mut issues, "fromCity", v);
        }
        if let Some(v) = &self.to_city {
            check_non_empty(&mut issues, "toCity", v);
        }
        if let Some(v) = &self.date {
            check_date(&mut issues, "date", v);
        }
        if let Some(v) = &self.time {
            check_time(&mut issues, "time", v);
        }
        if let Some(v) = &self.car_model {
            check_non_empty(&mut issues, "carModel", v);
        }
        if let Some(v) = &self.car_color {
            check_non_empty(&mut issues, "carColor", v);
        }
        if let Some(v) = self.price {
            check_price(&mut issues, "price", v);
        }
        if let Some(v) = &self.phone_number {
            check_phone(&mut issues, "phoneNumber", v);
        }
        if let Some(v) = self.total_seats {
            check_total_seats(&mut issues, "totalSeats", v);
        }
        if let Some(v) = self.available_seats {
            if v < 0 {
                issues.push("availableSeats", "availableSeats cannot be negative");
            }
        }
        if let (Some(total), Some(available)) = (self.total_seats, self.available_seats) {
            if available > total {
                issues.push("availableSeats", "availableSeats cannot exceed totalSeats");
            }
        }
        issues.finish()
    }
}
