//! Stateless calculators: age, elapsed time and unit conversion.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Today's local date as `YYYY-MM-DD`, the format date inputs use.
pub fn today_string() -> String {
    today().format("%Y-%m-%d").to_string()
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Age {
    pub years: i32,
    pub months: i32,
    pub days: i32,
    pub total_days: i64,
}

pub fn age_on(dob: NaiveDate, today: NaiveDate) -> Result<Age, ToolError> {
    if dob > today {
        return Err(ToolError::InvalidInput(
            "Please enter a valid date of birth".to_string(),
        ));
    }

    let mut years = today.year() - dob.year();
    let mut months = today.month() as i32 - dob.month() as i32;
    let mut days = today.day() as i32 - dob.day() as i32;

    if days < 0 {
        months -= 1;
        days += days_in_previous_month(today);
    }
    if months < 0 {
        years -= 1;
        months += 12;
    }

    Ok(Age {
        years,
        months,
        days,
        total_days: (today - dob).num_days(),
    })
}

fn days_in_previous_month(date: NaiveDate) -> i32 {
    date.with_day(1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day() as i32)
        .unwrap_or(30)
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

pub fn time_between(start: NaiveDateTime, end: NaiveDateTime) -> Result<Span, ToolError> {
    if start >= end {
        return Err(ToolError::InvalidInput(
            "Please enter valid start and end dates/times".to_string(),
        ));
    }
    let total = (end - start).num_seconds();
    Ok(Span {
        days: total / 86_400,
        hours: (total / 3_600) % 24,
        minutes: (total / 60) % 60,
        seconds: total % 60,
    })
}

/// Accepts `YYYY-MM-DDTHH:MM[:SS]`, the shape of a datetime-local input.
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, ToolError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .map_err(|_| ToolError::InvalidInput(format!("invalid date/time: {raw}")))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ToolError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ToolError::InvalidInput(format!("invalid date: {raw}")))
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Quantity {
    Length,
    Weight,
    Time,
}

impl Quantity {
    pub fn units(self) -> &'static [Unit] {
        match self {
            Quantity::Length => &[Unit::Meters, Unit::Kilometers, Unit::Centimeters],
            Quantity::Weight => &[Unit::Kilograms, Unit::Grams],
            Quantity::Time => &[Unit::Seconds, Unit::Minutes, Unit::Hours],
        }
    }
}

impl FromStr for Quantity {
    type Err = ToolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "length" => Ok(Quantity::Length),
            "weight" => Ok(Quantity::Weight),
            "time" => Ok(Quantity::Time),
            other => Err(ToolError::InvalidInput(format!("unknown quantity: {other}"))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Meters,
    Kilometers,
    Centimeters,
    Kilograms,
    Grams,
    Seconds,
    Minutes,
    Hours,
}

impl Unit {
    pub fn quantity(self) -> Quantity {
        match self {
            Unit::Meters | Unit::Kilometers | Unit::Centimeters => Quantity::Length,
            Unit::Kilograms | Unit::Grams => Quantity::Weight,
            Unit::Seconds | Unit::Minutes | Unit::Hours => Quantity::Time,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Unit::Meters => "meters",
            Unit::Kilometers => "kilometers",
            Unit::Centimeters => "centimeters",
            Unit::Kilograms => "kilograms",
            Unit::Grams => "grams",
            Unit::Seconds => "seconds",
            Unit::Minutes => "minutes",
            Unit::Hours => "hours",
        }
    }

    fn to_base(self, value: f64) -> f64 {
        match self {
            Unit::Kilometers => value * 1000.0,
            Unit::Centimeters => value / 100.0,
            Unit::Grams => value / 1000.0,
            Unit::Minutes => value * 60.0,
            Unit::Hours => value * 3600.0,
            Unit::Meters | Unit::Kilograms | Unit::Seconds => value,
        }
    }

    fn from_base(self, value: f64) -> f64 {
        match self {
            Unit::Kilometers => value / 1000.0,
            Unit::Centimeters => value * 100.0,
            Unit::Grams => value * 1000.0,
            Unit::Minutes => value / 60.0,
            Unit::Hours => value / 3600.0,
            Unit::Meters | Unit::Kilograms | Unit::Seconds => value,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Unit {
    type Err = ToolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        [
            Unit::Meters,
            Unit::Kilometers,
            Unit::Centimeters,
            Unit::Kilograms,
            Unit::Grams,
            Unit::Seconds,
            Unit::Minutes,
            Unit::Hours,
        ]
        .into_iter()
        .find(|unit| unit.name() == wanted)
        .ok_or_else(|| ToolError::InvalidInput(format!("unknown unit: {value}")))
    }
}

/// Converts through the quantity's base unit (meters, kilograms, seconds).
pub fn convert(quantity: Quantity, value: f64, from: Unit, to: Unit) -> Result<f64, ToolError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ToolError::InvalidInput(
            "value must be a non-negative number".to_string(),
        ));
    }
    for unit in [from, to] {
        if unit.quantity() != quantity {
            return Err(ToolError::UnitMismatch {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
    }
    Ok(to.from_base(from.to_base(value)))
}

pub fn format_converted(value: f64) -> String {
    format!("{value:.4}")
}
