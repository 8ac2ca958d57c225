use serde::{Deserialize, Serialize};

use crate::controller::{CollectionController, CollectionKind};
use crate::error::ValidationError;
use crate::record::{now_timestamp, Record};

pub const SALARY_RECORDS_KEY: &str = "salaryRecords";

const DEFAULT_BASIC: &str = "3000";
const DEFAULT_DAYS: &str = "22";
const DEFAULT_RATE: &str = "20";

/// One saved pay slip. `overtime_pay`, `gross` and `net` are computed when the
/// record is saved and never recomputed on load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRecord {
    pub id: String,
    pub name: String,
    pub date: String,
    pub basic: f64,
    pub days: f64,
    pub overtime_hrs: f64,
    pub rate: f64,
    pub overtime_pay: f64,
    pub bonus_amt: f64,
    pub deduction_amt: f64,
    pub gross: f64,
    pub net: f64,
    pub created: String,
}

impl Record for SalaryRecord {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SalaryForm {
    pub name: String,
    pub date: String,
    pub basic: String,
    pub days: String,
    pub overtime_hours: String,
    pub overtime_rate: String,
    pub bonus: String,
    pub deduction: String,
}

impl Default for SalaryForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            date: crate::tools::today_string(),
            basic: DEFAULT_BASIC.to_string(),
            days: DEFAULT_DAYS.to_string(),
            overtime_hours: String::new(),
            overtime_rate: DEFAULT_RATE.to_string(),
            bonus: String::new(),
            deduction: String::new(),
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PayBreakdown {
    pub basic: f64,
    pub days: f64,
    pub overtime_hours: f64,
    pub overtime_rate: f64,
    pub overtime_pay: f64,
    pub bonus: f64,
    pub deduction: f64,
    pub gross: f64,
    pub net: f64,
}

impl PayBreakdown {
    /// Net is not clamped: a deduction larger than gross yields a negative net.
    pub fn compute(
        basic: f64,
        days: f64,
        overtime_hours: f64,
        overtime_rate: f64,
        bonus: f64,
        deduction: f64,
    ) -> Self {
        let overtime_pay = overtime_hours * overtime_rate;
        let gross = basic + overtime_pay + bonus;
        Self {
            basic,
            days,
            overtime_hours,
            overtime_rate,
            overtime_pay,
            bonus,
            deduction,
            gross,
            net: gross - deduction,
        }
    }
}

impl SalaryForm {
    pub fn named(name: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date: date.into(),
            ..Self::default()
        }
    }

    /// Live preview of the pay figures for the current inputs.
    pub fn breakdown(&self) -> PayBreakdown {
        PayBreakdown::compute(
            parse_amount(self.basic.as_str()),
            parse_amount(self.days.as_str()),
            parse_amount(self.overtime_hours.as_str()),
            parse_amount(self.overtime_rate.as_str()),
            parse_amount(self.bonus.as_str()),
            parse_amount(self.deduction.as_str()),
        )
    }
}

/// Blank, unparseable or non-finite input counts as zero.
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

pub fn format_money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", -amount)
    } else {
        format!("${amount:.2}")
    }
}

pub struct SalaryInput {
    name: String,
    date: String,
    pay: PayBreakdown,
}

pub struct SalaryRecords;

impl CollectionKind for SalaryRecords {
    type Record = SalaryRecord;
    type Form = SalaryForm;
    type Input = SalaryInput;

    const KEY: &'static str = SALARY_RECORDS_KEY;
    const NOUN: &'static str = "salary record";
    const TITLE: &'static str = "Salary Record";

    fn validate(form: &SalaryForm) -> Result<SalaryInput, ValidationError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(ValidationError::new(
                "name",
                "Please enter employee name and salary date",
            ));
        }
        let date = form.date.trim();
        if date.is_empty() {
            return Err(ValidationError::new(
                "date",
                "Please enter employee name and salary date",
            ));
        }
        Ok(SalaryInput {
            name: name.to_string(),
            date: date.to_string(),
            pay: form.breakdown(),
        })
    }

    fn build(input: SalaryInput, id: String, previous: Option<&SalaryRecord>) -> SalaryRecord {
        let pay = input.pay;
        SalaryRecord {
            id,
            name: input.name,
            date: input.date,
            basic: pay.basic,
            days: pay.days,
            overtime_hrs: pay.overtime_hours,
            rate: pay.overtime_rate,
            overtime_pay: pay.overtime_pay,
            bonus_amt: pay.bonus,
            deduction_amt: pay.deduction,
            gross: pay.gross,
            net: pay.net,
            created: previous
                .map(|record| record.created.clone())
                .unwrap_or_else(now_timestamp),
        }
    }

    fn to_form(record: &SalaryRecord) -> SalaryForm {
        SalaryForm {
            name: record.name.clone(),
            date: record.date.clone(),
            basic: record.basic.to_string(),
            days: record.days.to_string(),
            overtime_hours: record.overtime_hrs.to_string(),
            overtime_rate: record.rate.to_string(),
            bonus: record.bonus_amt.to_string(),
            deduction: record.deduction_amt.to_string(),
        }
    }
}

pub type SalaryController = CollectionController<SalaryRecords>;
