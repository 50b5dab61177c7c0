use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::analysis::dto::NutritionRecord;

/// A reported amount such as `"250 kcal"` or `"12g"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quantity {
    Measured { amount: i64, unit: String },
    Unparsable,
}

impl Quantity {
    /// Leading integer with an optional sign, like JavaScript `parseInt`:
    /// `"12.5g"` reads as 12 grams, `"about 200"` is unparsable.
    pub fn parse(raw: &str) -> Self {
        lazy_static! {
            static ref LEADING_INT: Regex =
                Regex::new(r"(?s)^\s*([+-]?[0-9]+)(?:\.[0-9]*)?(.*)$").unwrap();
        }
        let Some(caps) = LEADING_INT.captures(raw) else {
            return Self::Unparsable;
        };
        match caps[1].parse::<i64>() {
            Ok(amount) => Self::Measured {
                amount,
                unit: caps[2].trim().to_string(),
            },
            Err(_) => Self::Unparsable,
        }
    }

    /// Missing fields are unparsable too.
    pub fn of(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or(Self::Unparsable)
    }

    pub fn amount(&self) -> Option<i64> {
        match self {
            Self::Measured { amount, .. } => Some(*amount),
            Self::Unparsable => None,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            Self::Measured { unit, .. } => Some(unit),
            Self::Unparsable => None,
        }
    }

    pub fn amount_or_zero(&self) -> i64 {
        self.amount().unwrap_or(0)
    }
}

/// Macro grams of one record, zero where a value can't be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MacroSplit {
    pub proteins: i64,
    pub carbs: i64,
    pub fats: i64,
}

impl MacroSplit {
    pub fn from_record(record: &NutritionRecord) -> Self {
        Self {
            proteins: Quantity::of(record.proteins.as_deref()).amount_or_zero(),
            carbs: Quantity::of(record.carbs.as_deref()).amount_or_zero(),
            fats: Quantity::of(record.fats.as_deref()).amount_or_zero(),
        }
    }

    pub fn total(&self) -> i64 {
        self.proteins
            .saturating_add(self.carbs)
            .saturating_add(self.fats)
    }
}
