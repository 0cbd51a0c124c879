//! Row filters of the form `<field> <op> <value>`, e.g. `duration < 60` or
//! `start_city == 'San Francisco'`. A row is kept only if it satisfies every
//! condition.

use anyhow::Result;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::SummaryError;
use crate::trip::{FieldValue, SUMMARY_HEADER, TripSummary};

const NUMERIC_FIELDS: [&str; 5] = ["duration", "start_year", "start_month", "start_hour", "weekday"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl Op {
    fn parse(token: &str) -> Option<Self> {
        Some(match token {
            ">" => Op::Gt,
            "<" => Op::Lt,
            ">=" => Op::Ge,
            "<=" => Op::Le,
            "==" => Op::Eq,
            "!=" => Op::Ne,
            _ => return None,
        })
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Op::Gt => ordering == Ordering::Greater,
            Op::Lt => ordering == Ordering::Less,
            Op::Ge => ordering != Ordering::Less,
            Op::Le => ordering != Ordering::Greater,
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: Op,
    pub value: Operand,
}

impl FromStr for Condition {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SummaryError::InvalidFilter {
            condition: s.to_string(),
        };

        let mut parts = s.trim().splitn(3, char::is_whitespace);
        let field = parts.next().filter(|f| !f.is_empty()).ok_or_else(invalid)?;
        let op = parts.next().and_then(Op::parse).ok_or_else(invalid)?;
        let raw = unquote(parts.next().map(str::trim).unwrap_or_default());
        if raw.is_empty() {
            return Err(invalid().into());
        }

        if !SUMMARY_HEADER.contains(&field) {
            return Err(SummaryError::UnknownField {
                field: field.to_string(),
            }
            .into());
        }

        let value = if NUMERIC_FIELDS.contains(&field) {
            Operand::Number(raw.parse().map_err(|_| invalid())?)
        } else {
            Operand::Text(raw.to_string())
        };

        Ok(Condition {
            field: field.to_string(),
            op,
            value,
        })
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

impl Condition {
    pub fn matches(&self, row: &TripSummary) -> bool {
        let ordering = match (row.field(&self.field), &self.value) {
            (Some(FieldValue::Number(a)), Operand::Number(b)) => a.partial_cmp(b),
            (Some(FieldValue::Text(a)), Operand::Text(b)) => Some(a.cmp(b.as_str())),
            _ => None,
        };
        ordering.is_some_and(|o| self.op.holds(o))
    }
}

/// Parses every condition, failing on the first malformed one.
pub fn parse_filters<S: AsRef<str>>(conditions: &[S]) -> Result<Vec<Condition>> {
    conditions.iter().map(|c| c.as_ref().parse()).collect()
}

/// Keeps the rows that satisfy all `conditions`, preserving order.
pub fn apply_filters<'a>(rows: &'a [TripSummary], conditions: &[Condition]) -> Vec<&'a TripSummary> {
    rows.iter()
        .filter(|row| conditions.iter().all(|c| c.matches(row)))
        .collect()
}
