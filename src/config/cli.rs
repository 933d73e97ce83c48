use crate::domain::model::PriceField;
use crate::utils::error::NavError;
use std::fmt;
use std::str::FromStr;

/// Picks an entity by numeric id or by case-insensitive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(u64),
    Name(String),
}

impl Selector {
    pub fn matches(&self, id: u64, name: &str) -> bool {
        match self {
            Selector::Id(wanted) => *wanted == id,
            Selector::Name(wanted) => wanted.trim().eq_ignore_ascii_case(name.trim()),
        }
    }
}

impl FromStr for Selector {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NavError::InvalidConfigValueError {
                field: "selector".to_string(),
                value: s.to_string(),
                reason: "Selector cannot be empty".to_string(),
            });
        }
        Ok(s.parse::<u64>()
            .map(Selector::Id)
            .unwrap_or_else(|_| Selector::Name(s.to_string())))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "#{}", id),
            Selector::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// `field=value`; an empty value clears the field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAssignment {
    pub field: PriceField,
    pub value: Option<f64>,
}

impl FromStr for FieldAssignment {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, value) = s.split_once('=').ok_or_else(|| NavError::InvalidPriceValue {
            value: s.to_string(),
            reason: "expected field=value".to_string(),
        })?;

        let field = field.parse::<PriceField>()?;
        let value = value.trim();
        let value = if value.is_empty() {
            None
        } else {
            let number = value.parse::<f64>().map_err(|e| NavError::InvalidPriceValue {
                value: value.to_string(),
                reason: e.to_string(),
            })?;
            if !number.is_finite() || number < 0.0 {
                return Err(NavError::InvalidPriceValue {
                    value: value.to_string(),
                    reason: "price must be a non-negative number".to_string(),
                });
            }
            Some(number)
        };

        Ok(Self { field, value })
    }
}
