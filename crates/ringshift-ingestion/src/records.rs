//! Key→value record rows handed over by the upstream file parsers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use ringshift_common::error::{Result, RingshiftError};

/// One parsed record: upstream column name → raw value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordRow(BTreeMap<String, String>);

impl RecordRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.0.insert(column.into(), value.into());
    }

    /// Columns and raw values, ordered by column name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(|v| v.trim())
    }

    /// Value of a required column.
    pub fn require(&self, column: &str) -> Result<&str> {
        self.get(column)
            .ok_or_else(|| RingshiftError::malformed(column, "is missing"))
    }

    /// Value of a required column, `None` for the STAR/CIF null markers.
    pub fn optional(&self, column: &str) -> Result<Option<&str>> {
        let value = self.require(column)?;
        Ok((!is_null(value)).then_some(value))
    }

    /// Parse a required, non-null column.
    pub fn parse<T>(&self, column: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.require(column)?;
        raw.parse::<T>()
            .map_err(|e| RingshiftError::malformed(column, format!("`{raw}`: {e}")))
    }

    /// Parse a required column that may hold a null marker.
    pub fn parse_optional<T>(&self, column: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(column)? {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| RingshiftError::malformed(column, format!("`{raw}`: {e}"))),
            None => Ok(None),
        }
    }

    /// Parse a required measurement; `NaN` and infinities are malformed.
    pub fn parse_finite(&self, column: &str) -> Result<f64> {
        finite(column, self.parse(column)?)
    }

    /// Parse a measurement that may hold a null marker.
    pub fn parse_optional_finite(&self, column: &str) -> Result<Option<f64>> {
        self.parse_optional(column)?
            .map(|value| finite(column, value))
            .transpose()
    }
}

fn finite(column: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RingshiftError::malformed(column, format!("`{value}` is not finite")))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RecordRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// `.` and `?` mark inapplicable and unknown values in STAR and CIF.
pub fn is_null(value: &str) -> bool {
    matches!(value.trim(), "" | "." | "?")
}
