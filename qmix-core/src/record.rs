//! Key-value records reporting statistics of training steps.
//!
//! [`Record`]s are returned by optimisation and prioritization steps so that
//! a caller can forward them to whatever logger it uses.
//!
//! ```rust
//! use qmix_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("loss", 0.5);
//! record.insert("n_episodes", RecordValue::Scalar(4.0));
//! assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
//! ```
use crate::error::QmixError;
use std::collections::HashMap;

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, typically used for metrics like loss.
    Scalar(f32),

    /// A text value.
    String(String),
}

/// A container for storing key-value pairs of various data types.
#[derive(Debug, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Merges two records, consuming both.
    ///
    /// Values of `record` overwrite values of `self` under the same key.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, QmixError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(QmixError::RecordValueTypeError("Scalar".to_string())),
            None => Err(QmixError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a string value from the record.
    pub fn get_string(&self, k: &str) -> Result<String, QmixError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(QmixError::RecordValueTypeError("String".to_string())),
            None => Err(QmixError::RecordKeyError(k.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites() {
        let r1 = Record::from_slice(&[
            ("loss", RecordValue::Scalar(1.0)),
            ("mode", RecordValue::String("UNIFORM".to_string())),
        ]);
        let r2 = Record::from_scalar("loss", 2.0);
        let r = r1.merge(r2);
        assert_eq!(r.get_scalar("loss").unwrap(), 2.0);
        assert_eq!(r.get_string("mode").unwrap(), "UNIFORM");
    }

    #[test]
    fn test_type_errors() {
        let r = Record::from_scalar("loss", 1.0);
        assert_eq!(
            r.get_string("loss"),
            Err(QmixError::RecordValueTypeError("String".to_string()))
        );
        assert_eq!(
            r.get_scalar("td_error"),
            Err(QmixError::RecordKeyError("td_error".to_string()))
        );
    }
}
