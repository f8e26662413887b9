//! Query string assembly for list endpoints.
//!
//! Service clients describe list filters as structs of optional fields;
//! [`QueryParams`] turns them into the `(key, value)` pairs an
//! [`ApiRequest`](crate::client::ApiRequest) carries.

use std::fmt::Display;

/// Ordered collection of query parameter pairs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key=value`.
    pub fn push<T>(&mut self, key: &'static str, value: T)
    where
        T: Display,
    {
        self.pairs.push((key, value.to_string()));
    }

    /// Add `key=value` only when `value` is present.
    pub fn push_opt<T>(&mut self, key: &'static str, value: Option<T>)
    where
        T: Display,
    {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Add `key=map(value)` only when `value` is present.
    pub fn push_opt_with<T, F>(&mut self, key: &'static str, value: Option<T>, map: F)
    where
        F: FnOnce(T) -> String,
    {
        if let Some(value) = value {
            self.pairs.push((key, map(value)));
        }
    }

    /// Add a comma-separated list unless it is empty.
    pub fn push_list<T>(&mut self, key: &'static str, values: &[T])
    where
        T: Display,
    {
        if !values.is_empty() {
            let joined = values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            self.pairs.push((key, joined));
        }
    }

    /// True when nothing has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Consume into the collected pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(&'static str, String)> {
        self.pairs
    }
}
