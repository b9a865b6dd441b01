//! Shared enums used across the filter, pipeline and search builders.

use bson::Bson;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// Ascending order (1)
    Ascending,
    /// Descending order (-1)
    Descending,
}

impl SortDirection {
    /// Returns the numeric direction MongoDB expects in `$sort`.
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }

    /// Maps an `ascending` flag to a direction.
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }
}

impl From<SortDirection> for Bson {
    fn from(direction: SortDirection) -> Self {
        Bson::Int32(direction.as_i32())
    }
}

/// Logical data type of an Atlas Search field, used for both index and facet types.
///
/// When a field enables several types, the first entry of [`FieldType::PRIORITY`]
/// that is enabled wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Date,
}

impl FieldType {
    /// Resolution order: string > number > date.
    pub const PRIORITY: [FieldType; 3] = [FieldType::String, FieldType::Number, FieldType::Date];

    /// Returns the Atlas type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Date => "date",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atlas Search count mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CountType {
    /// Approximate count, exact up to the threshold
    #[default]
    LowerBound,
    /// Exact count of all matching documents
    Total,
}

impl CountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountType::LowerBound => "lowerBound",
            CountType::Total => "total",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_encoding() {
        assert_eq!(SortDirection::Ascending.as_i32(), 1);
        assert_eq!(SortDirection::Descending.as_i32(), -1);
        assert_eq!(Bson::from(SortDirection::Descending), Bson::Int32(-1));
        assert_eq!(SortDirection::from_ascending(false), SortDirection::Descending);
    }

    #[test]
    fn test_field_type_priority_order() {
        assert_eq!(
            FieldType::PRIORITY,
            [FieldType::String, FieldType::Number, FieldType::Date]
        );
        assert_eq!(FieldType::Date.to_string(), "date");
    }

    #[test]
    fn test_count_type_names() {
        assert_eq!(CountType::default(), CountType::LowerBound);
        assert_eq!(CountType::LowerBound.as_str(), "lowerBound");
        assert_eq!(CountType::Total.as_str(), "total");
    }
}
