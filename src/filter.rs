use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison applied by a single predicate.
///
/// Serialized with the camelCase names the grid uses (`greaterThan`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperation {
    Equal,
    NotEqual,
    Contains,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl FilterOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperation::Equal => "=",
            FilterOperation::NotEqual => "!=",
            FilterOperation::Contains => "contains",
            FilterOperation::GreaterThan => ">",
            FilterOperation::GreaterThanOrEqual => ">=",
            FilterOperation::LessThan => "<",
            FilterOperation::LessThanOrEqual => "<=",
        }
    }

    /// Name used in config files and JSON output
    pub fn name(&self) -> &'static str {
        match self {
            FilterOperation::Equal => "equal",
            FilterOperation::NotEqual => "notEqual",
            FilterOperation::Contains => "contains",
            FilterOperation::GreaterThan => "greaterThan",
            FilterOperation::GreaterThanOrEqual => "greaterThanOrEqual",
            FilterOperation::LessThan => "lessThan",
            FilterOperation::LessThanOrEqual => "lessThanOrEqual",
        }
    }

    pub fn iterator() -> impl Iterator<Item = FilterOperation> {
        [
            FilterOperation::Contains,
            FilterOperation::Equal,
            FilterOperation::NotEqual,
            FilterOperation::GreaterThan,
            FilterOperation::GreaterThanOrEqual,
            FilterOperation::LessThan,
            FilterOperation::LessThanOrEqual,
        ]
        .iter()
        .copied()
    }
}

impl fmt::Display for FilterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value type of a grid column; decides which operations it offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Number,
}

impl ColumnKind {
    /// Operations offered for this kind, in menu order.
    /// Numeric columns have no substring match.
    pub fn operations(&self) -> Vec<FilterOperation> {
        FilterOperation::iterator()
            .filter(|op| self.supports(*op))
            .collect()
    }

    pub fn supports(&self, op: FilterOperation) -> bool {
        match self {
            ColumnKind::Text => true,
            ColumnKind::Number => op != FilterOperation::Contains,
        }
    }
}

/// Right-hand side of a predicate: text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

impl FilterValue {
    /// Interpret what the user typed into a filter cell of a column of `kind`.
    /// Numeric input in a numeric column becomes a number; everything else stays text.
    pub fn parse(input: &str, kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Number => input
                .trim()
                .parse::<f64>()
                .map(FilterValue::Number)
                .unwrap_or_else(|_| FilterValue::Text(input.to_string())),
            ColumnKind::Text => FilterValue::Text(input.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Number(n) => Some(*n),
            FilterValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Number(n) => write!(f, "{}", n),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Number(value as f64)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Number(value as f64)
    }
}

/// One `field operation value` condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    pub operation: FilterOperation,
    pub value: FilterValue,
}

impl Predicate {
    pub fn new(
        field: impl Into<String>,
        operation: FilterOperation,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operation,
            value: value.into(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            FilterValue::Text(s) => write!(f, "{} {} \"{}\"", self.field, self.operation, s),
            FilterValue::Number(_) => write!(f, "{} {} {}", self.field, self.operation, self.value),
        }
    }
}

/// Ordered list of predicates, all AND-ed together. Empty means no filtering.
///
/// Edits return a new definition and leave `self` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterDefinition(Vec<Predicate>);

impl FilterDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Predicate> {
        self.0.iter()
    }

    /// Predicate currently set for `field`, if any
    pub fn for_field(&self, field: &str) -> Option<&Predicate> {
        self.0.iter().find(|p| p.field == field)
    }

    /// Copy with `predicate` appended.
    pub fn with(&self, predicate: Predicate) -> Self {
        let mut predicates = self.0.clone();
        predicates.push(predicate);
        Self(predicates)
    }

    /// Copy where `predicate` replaces the existing predicate on the same field
    /// (keeping its position), or is appended when the field has none.
    /// This is how a grid filter cell behaves: one condition per column.
    pub fn with_field(&self, predicate: Predicate) -> Self {
        let mut predicates = self.0.clone();
        match predicates.iter().position(|p| p.field == predicate.field) {
            Some(i) => predicates[i] = predicate,
            None => predicates.push(predicate),
        }
        Self(predicates)
    }

    /// Copy with every predicate on `field` removed.
    pub fn without_field(&self, field: &str) -> Self {
        Self(self.0.iter().filter(|p| p.field != field).cloned().collect())
    }

    /// Copy with the predicate at `index` removed. Out of range yields an unchanged copy.
    pub fn without(&self, index: usize) -> Self {
        let mut predicates = self.0.clone();
        if index < predicates.len() {
            predicates.remove(index);
        }
        Self(predicates)
    }

    /// Human readable form, e.g. `year > 1990 AND name contains "um"`
    pub fn describe(&self) -> String {
        if self.0.is_empty() {
            return "(no filter)".to_string();
        }
        self.0
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

impl From<Vec<Predicate>> for FilterDefinition {
    fn from(predicates: Vec<Predicate>) -> Self {
        Self(predicates)
    }
}

impl FromIterator<Predicate> for FilterDefinition {
    fn from_iter<T: IntoIterator<Item = Predicate>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FilterDefinition {
    type Item = &'a Predicate;
    type IntoIter = std::slice::Iter<'a, Predicate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_by_kind() {
        let text = ColumnKind::Text.operations();
        assert_eq!(text.len(), 7);
        assert_eq!(text[0], FilterOperation::Contains);

        let number = ColumnKind::Number.operations();
        assert_eq!(number.len(), 6);
        assert!(!number.contains(&FilterOperation::Contains));
        assert!(ColumnKind::Number.supports(FilterOperation::LessThanOrEqual));
    }

    #[test]
    fn test_value_parse() {
        assert_eq!(
            FilterValue::parse(" 1995 ", ColumnKind::Number),
            FilterValue::Number(1995.0)
        );
        assert_eq!(
            FilterValue::parse("19x", ColumnKind::Number),
            FilterValue::Text("19x".to_string())
        );
        assert_eq!(
            FilterValue::parse("1995", ColumnKind::Text),
            FilterValue::Text("1995".to_string())
        );
        assert_eq!(FilterValue::Number(1990.0).to_string(), "1990");
    }

    #[test]
    fn test_with_field_replaces_in_place() {
        let def: FilterDefinition = vec![
            Predicate::new("name", FilterOperation::Contains, "um"),
            Predicate::new("year", FilterOperation::GreaterThan, 1990),
        ]
        .into();
        let edited = def.with_field(Predicate::new("name", FilterOperation::Equal, "Human"));

        assert_eq!(edited.len(), 2);
        assert_eq!(edited.predicates()[0].operation, FilterOperation::Equal);
        assert_eq!(edited.predicates()[1].field, "year");
        // original untouched
        assert_eq!(def.predicates()[0].operation, FilterOperation::Contains);

        let appended = def.with_field(Predicate::new("artist", FilterOperation::Contains, "Cream"));
        assert_eq!(appended.len(), 3);
        assert_eq!(appended.predicates()[2].field, "artist");
    }

    #[test]
    fn test_without() {
        let def: FilterDefinition = vec![
            Predicate::new("name", FilterOperation::Contains, "um"),
            Predicate::new("year", FilterOperation::GreaterThan, 1990),
        ]
        .into();
        assert_eq!(def.without_field("name").len(), 1);
        assert_eq!(def.without(0).predicates()[0].field, "year");
        assert_eq!(def.without(5), def);
    }

    #[test]
    fn test_serde_shape() {
        let def: FilterDefinition =
            vec![Predicate::new("year", FilterOperation::GreaterThan, 1990)].into();
        let json = serde_json::to_string(&def).unwrap();
        assert_eq!(
            json,
            r#"[{"field":"year","operation":"greaterThan","value":1990.0}]"#
        );
        let back: FilterDefinition = serde_json::from_str(
            r#"[{"field":"name","operation":"contains","value":"um"},{"field":"year","operation":"lessThanOrEqual","value":1990}]"#,
        )
        .unwrap();
        assert_eq!(back.predicates()[0].value, FilterValue::Text("um".to_string()));
        assert_eq!(back.predicates()[1].value, FilterValue::Number(1990.0));
    }

    #[test]
    fn test_describe() {
        assert_eq!(FilterDefinition::new().describe(), "(no filter)");
        let def: FilterDefinition = vec![
            Predicate::new("year", FilterOperation::GreaterThan, 1990),
            Predicate::new("name", FilterOperation::Contains, "um"),
        ]
        .into();
        assert_eq!(def.describe(), "year > 1990 AND name contains \"um\"");
    }
}
