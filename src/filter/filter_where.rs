use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;

use super::error::FilterError;
use super::types::{FieldValue, FilterOp, FilterWhereInfo, Listable};

/// Parsed where-clause tree. Sibling conditions combine with AND.
#[derive(Debug, Clone)]
pub enum Condition {
    Field(FilterWhereInfo),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

#[derive(Debug, Clone, Default)]
pub struct FilterWhere {
    conditions: Vec<Condition>,
}

impl FilterWhere {
    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    pub fn parse(where_data: &Value) -> Result<Self, FilterError> {
        Self::validate(where_data)?;
        Ok(Self { conditions: Self::parse_object(where_data)? })
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches<T: Listable>(&self, record: &T) -> bool {
        self.conditions.iter().all(|c| Self::evaluate(c, record))
    }

    fn parse_object(where_data: &Value) -> Result<Vec<Condition>, FilterError> {
        let Value::Object(obj) = where_data else {
            return Ok(vec![]);
        };
        let mut out = Vec::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                out.push(Self::parse_logical_operator(key, value)?);
            } else {
                out.extend(Self::parse_field_condition(key, value)?);
            }
        }
        Ok(out)
    }

    fn parse_logical_operator(op: &str, value: &Value) -> Result<Condition, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let mut parts = Vec::new();
                for v in arr {
                    Self::validate(v)?;
                    parts.push(Condition::And(Self::parse_object(v)?));
                }
                Ok(if op == "$and" { Condition::And(parts) } else { Condition::Or(parts) })
            }
            "$not" => {
                Self::validate(value)?;
                Ok(Condition::Not(Box::new(Condition::And(Self::parse_object(value)?))))
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<Condition>, FilterError> {
        Self::validate_column(field)?;
        let mut out = Vec::new();
        match value {
            Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => {
                for (op_key, op_val) in obj {
                    let operator = Self::map_operator(op_key)?;
                    Self::validate_operator_data(operator, op_val)?;
                    out.push(Condition::Field(FilterWhereInfo {
                        column: field.to_string(),
                        operator,
                        data: op_val.clone(),
                    }));
                }
            }
            // Implicit equality: { field: value }
            _ => out.push(Condition::Field(FilterWhereInfo {
                column: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            })),
        }
        Ok(out)
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$null" => FilterOp::Null,
            "$exists" => FilterOp::Exists,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn validate_operator_data(op: FilterOp, data: &Value) -> Result<(), FilterError> {
        match op {
            FilterOp::Between => match data.as_array() {
                Some(values) if values.len() == 2 => Ok(()),
                _ => Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
            },
            FilterOp::In | FilterOp::NIn if !data.is_array() => {
                Err(FilterError::InvalidOperatorData("$in/$nin require an array".to_string()))
            }
            FilterOp::Like | FilterOp::ILike if !data.is_string() => {
                Err(FilterError::InvalidOperatorData("$like/$ilike require a string pattern".to_string()))
            }
            FilterOp::Null | FilterOp::Exists if !data.is_boolean() => {
                Err(FilterError::InvalidOperatorData("$null/$exists require true or false".to_string()))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn validate_column(column: &str) -> Result<(), FilterError> {
        let mut chars = column.chars();
        let valid_start = chars.next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false);
        if !valid_start || !column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
        }
        Ok(())
    }

    fn evaluate<T: Listable>(condition: &Condition, record: &T) -> bool {
        match condition {
            Condition::Field(info) => Self::evaluate_field(info, &record.field(&info.column)),
            Condition::And(parts) => parts.iter().all(|c| Self::evaluate(c, record)),
            Condition::Or(parts) => parts.iter().any(|c| Self::evaluate(c, record)),
            Condition::Not(inner) => !Self::evaluate(inner, record),
        }
    }

    fn evaluate_field(info: &FilterWhereInfo, value: &FieldValue) -> bool {
        match info.operator {
            FilterOp::Eq => Self::equals(value, &info.data),
            FilterOp::Ne => !Self::equals(value, &info.data),
            FilterOp::Gt => Self::ordering(value, &info.data) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(Self::ordering(value, &info.data), Some(Ordering::Greater | Ordering::Equal)),
            FilterOp::Lt => Self::ordering(value, &info.data) == Some(Ordering::Less),
            FilterOp::Lte => matches!(Self::ordering(value, &info.data), Some(Ordering::Less | Ordering::Equal)),
            FilterOp::Like => {
                !value.is_null() && like_match(&value.to_text(), info.data.as_str().unwrap_or_default(), false)
            }
            FilterOp::ILike => {
                !value.is_null() && like_match(&value.to_text(), info.data.as_str().unwrap_or_default(), true)
            }
            FilterOp::In => info
                .data
                .as_array()
                .map(|values| values.iter().any(|v| Self::equals(value, v)))
                .unwrap_or(false),
            FilterOp::NIn => info
                .data
                .as_array()
                .map(|values| !values.iter().any(|v| Self::equals(value, v)))
                .unwrap_or(true),
            FilterOp::Between => match info.data.as_array().map(|v| v.as_slice()) {
                Some([low, high]) => {
                    matches!(Self::ordering(value, low), Some(Ordering::Greater | Ordering::Equal))
                        && matches!(Self::ordering(value, high), Some(Ordering::Less | Ordering::Equal))
                }
                _ => false,
            },
            FilterOp::Null => info.data.as_bool().unwrap_or(true) == value.is_null(),
            FilterOp::Exists => info.data.as_bool().unwrap_or(true) != value.is_null(),
        }
    }

    fn equals(value: &FieldValue, data: &Value) -> bool {
        if data.is_null() {
            return value.is_null();
        }
        match (value, coerce(value, data)) {
            (_, None) => false,
            (FieldValue::Text(a), Some(FieldValue::Text(b))) => a.to_lowercase() == b.to_lowercase(),
            (v, Some(other)) => !v.is_null() && v.compare(&other) == Ordering::Equal,
        }
    }

    fn ordering(value: &FieldValue, data: &Value) -> Option<Ordering> {
        if value.is_null() {
            return None;
        }
        let other = coerce(value, data)?;
        if other.is_null() {
            return None;
        }
        Some(value.compare(&other))
    }
}

/// Converts a JSON operand into the same variant as the field it is compared with.
fn coerce(field: &FieldValue, data: &Value) -> Option<FieldValue> {
    match (field, data) {
        (_, Value::Null) => Some(FieldValue::Null),
        (FieldValue::Number(_), Value::Number(n)) => Decimal::from_str(&n.to_string()).ok().map(FieldValue::Number),
        (FieldValue::Number(_), Value::String(s)) => Decimal::from_str(s.trim()).ok().map(FieldValue::Number),
        (FieldValue::Date(_), Value::String(s)) => parse_date(s).map(FieldValue::Date),
        (FieldValue::Timestamp(_), Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| FieldValue::Timestamp(t.with_timezone(&Utc)))
            .or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|t| FieldValue::Timestamp(t.and_utc()))),
        (FieldValue::Bool(_), Value::Bool(b)) => Some(FieldValue::Bool(*b)),
        (FieldValue::Bool(_), Value::String(s)) => s.trim().parse::<bool>().ok().map(FieldValue::Bool),
        (FieldValue::Text(_), Value::String(s)) => Some(FieldValue::Text(s.clone())),
        (FieldValue::Text(_), Value::Number(n)) => Some(FieldValue::Text(n.to_string())),
        (FieldValue::Text(_), Value::Bool(b)) => Some(FieldValue::Text(b.to_string())),
        (FieldValue::Null, Value::String(s)) => Some(FieldValue::Text(s.clone())),
        (FieldValue::Null, Value::Bool(b)) => Some(FieldValue::Bool(*b)),
        (FieldValue::Null, Value::Number(n)) => Decimal::from_str(&n.to_string()).ok().map(FieldValue::Number),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// SQL LIKE semantics: `%` matches any run, `_` matches one character.
pub fn like_match(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let (text, pattern) = if case_insensitive {
        (text.to_lowercase(), pattern.to_lowercase())
    } else {
        (text.to_string(), pattern.to_string())
    };
    let t: Vec<char> = text.chars().collect();
    let p: Vec<char> = pattern.chars().collect();

    // dp[j] == pattern[..i] matches text[..j]
    let mut dp = vec![false; t.len() + 1];
    dp[0] = true;
    for pc in &p {
        let mut next = vec![false; t.len() + 1];
        match pc {
            '%' => {
                let mut seen = false;
                for j in 0..=t.len() {
                    seen |= dp[j];
                    next[j] = seen;
                }
            }
            '_' => {
                for j in 1..=t.len() {
                    next[j] = dp[j - 1];
                }
            }
            c => {
                for j in 1..=t.len() {
                    next[j] = dp[j - 1] && t[j - 1] == *c;
                }
            }
        }
        dp = next;
    }
    dp[t.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Row {
        name: &'static str,
        amount: i32,
        city: Option<&'static str>,
    }

    impl Listable for Row {
        fn field(&self, name: &str) -> FieldValue {
            match name {
                "name" => self.name.into(),
                "amount" => self.amount.into(),
                "city" => self.city.into(),
                _ => FieldValue::Null,
            }
        }

        fn search_fields(&self) -> Vec<String> {
            vec![self.name.to_string()]
        }
    }

    fn row() -> Row {
        Row { name: "Cohen", amount: 180, city: None }
    }

    #[test]
    fn like_wildcards() {
        assert!(like_match("Cohen", "Co%", false));
        assert!(like_match("Cohen", "C_hen", false));
        assert!(!like_match("Cohen", "co%", false));
        assert!(like_match("Cohen", "co%", true));
        assert!(like_match("", "%", false));
        assert!(!like_match("Levi", "%x%", false));
    }

    #[test]
    fn implicit_equality_is_case_insensitive_for_text() {
        let w = FilterWhere::parse(&json!({ "name": "cohen" })).unwrap();
        assert!(w.matches(&row()));
    }

    #[test]
    fn numeric_comparisons_and_between() {
        let w = FilterWhere::parse(&json!({ "amount": { "$gte": 100, "$lt": "200" } })).unwrap();
        assert!(w.matches(&row()));
        let w = FilterWhere::parse(&json!({ "amount": { "$between": [181, 500] } })).unwrap();
        assert!(!w.matches(&row()));
    }

    #[test]
    fn logical_operators_and_nulls() {
        let w = FilterWhere::parse(&json!({
            "$or": [ { "name": "Levi" }, { "city": { "$null": true } } ],
            "$not": { "amount": { "$in": [1, 2, 3] } }
        }))
        .unwrap();
        assert!(w.matches(&row()));
        let w = FilterWhere::parse(&json!({ "city": "Brooklyn" })).unwrap();
        assert!(!w.matches(&row()));
    }

    #[test]
    fn rejects_unknown_operators_and_bad_columns() {
        assert!(matches!(
            FilterWhere::parse(&json!({ "name": { "$regex": "x" } })),
            Err(FilterError::UnsupportedOperator(_))
        ));
        assert!(matches!(
            FilterWhere::parse(&json!({ "name; drop": 1 })),
            Err(FilterError::InvalidColumn(_))
        ));
        assert!(FilterWhere::parse(&json!([1, 2])).is_err());
    }
}
