use serde_json::Value;
use std::cmp::Ordering;

use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::types::{FilterOrderInfo, Listable, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::Null => vec![],
            Value::String(s) => Self::parse_order_string(s)?,
            Value::Array(arr) => {
                // Expect array of strings like ["donated_on desc", "last_name asc"]
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s)?),
                        other => return Err(FilterError::InvalidOrder(format!("unexpected order entry: {}", other))),
                    }
                }
                out
            }
            Value::Object(obj) => {
                // { "donated_on": "desc", "last_name": "asc" }
                let mut out = Vec::new();
                for (k, v) in obj {
                    let sort = match v.as_str().unwrap_or("asc").to_ascii_lowercase().as_str() {
                        "desc" => SortDirection::Desc,
                        _ => SortDirection::Asc,
                    };
                    out.push(FilterOrderInfo { column: k.clone(), sort });
                }
                out
            }
            other => return Err(FilterError::InvalidOrder(format!("unsupported order spec: {}", other))),
        };
        for info in &infos {
            FilterWhere::validate_column(&info.column)?;
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        // split on commas, then each token into column and direction
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() { continue; }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                let dir = it.next().unwrap_or("asc");
                let sort = if dir.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc };
                out.push(FilterOrderInfo { column: col.to_string(), sort });
            }
        }
        Ok(out)
    }

    /// Multi-field comparison; nulls stay last in both directions.
    pub fn compare<T: Listable>(infos: &[FilterOrderInfo], a: &T, b: &T) -> Ordering {
        for info in infos {
            let left = a.field(&info.column);
            let right = b.field(&info.column);
            let ord = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => match info.sort {
                    SortDirection::Asc => left.compare(&right),
                    SortDirection::Desc => right.compare(&left),
                },
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Stable sort: records that compare equal keep their input order.
    pub fn sort<T: Listable>(infos: &[FilterOrderInfo], records: &mut [T]) {
        if infos.is_empty() {
            return;
        }
        records.sort_by(|a, b| Self::compare(infos, a, b));
    }
}
