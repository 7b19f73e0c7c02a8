use serde::Deserialize;

use crate::error::ApiError;
use crate::filter::FilterData;

/// Query string of every GET listing; `where` carries the JSON where-clause
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "where")]
    pub where_json: Option<String>,
    pub order: Option<String>,
    pub q: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl ListQuery {
    pub fn into_filter_data(self) -> Result<FilterData, ApiError> {
        let where_clause = match self.where_json.as_deref().map(str::trim).filter(|w| !w.is_empty()) {
            Some(raw) => Some(
                serde_json::from_str(raw).map_err(|e| ApiError::invalid_json(format!("Invalid where parameter: {}", e)))?,
            ),
            None => None,
        };
        Ok(FilterData {
            where_clause,
            order: self.order.map(serde_json::Value::String),
            q: self.q,
            limit: self.limit,
            offset: self.offset,
            page: self.page,
            per_page: self.per_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn where_is_decoded_from_json_text() {
        let query = ListQuery {
            where_json: Some(r#"{"currency":"USD"}"#.into()),
            order: Some("amount desc".into()),
            ..Default::default()
        };
        let data = query.into_filter_data().unwrap();
        assert_eq!(data.where_clause, Some(json!({"currency": "USD"})));
        assert_eq!(data.order, Some(json!("amount desc")));

        let bad = ListQuery { where_json: Some("{currency".into()), ..Default::default() };
        assert!(matches!(bad.into_filter_data(), Err(ApiError::InvalidJson(_))));
    }
}
