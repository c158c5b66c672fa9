use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::NotEq => "!=",
            FilterOperator::Like => "like",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not in",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "=" => Ok(FilterOperator::Eq),
            "!=" => Ok(FilterOperator::NotEq),
            "like" => Ok(FilterOperator::Like),
            "in" => Ok(FilterOperator::In),
            "not in" => Ok(FilterOperator::NotIn),
            other => Err(format!("Unsupported filter operator: {}", other)),
        }
    }
}

/// One `[doctype, field, operator, value]` condition. Serialized in the same
/// four-element array form the list views store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FilterTuple", into = "FilterTuple")]
pub struct FilterCondition {
    pub doctype: String,
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

type FilterTuple = (String, String, String, Value);

impl FilterCondition {
    pub fn eq(doctype: impl Into<String>, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            doctype: doctype.into(),
            field: field.into(),
            operator: FilterOperator::Eq,
            value: value.into(),
        }
    }
}

impl TryFrom<FilterTuple> for FilterCondition {
    type Error = String;

    fn try_from((doctype, field, operator, value): FilterTuple) -> Result<Self, Self::Error> {
        let operator: FilterOperator = operator.parse()?;
        if matches!(operator, FilterOperator::In | FilterOperator::NotIn) && !value.is_array() {
            return Err(format!("Operator '{}' expects a list value", operator));
        }
        Ok(Self {
            doctype,
            field,
            operator,
            value,
        })
    }
}

impl From<FilterCondition> for FilterTuple {
    fn from(condition: FilterCondition) -> Self {
        (
            condition.doctype,
            condition.field,
            condition.operator.as_str().to_string(),
            condition.value,
        )
    }
}
