//! Controller APIs return device lists either bare or wrapped as
//! `{"data": [...]}`; both are accepted everywhere a list is expected.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ParseError, Result};

pub(crate) fn parse_list<T: DeserializeOwned>(input: &str) -> Result<Vec<T>> {
    let items = match serde_json::from_str::<Value>(input)? {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Value::Array(items),
            _ => return Err(expected_list()),
        },
        _ => return Err(expected_list()),
    };

    Ok(serde_json::from_value(items)?)
}

fn expected_list() -> ParseError {
    ParseError::UnexpectedShape(
        "expected a JSON array or an object with a `data` array".to_string(),
    )
}
