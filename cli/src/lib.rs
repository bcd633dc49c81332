use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("Invalid parameter '{0}': expected name=value")]
    MalformedParam(String),
    #[error("Parameter name must not be empty in '{0}'")]
    EmptyParamName(String),
}

/// Parse `name=value`; values become integers, then floats, otherwise strings
pub fn parse_param(raw: &str) -> Result<(String, Value), CliError> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| CliError::MalformedParam(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::EmptyParamName(raw.to_string()));
    }

    let value = value.trim();
    let value = if let Ok(int) = value.parse::<i64>() {
        Value::from(int)
    } else if let Some(float) = value.parse::<f64>().ok().filter(|f| f.is_finite()) {
        Value::from(float)
    } else {
        Value::from(value)
    };
    Ok((name.to_string(), value))
}

/// Collect repeated `--param` arguments; later duplicates win
pub fn params_to_map<I, S>(raw: I) -> Result<Map<String, Value>, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|param| parse_param(param.as_ref()))
        .collect()
}
