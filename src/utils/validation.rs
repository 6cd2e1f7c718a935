use crate::utils::error::{BuildError, Result};
use regex::Regex;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(BuildError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(BuildError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(BuildError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BuildError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 套件目錄名稱必須是單一路徑元件，同時也是 Python 模組名稱
pub fn validate_package_name(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| BuildError::ConfigError {
        message: e.to_string(),
    })?;
    if !re.is_match(value) {
        return Err(BuildError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Must be a valid Python identifier without path separators".to_string(),
        });
    }
    Ok(())
}

/// proto package 名稱，例如 `mlens.v1`
pub fn validate_namespace(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").map_err(|e| {
        BuildError::ConfigError {
            message: e.to_string(),
        }
    })?;
    if !re.is_match(value) {
        return Err(BuildError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Must be a dot-separated protobuf package name".to_string(),
        });
    }
    Ok(())
}
