//! Analysis configuration files (JSON).
//!
//! Every field is optional; missing fields take their defaults. The loaded
//! config is validated before it is returned.

use std::fs::File;
use std::path::Path;

use crate::domain::AnalysisConfig;
use crate::error::AppError;

pub fn read_config_json(path: &Path) -> Result<AnalysisConfig, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open config JSON '{}': {e}", path.display())))?;
    parse_config(file)
}

pub fn parse_config<R: std::io::Read>(reader: R) -> Result<AnalysisConfig, AppError> {
    let config: AnalysisConfig =
        serde_json::from_reader(reader).map_err(|e| AppError::new(2, format!("Invalid config JSON: {e}")))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Metric, ModelSpec, SelectionCriterion};

    #[test]
    fn partial_config_fills_defaults() {
        let json = r#"{ "metric": "isc", "criterion": "rmse", "models": [{"kind": "physical"}, {"kind": "polynomial", "degree": 3}], "default_model": "physical" }"#;
        let config = parse_config(json.as_bytes()).unwrap();
        assert_eq!(config.metric, Metric::Isc);
        assert_eq!(config.criterion, SelectionCriterion::Rmse);
        assert_eq!(config.models[1], ModelSpec::Polynomial { degree: 3 });
        assert_eq!(config.max_evaluations, AnalysisConfig::default().max_evaluations);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let json = r#"{ "models": [{"kind": "polynomial", "degree": 7}], "default_model": "polynomial_7" }"#;
        let err = parse_config(json.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn malformed_json_is_an_input_error() {
        let err = parse_config("{ not json".as_bytes()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid config JSON"));
    }
}
