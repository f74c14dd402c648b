//! Configuration validation.
//!
//! Semantic checks on top of what serde already enforces. Validation is a
//! pure function that reports every problem, not just the first.

use thiserror::Error;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.port must be non-zero")]
    ZeroPort,

    #[error("rate_limit.window_secs must be non-zero")]
    ZeroWindow,

    #[error("rate_limit.hard_limit must be non-zero")]
    ZeroHardLimit,

    #[error("rate_limit.soft_limit ({soft}) must be below hard_limit ({hard})")]
    SoftAboveHard { soft: u32, hard: u32 },

    #[error("pipeline.bypass_paths entry {0:?} must start with '/'")]
    RelativeBypassPath(String),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    let limits = &config.rate_limit;
    if limits.window_secs == 0 {
        errors.push(ValidationError::ZeroWindow);
    }
    if limits.hard_limit == 0 {
        errors.push(ValidationError::ZeroHardLimit);
    }
    if limits.soft_limit >= limits.hard_limit {
        errors.push(ValidationError::SoftAboveHard {
            soft: limits.soft_limit,
            hard: limits.hard_limit,
        });
    }

    for path in &config.pipeline.bypass_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativeBypassPath(path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.rate_limit.soft_limit = 200;
        config.pipeline.bypass_paths.push("health".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroPort,
                ValidationError::SoftAboveHard { soft: 200, hard: 100 },
                ValidationError::RelativeBypassPath("health".into()),
            ]
        );
    }
}
