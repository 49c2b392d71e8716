use anyhow::Result;
use regex::{Captures, Regex};
use std::env;
use tracing::{debug, warn};

const ENV_VAR_PATTERN: &str = r"\$\{(\w+)\}|\$(\w+)";

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME.
///
/// Unset variables keep their placeholder; the validator reports them.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(ENV_VAR_PATTERN)?;
    let mut missing_vars = Vec::new();

    let result = re.replace_all(content, |caps: &Captures| {
        let placeholder = &caps[0];
        let Some(name) = caps.get(1).or_else(|| caps.get(2)) else {
            return placeholder.to_string();
        };
        match env::var(name.as_str()) {
            Ok(value) => {
                debug!(var = name.as_str(), "Substituting environment variable");
                value
            }
            Err(_) => {
                warn!("Environment variable '{}' not set", name.as_str());
                missing_vars.push(name.as_str().to_string());
                placeholder.to_string()
            }
        }
    });

    if !missing_vars.is_empty() {
        debug!(?missing_vars, "Environment variables left unresolved");
    }

    Ok(result.into_owned())
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    Regex::new(ENV_VAR_PATTERN).map_or(false, |re| re.is_match(content))
}
