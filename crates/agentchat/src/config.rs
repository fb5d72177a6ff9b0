use agentchat_core::AgentError;
use std::env;
use std::time::Duration;

const DEFAULT_MAX_STEPS: usize = 6;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Runner settings read from the environment.
///
/// | variable | meaning |
/// |---|---|
/// | `AGENTCHAT_MODEL` | replaces the descriptor's model id |
/// | `AGENTCHAT_MAX_STEPS` | model calls allowed per run (at least 1) |
/// | `AGENTCHAT_TIMEOUT_SECS` | per model call; `0` disables the limit |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub model_override: Option<String>,
    pub max_steps: usize,
    pub request_timeout: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            model_override: None,
            max_steps: DEFAULT_MAX_STEPS,
            request_timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self, AgentError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(model) = lookup("AGENTCHAT_MODEL") {
            let model = model.trim();
            if !model.is_empty() {
                config.model_override = Some(model.to_string());
            }
        }

        if let Some(raw) = lookup("AGENTCHAT_MAX_STEPS") {
            let steps = raw.trim().parse::<usize>().map_err(|e| {
                AgentError::Validation(format!("invalid AGENTCHAT_MAX_STEPS: {e}"))
            })?;
            if steps == 0 {
                return Err(AgentError::Validation(
                    "AGENTCHAT_MAX_STEPS must be at least 1".to_string(),
                ));
            }
            config.max_steps = steps;
        }

        if let Some(raw) = lookup("AGENTCHAT_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                AgentError::Validation(format!("invalid AGENTCHAT_TIMEOUT_SECS: {e}"))
            })?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = RunnerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RunnerConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = RunnerConfig::from_lookup(lookup(&[
            ("AGENTCHAT_MODEL", " gemini-1.5-flash "),
            ("AGENTCHAT_MAX_STEPS", "3"),
            ("AGENTCHAT_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.model_override.as_deref(), Some("gemini-1.5-flash"));
        assert_eq!(config.max_steps, 3);
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = RunnerConfig::from_lookup(lookup(&[("AGENTCHAT_MAX_STEPS", "0")])).unwrap_err();
        assert!(matches!(err, AgentError::Validation(msg) if msg.contains("at least 1")));

        let err =
            RunnerConfig::from_lookup(lookup(&[("AGENTCHAT_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, AgentError::Validation(msg) if msg.contains("TIMEOUT")));
    }
}
