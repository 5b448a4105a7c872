//! Configuration profiles for different run environments.

/// Base defaults to start from before layering overrides on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Profile {
    /// Interactive local use: verbose logging, small batch sizes.
    #[serde(rename = "development")]
    Development,

    /// Production-like but with debug features still reachable.
    #[serde(rename = "staging")]
    Staging,

    /// Optimized for steady-state daemon operation.
    #[serde(rename = "production")]
    Production,

    /// Minimal setup for fast test runs.
    #[serde(rename = "test")]
    Test,
}

impl Default for Profile {
    fn default() -> Self {
        Self::Development
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Test => "test",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for Profile {
    type Err = crate::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(crate::ConfigError::InvalidProfile(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_aliases() {
        assert_eq!("dev".parse::<Profile>().unwrap(), Profile::Development);
        assert_eq!("prod".parse::<Profile>().unwrap(), Profile::Production);
    }

    #[test]
    fn rejects_unknown_profile() {
        assert!("nonsense".parse::<Profile>().is_err());
    }
}
