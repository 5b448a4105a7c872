//! Transport mechanism for MCP protocol communication.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Standard input/output - the default for a process launched by an MCP client.
    #[value(name = "stdio")]
    #[default]
    Stdio,

    /// Server-Sent Events over HTTP, for clients that speak MCP-over-SSE.
    #[value(name = "sse")]
    Sse,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Sse => write!(f, "sse"),
        }
    }
}

impl std::str::FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "sse" => Ok(Self::Sse),
            other => Err(format!("invalid transport: '{other}'. Valid options are: stdio, sse")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("STDIO".parse::<Transport>().unwrap(), Transport::Stdio);
        assert_eq!("sse".parse::<Transport>().unwrap(), Transport::Sse);
        assert!("carrier-pigeon".parse::<Transport>().is_err());
    }

    #[test]
    fn displays_lowercase() {
        assert_eq!(Transport::Stdio.to_string(), "stdio");
        assert_eq!(Transport::Sse.to_string(), "sse");
    }
}
