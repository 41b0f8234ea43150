//! Bundled scenarios.
//!
//! - [`api`]: JSONPlaceholder REST checks, one HTTP client per scenario
//! - [`storefront`]: Demoblaze UI journeys, one browser session per scenario

pub mod api;
pub mod storefront;

use std::fmt;
use std::str::FromStr;

/// Which bundled feature(s) to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Suite {
    /// REST scenarios only
    Api,
    /// UI scenarios only
    Storefront,
    /// Both, API first
    #[default]
    All,
}

impl Suite {
    /// Whether the API feature is included
    #[must_use]
    pub const fn includes_api(self) -> bool {
        matches!(self, Self::Api | Self::All)
    }

    /// Whether the storefront feature is included
    #[must_use]
    pub const fn includes_storefront(self) -> bool {
        matches!(self, Self::Storefront | Self::All)
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Api => "api",
            Self::Storefront => "storefront",
            Self::All => "all",
        })
    }
}

impl FromStr for Suite {
    type Err = crate::VigiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "storefront" | "ui" => Ok(Self::Storefront),
            "all" => Ok(Self::All),
            other => Err(crate::VigiaError::config(format!(
                "unknown suite '{other}' (expected api, storefront or all)"
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_parse_and_membership() {
        assert_eq!("UI".parse::<Suite>().unwrap(), Suite::Storefront);
        assert!(Suite::All.includes_api() && Suite::All.includes_storefront());
        assert!(!Suite::Api.includes_storefront());
        assert!("mobile".parse::<Suite>().is_err());
    }
}
