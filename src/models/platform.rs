use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Payment gateways that post webhooks to the ingestion endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Vega,
    GgCheckout,
    AmploPay,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Vega, Platform::GgCheckout, Platform::AmploPay];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Vega => "vega",
            Platform::GgCheckout => "ggcheckout",
            Platform::AmploPay => "amplopay",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "vega" | "vegacheckout" => Ok(Platform::Vega),
            "ggcheckout" | "gg" => Ok(Platform::GgCheckout),
            "amplopay" | "amplo" => Ok(Platform::AmploPay),
            _ => Err(format!("unsupported platform '{}'", s.trim())),
        }
    }
}
