//! Identity providers and the surface a login flow presents on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enumerated identity source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Apple,
    Google,
    Kakao,
    Naver,
}

/// How a provider's credential reaches the backend session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderPath {
    /// The backend auth layer verifies the provider token natively.
    Direct,
    /// The provider token must be traded for a backend-minted token first.
    Indirect,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Apple,
        Provider::Google,
        Provider::Kakao,
        Provider::Naver,
    ];

    /// Wire name echoed to the token exchange endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Apple => "apple",
            Provider::Google => "google",
            Provider::Kakao => "kakao",
            Provider::Naver => "naver",
        }
    }

    pub fn path(&self) -> ProviderPath {
        match self {
            Provider::Apple | Provider::Google => ProviderPath::Direct,
            Provider::Kakao | Provider::Naver => ProviderPath::Indirect,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apple" => Ok(Provider::Apple),
            "google" => Ok(Provider::Google),
            "kakao" => Ok(Provider::Kakao),
            "naver" => Ok(Provider::Naver),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// The host surface a provider flow is presented from.
///
/// Apple only needs a window anchor for its system sheet. Google presents its
/// own UI and needs a full displayable surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationContext {
    /// A window anchor for system authorization sheets.
    Anchor { window_id: String },
    /// A displayable surface that can present provider UI modally.
    Surface {
        window_id: String,
        surface_id: String,
    },
}

impl PresentationContext {
    pub fn anchor(window_id: impl Into<String>) -> Self {
        PresentationContext::Anchor {
            window_id: window_id.into(),
        }
    }

    pub fn surface(window_id: impl Into<String>, surface_id: impl Into<String>) -> Self {
        PresentationContext::Surface {
            window_id: window_id.into(),
            surface_id: surface_id.into(),
        }
    }

    pub fn window_id(&self) -> &str {
        match self {
            PresentationContext::Anchor { window_id } => window_id,
            PresentationContext::Surface { window_id, .. } => window_id,
        }
    }

    /// Whether provider UI can be presented on top of this context.
    pub fn is_displayable(&self) -> bool {
        matches!(self, PresentationContext::Surface { .. })
    }
}
