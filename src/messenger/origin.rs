//! Origins and origin patterns.

use crate::error::SdkError;
use std::fmt;
use url::Url;

/// A normalized tuple origin: `scheme://host[:port]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin(String);

impl Origin {
    /// Parse any URL string and keep only its origin
    pub fn parse(input: &str) -> Result<Self, SdkError> {
        let url = Url::parse(input)?;
        Self::from_url(&url)
    }

    pub fn from_url(url: &Url) -> Result<Self, SdkError> {
        match url.origin() {
            origin @ url::Origin::Tuple(..) => Ok(Origin(origin.ascii_serialization())),
            url::Origin::Opaque(_) => Err(SdkError::InvalidOrigin(url.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Origin a channel may post to or accept from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPattern {
    /// `*`: any origin. Only acceptable as a send origin.
    Any,
    Exact(Origin),
}

impl OriginPattern {
    /// `*` becomes [`OriginPattern::Any`]; anything else must be a URL
    pub fn parse(input: &str) -> Result<Self, SdkError> {
        if input.trim() == "*" {
            Ok(OriginPattern::Any)
        } else {
            Ok(OriginPattern::Exact(Origin::parse(input)?))
        }
    }

    pub fn exact(url: &Url) -> Result<Self, SdkError> {
        Ok(OriginPattern::Exact(Origin::from_url(url)?))
    }

    pub fn matches(&self, origin: &Origin) -> bool {
        match self {
            OriginPattern::Any => true,
            OriginPattern::Exact(expected) => expected == origin,
        }
    }

    /// Whether a raw event origin string matches; unparseable origins never match
    pub fn matches_str(&self, origin: &str) -> bool {
        match self {
            OriginPattern::Any => true,
            OriginPattern::Exact(expected) => Origin::parse(origin)
                .map(|o| &o == expected)
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for OriginPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginPattern::Any => f.write_str("*"),
            OriginPattern::Exact(origin) => origin.fmt(f),
        }
    }
}
