/*
Result records shared by both oracles and the output layer, plus the input
normalizer that turns whatever the user typed into a bare host name.
*/
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use url::{Host, Url};

use crate::error::CheckError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    Blocked,
    NotBlocked,
}

impl BlockStatus {
    fn as_api_str(self) -> &'static str {
        match self {
            BlockStatus::Blocked => "blocked",
            BlockStatus::NotBlocked => "not blocked",
        }
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockStatus::Blocked => f.write_str("Blocked"),
            BlockStatus::NotBlocked => f.write_str("Not Blocked"),
        }
    }
}

impl Serialize for BlockStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_api_str())
    }
}

// The API's own verdict is authoritative; anything but "blocked" means reachable.
impl<'de> Deserialize<'de> for BlockStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().eq_ignore_ascii_case("blocked") {
            Ok(BlockStatus::Blocked)
        } else {
            Ok(BlockStatus::NotBlocked)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainStatus {
    pub domain: String,
    pub status: BlockStatus,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub ip: Option<String>,
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Domain: {} | Status: {}", self.domain, self.status)?;
        if let Some(ip) = &self.ip {
            write!(f, " | IP: {ip}")?;
        }
        Ok(())
    }
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|ip| !ip.trim().is_empty()))
}

/// Reduces a domain or URL to its host name. Inputs without a scheme are
/// read as `https://` URLs.
pub fn normalize_host(input: &str) -> Result<String, CheckError> {
    let trimmed = input.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|source| CheckError::Parse {
        input: input.to_string(),
        source,
    })?;

    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => String::new(),
    };
    if host.is_empty() {
        return Err(CheckError::EmptyHost(input.to_string()));
    }
    Ok(host)
}
