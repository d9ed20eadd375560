use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a failed check, independent of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Resolution,
    Transport,
    Decode,
    Io,
}

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("parsing URL {input}: {source}")]
    Parse {
        input: String,
        source: url::ParseError,
    },

    #[error("parsing URL {0}: no host name")]
    EmptyHost(String),

    #[error("invalid resolver address {0}")]
    InvalidResolver(String),

    #[error("resolving IP address for {host}: {source}")]
    Resolution {
        host: String,
        source: hickory_resolver::error::ResolveError,
    },

    #[error("resolving IP address for {0}: no IP addresses found")]
    NoAddresses(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("status API answered HTTP {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("decoding status response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("building resolver: {0}")]
    ResolverSetup(std::io::Error),

    #[error("config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CheckError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckError::Parse { .. } | CheckError::EmptyHost(_) => ErrorKind::Parse,
            CheckError::InvalidResolver(_)
            | CheckError::Resolution { .. }
            | CheckError::NoAddresses(_) => ErrorKind::Resolution,
            CheckError::Transport(_) | CheckError::HttpStatus(_) => ErrorKind::Transport,
            CheckError::Decode(_) => ErrorKind::Decode,
            CheckError::ResolverSetup(_) | CheckError::Io { .. } => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variant_families() {
        assert_eq!(CheckError::EmptyHost("x".into()).kind(), ErrorKind::Parse);
        assert_eq!(CheckError::NoAddresses("x".into()).kind(), ErrorKind::Resolution);
        assert_eq!(
            CheckError::HttpStatus(reqwest::StatusCode::BAD_GATEWAY).kind(),
            ErrorKind::Transport
        );
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(CheckError::from(decode).kind(), ErrorKind::Decode);
    }

    #[test]
    fn io_error_names_the_file() {
        let err = CheckError::Io {
            path: PathBuf::from("/tmp/indiwtf/config.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "config file /tmp/indiwtf/config.json: denied");
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
