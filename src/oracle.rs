use clap::ValueEnum;

use crate::error::CheckError;
use crate::types::DomainStatus;

/// Decides whether a normalized host is blocked.
pub trait Oracle {
	fn check(&self, host: &str) -> Result<DomainStatus, CheckError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
	/// Resolve through the ISP resolver and compare against the sinkhole address
	Dns,
	/// Ask the remote status API
	Api,
}
