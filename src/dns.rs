/*
Resolver-based oracle. Queries one ISP name server directly and flags a host as
blocked when its first answer is the filtering sinkhole.
*/
use hickory_resolver::config::{
	LookupIpStrategy, NameServerConfig, Protocol, ResolverConfig, ResolverOpts,
};
use hickory_resolver::Resolver;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use tracing::debug;

use crate::error::CheckError;
use crate::oracle::Oracle;
use crate::types::{BlockStatus, DomainStatus};

/// Telkom's public resolver, which answers filtered names with the sinkhole.
pub const DEFAULT_RESOLVER: &str = "118.98.44.10:53";
pub const SINKHOLE_IP: &str = "36.86.63.185";

pub struct DnsOracle<F> {
	lookup: F,
}

impl<F> DnsOracle<F>
where
	F: Fn(&str) -> Result<Vec<IpAddr>, CheckError>,
{
	pub fn with_lookup(lookup: F) -> Self {
		Self { lookup }
	}
}

impl<F> Oracle for DnsOracle<F>
where
	F: Fn(&str) -> Result<Vec<IpAddr>, CheckError>,
{
	fn check(&self, host: &str) -> Result<DomainStatus, CheckError> {
		let addrs = (self.lookup)(host)?;
		let Some(first) = addrs.first() else {
			return Err(CheckError::NoAddresses(host.to_string()));
		};
		let ip = first.to_string();
		debug!(%host, %ip, answers = addrs.len(), "resolved");

		let status = if ip == SINKHOLE_IP {
			BlockStatus::Blocked
		} else {
			BlockStatus::NotBlocked
		};
		Ok(DomainStatus {
			domain: host.to_string(),
			status,
			ip: Some(ip),
		})
	}
}

/// Builds an oracle that talks only to `resolver` over UDP. The system
/// resolver configuration and hosts file are never consulted, and answers are
/// not cached between checks. AAAA is only asked for when there is no A
/// record, so the first answer is deterministic.
pub fn connect(
	resolver: &str,
) -> Result<DnsOracle<impl Fn(&str) -> Result<Vec<IpAddr>, CheckError>>, CheckError> {
	let addr = resolver_addr(resolver)?;

	let mut config = ResolverConfig::new();
	config.add_name_server(NameServerConfig::new(addr, Protocol::Udp));
	let mut opts = ResolverOpts::default();
	opts.use_hosts_file = false;
	opts.cache_size = 0;
	opts.ip_strategy = LookupIpStrategy::Ipv4thenIpv6;

	let resolver = Resolver::new(config, opts).map_err(CheckError::ResolverSetup)?;
	debug!(%addr, "using resolver");

	Ok(DnsOracle::with_lookup(move |host: &str| {
		let answer = resolver
			.lookup_ip(host)
			.map_err(|source| CheckError::Resolution {
				host: host.to_string(),
				source,
			})?;
		Ok(answer.iter().collect())
	}))
}

fn resolver_addr(resolver: &str) -> Result<SocketAddr, CheckError> {
	if let Ok(addr) = resolver.parse::<SocketAddr>() {
		return Ok(addr);
	}
	resolver
		.to_socket_addrs()
		.ok()
		.and_then(|mut addrs| addrs.next())
		.ok_or_else(|| CheckError::InvalidResolver(resolver.to_string()))
}
