mod api;
mod dns;
mod error;
mod oracle;
mod token;
mod types;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use serde_json::json;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::CheckError;
use crate::oracle::{Mode, Oracle};
use crate::token::{FileTokenStore, TokenStore};
use crate::types::{normalize_host, DomainStatus};

#[derive(Parser, Debug)]
#[command(
	name = "indiwtf",
	version,
	about = "Check whether domains are blocked in Indonesia"
)]
struct Cli {
	/// Domains or URLs to check
	domains: Vec<String>,
	/// Domain to check (repeatable)
	#[arg(short = 'd', long = "domain", value_name = "DOMAIN")]
	domain_flags: Vec<String>,
	#[arg(short, long, value_enum, default_value_t = Mode::Dns)]
	mode: Mode,
	/// UDP resolver used in dns mode
	#[arg(long, env = "INDIWTF_RESOLVER", default_value = dns::DEFAULT_RESOLVER)]
	resolver: String,
	#[arg(long, env = "INDIWTF_API_URL", default_value = api::DEFAULT_API_URL)]
	api_url: String,
	/// API token; skips the saved config and the prompt
	#[arg(long, env = "INDIWTF_TOKEN", hide_env_values = true)]
	token: Option<String>,
	/// Query the API without a token
	#[arg(long)]
	anonymous: bool,
	/// Token config file [default: ~/.indiwtf/config.json]
	#[arg(long, env = "INDIWTF_CONFIG")]
	config: Option<PathBuf>,
	#[arg(long)]
	json: bool,
	#[arg(short, long)]
	verbose: bool,
}

impl Cli {
	// Positional domains first, then the -d ones.
	fn all_domains(&self) -> Vec<String> {
		self.domains
			.iter()
			.chain(self.domain_flags.iter())
			.cloned()
			.collect()
	}
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	init_logger(cli.verbose);

	let domains = cli.all_domains();
	if domains.is_empty() {
		print_usage(&mut io::stderr())?;
		return Ok(());
	}

	let oracle = build_oracle(&cli)?;
	let stdout = io::stdout();
	let mut out = stdout.lock();
	let failed = check_domains(&domains, oracle.as_ref(), &mut out, cli.json)?;
	info!(total = domains.len(), failed, "done");
	Ok(())
}

fn build_oracle(cli: &Cli) -> Result<Box<dyn Oracle>> {
	match cli.mode {
		Mode::Dns => {
			let oracle = dns::connect(&cli.resolver)
				.with_context(|| format!("setting up resolver {}", cli.resolver))?;
			Ok(Box::new(oracle))
		}
		Mode::Api => {
			let token = if cli.anonymous {
				None
			} else {
				let store = FileTokenStore::new(resolve_config_path(
					cli.config.clone(),
					FileTokenStore::default_path(),
				));
				debug!(path = %store.path().display(), "token config");
				acquire_api_token(cli.token.clone(), &store)?
			};
			let oracle = api::ApiOracle::new(&cli.api_url, token)
				.with_context(|| format!("setting up status API client for {}", cli.api_url))?;
			Ok(Box::new(oracle))
		}
	}
}

fn acquire_api_token(explicit: Option<String>, store: &dyn TokenStore) -> Result<Option<String>> {
	let stdin = io::stdin();
	let token = token::acquire_token(explicit, store, stdin.lock(), io::stderr())
		.context("reading API token")?;
	Ok(token)
}

fn print_usage<W: Write>(err: &mut W) -> io::Result<()> {
	writeln!(err, "{}", Cli::command().render_help())
}

// Without a home directory the config lands under the working directory.
fn resolve_config_path(config: Option<PathBuf>, home_default: Option<PathBuf>) -> PathBuf {
	if let Some(path) = config {
		return path;
	}
	home_default.unwrap_or_else(|| token::config_path_in(Path::new(".")))
}

/// Checks every domain in order and writes one line per domain. Per-domain
/// failures become `Error ...` lines; only write failures abort the batch.
/// Returns how many domains failed.
fn check_domains<W: Write>(
	domains: &[String],
	oracle: &dyn Oracle,
	out: &mut W,
	json: bool,
) -> Result<usize> {
	let mut failed = 0;
	for raw in domains {
		match check_one(raw, oracle) {
			Ok(status) => output(out, json, &status)?,
			Err(err) => {
				failed += 1;
				debug!(domain = %raw, kind = ?err.kind(), %err, "check failed");
				output_error(out, json, raw, &err)?;
			}
		}
	}
	Ok(failed)
}

fn check_one(raw: &str, oracle: &dyn Oracle) -> Result<DomainStatus, CheckError> {
	let host = normalize_host(raw)?;
	oracle.check(&host)
}

fn output<W: Write>(out: &mut W, json: bool, status: &DomainStatus) -> Result<()> {
	if json {
		writeln!(out, "{}", serde_json::to_string(status)?)?;
		return Ok(());
	}
	writeln!(out, "{status}")?;
	Ok(())
}

fn output_error<W: Write>(out: &mut W, json: bool, raw: &str, err: &CheckError) -> Result<()> {
	if json {
		let payload = json!({ "domain": raw, "error": err.to_string() });
		writeln!(out, "{payload}")?;
		return Ok(());
	}
	writeln!(out, "Error {err}")?;
	Ok(())
}

fn init_logger(verbose: bool) {
	let default = if verbose { "indiwtf=debug" } else { "indiwtf=warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

	tracing_subscriber::registry()
		.with(filter)
		.with(
			tracing_subscriber::fmt::layer()
				.with_writer(io::stderr)
				.with_target(false)
				.compact(),
		)
		.init();
}
