/*
Status-API oracle. The remote service performs the blocking check itself; this
side only builds the query, sends it once and decodes the verdict.
*/
use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use crate::error::CheckError;
use crate::oracle::Oracle;
use crate::types::DomainStatus;

pub const DEFAULT_API_URL: &str = "https://indiwtf.upset.dev/api/check";
pub const USER_AGENT: &str = "indiwtf-cli/1.0";

pub struct ApiOracle {
	client: Client,
	base_url: Url,
	token: Option<String>,
}

impl ApiOracle {
	pub fn new(base_url: &str, token: Option<String>) -> Result<Self, CheckError> {
		// Proxy settings come from the environment (HTTP_PROXY, HTTPS_PROXY, NO_PROXY).
		let client = Client::builder().user_agent(USER_AGENT).build()?;
		Self::with_client(client, base_url, token)
	}

	pub fn with_client(client: Client, base_url: &str, token: Option<String>) -> Result<Self, CheckError> {
		let base_url = Url::parse(base_url).map_err(|source| CheckError::Parse {
			input: base_url.to_string(),
			source,
		})?;
		Ok(Self {
			client,
			base_url,
			token: token.filter(|t| !t.is_empty()),
		})
	}

	fn request_url(&self, host: &str) -> Url {
		let mut url = self.base_url.clone();
		{
			let mut query = url.query_pairs_mut();
			query.append_pair("domain", host);
			if let Some(token) = &self.token {
				query.append_pair("token", token);
			}
		}
		url
	}
}

impl Oracle for ApiOracle {
	fn check(&self, host: &str) -> Result<DomainStatus, CheckError> {
		let url = self.request_url(host);
		debug!(%host, authenticated = self.token.is_some(), "querying status API");

		let response = self.client.get(url).send()?;
		let status = response.status();
		if !status.is_success() {
			return Err(CheckError::HttpStatus(status));
		}

		let body = response.text()?;
		let result: DomainStatus = serde_json::from_str(&body)?;
		Ok(result)
	}
}
