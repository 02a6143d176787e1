//! HTTP balance service client and static capability source.

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, HeaderValue};
use tracing::{debug, warn};

use crate::models::AddressBalance;
use crate::services::{BalanceService, CapabilityConfig, RemoteError};

/// Path of the total balance endpoint, relative to the base URL.
const TOTAL_BALANCE_PATH: &str = "/v1/user/total_balance";

/// Balance service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBalanceService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBalanceService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Full URL of the total balance endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{TOTAL_BALANCE_PATH}", self.base_url)
    }
}

#[async_trait]
impl BalanceService for HttpBalanceService {
    async fn get_address_balance(
        &self,
        account: &str,
        force: bool,
    ) -> Result<AddressBalance, RemoteError> {
        let mut request = self.client.get(self.endpoint()).query(&[("id", account)]);
        if force {
            request = request.header(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        }

        debug!(account, force, "Requesting address balance");
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<AddressBalance>().await?);
        }

        let body = response.text().await?;
        warn!(account, %status, "Balance service returned an error");
        Err(RemoteError::from_payload(&body))
    }
}

/// Capability level fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy)]
pub struct StaticCapability(pub i64);

#[async_trait]
impl CapabilityConfig for StaticCapability {
    async fn api_level(&self) -> crate::Result<i64> {
        Ok(self.0)
    }
}
