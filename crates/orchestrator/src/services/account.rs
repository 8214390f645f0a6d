//! Account service trait, HTTP client and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::AccountId;
use domain::Account;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{ServiceError, http_client, join_segments, parse_base_url};

/// Lookup of accounts owned by the account service.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Returns the account, or `ServiceError::NotFound` if it does not exist.
    async fn get_account(&self, id: &AccountId) -> Result<Account, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    id: String,
    name: String,
}

/// Account service client speaking JSON over HTTP.
///
/// `GET {base}/accounts/{id}` answers `200 {"id", "name"}` or `404`.
#[derive(Debug, Clone)]
pub struct HttpAccountService {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl HttpAccountService {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        Ok(Self {
            client: http_client()?,
            base_url: parse_base_url(base_url)?,
        })
    }
}

#[async_trait]
impl AccountService for HttpAccountService {
    #[tracing::instrument(skip(self, id), fields(account_id = %id))]
    async fn get_account(&self, id: &AccountId) -> Result<Account, ServiceError> {
        let url = join_segments(&self.base_url, &["accounts", id.as_str()]);
        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ServiceError::NotFound(format!("account {id}"))),
            status if !status.is_success() => Err(ServiceError::Unavailable(format!(
                "account service returned {status}"
            ))),
            _ => {
                let body: AccountResponse = response
                    .json()
                    .await
                    .map_err(|e| ServiceError::Decode(e.to_string()))?;
                Ok(Account::new(body.id, body.name))
            }
        }
    }
}

/// In-memory account service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountService {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
    fail: Arc<AtomicBool>,
    delay_ms: Arc<AtomicU64>,
    calls: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
}

impl InMemoryAccountService {
    /// Creates a new in-memory account service with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account.
    pub async fn insert(&self, account: Account) {
        self.accounts
            .write()
            .await
            .insert(account.id.clone(), account);
    }

    /// Makes every lookup fail as if the service were down.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Delays every lookup, to exercise deadlines and cancellation.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of lookups started.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of lookups that ran to completion (were not cancelled).
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountService for InMemoryAccountService {
    async fn get_account(&self, id: &AccountId) -> Result<Account, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("account service down".to_string()));
        }

        self.accounts
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("account {id}")))
    }
}
