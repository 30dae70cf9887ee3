//! Optional credit gate consulted before a generation runs.

use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum CreditError {
    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("insufficient credit for {user}: balance {balance}, needed {needed}")]
    Insufficient {
        user: String,
        balance: u64,
        needed: u64,
    },

    #[error("credit ledger unavailable: {0}")]
    Unavailable(String),
}

/// Credit collaborator.
#[async_trait::async_trait]
pub trait CreditLedger: Send + Sync {
    async fn has_sufficient_credit(&self, user_id: &str, amount: u64) -> Result<bool, CreditError>;

    async fn debit(&self, user_id: &str, amount: u64) -> Result<(), CreditError>;
}

/// Ledger that never says no.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedCredits;

#[async_trait::async_trait]
impl CreditLedger for UnlimitedCredits {
    async fn has_sufficient_credit(&self, _user_id: &str, _amount: u64) -> Result<bool, CreditError> {
        Ok(true)
    }

    async fn debit(&self, _user_id: &str, _amount: u64) -> Result<(), CreditError> {
        Ok(())
    }
}

/// In-process balances, for tests and single-user setups.
#[derive(Debug, Default)]
pub struct MemoryCredits {
    balances: Mutex<HashMap<String, u64>>,
}

impl MemoryCredits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, user_id: &str, balance: u64) -> Self {
        self.balances
            .get_mut()
            .insert(user_id.to_string(), balance);
        self
    }

    pub async fn balance(&self, user_id: &str) -> Option<u64> {
        self.balances.lock().await.get(user_id).copied()
    }
}

#[async_trait::async_trait]
impl CreditLedger for MemoryCredits {
    async fn has_sufficient_credit(&self, user_id: &str, amount: u64) -> Result<bool, CreditError> {
        let balances = self.balances.lock().await;
        let balance = balances
            .get(user_id)
            .ok_or_else(|| CreditError::UnknownUser(user_id.to_string()))?;
        Ok(*balance >= amount)
    }

    async fn debit(&self, user_id: &str, amount: u64) -> Result<(), CreditError> {
        let mut balances = self.balances.lock().await;
        let balance = balances
            .get_mut(user_id)
            .ok_or_else(|| CreditError::UnknownUser(user_id.to_string()))?;
        if *balance < amount {
            return Err(CreditError::Insufficient {
                user: user_id.to_string(),
                balance: *balance,
                needed: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }
}
