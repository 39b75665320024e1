use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use gemledger_core::{DomainError, DomainResult, EntityId};

/// Lot transaction identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub EntityId);

impl TransactionId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Carats leave the lot.
    Sale,
    /// Carats come back into the lot.
    Return,
    /// Carats change location; the lot balance is unaffected.
    Transfer,
}

impl TransactionKind {
    /// Signed change to a lot's remaining carats.
    pub fn carat_effect(self, carats: f64) -> f64 {
        match self {
            TransactionKind::Sale => -carats,
            TransactionKind::Return => carats,
            TransactionKind::Transfer => 0.0,
        }
    }

    /// Sales and returns always involve a counterparty.
    pub fn requires_customer(self) -> bool {
        matches!(self, TransactionKind::Sale | TransactionKind::Return)
    }
}

/// One movement against a lot (immutable once recorded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotTransaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub carats: f64,
    pub handler: String,
    #[serde(default)]
    pub customer: Option<String>,
    /// Price in smallest currency unit (sales only, optional).
    #[serde(default)]
    pub price: Option<u64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl LotTransaction {
    pub fn new(kind: TransactionKind, date: NaiveDate, carats: f64, handler: impl Into<String>) -> Self {
        Self {
            id: TransactionId::new(EntityId::new()),
            kind,
            date,
            carats,
            handler: handler.into(),
            customer: None,
            price: None,
            notes: None,
        }
    }

    pub fn with_id(mut self, id: TransactionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    pub fn with_price(mut self, price: u64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Field-level checks that do not depend on the lot's balance.
    pub fn validate(&self) -> DomainResult<()> {
        if !(self.carats.is_finite() && self.carats > 0.0) {
            return Err(DomainError::validation("carats must be greater than 0"));
        }
        if self.handler.trim().is_empty() {
            return Err(DomainError::validation("handler is required"));
        }
        if self.kind.requires_customer()
            && self.customer.as_deref().is_none_or(|c| c.trim().is_empty())
        {
            return Err(DomainError::validation(format!(
                "customer is required for {:?} transactions",
                self.kind
            )));
        }
        Ok(())
    }
}
