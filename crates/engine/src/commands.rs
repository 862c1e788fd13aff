//! Command structs for engine operations.
//!
//! These types group parameters for ledger write operations
//! (create/update transaction), keeping call sites readable and avoiding
//! long argument lists.
//!
//! Every command carries the instant used for audit stamping, so callers own
//! the clock and tests stay deterministic.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::TransactionKind;

/// Create a new transaction and apply its effect to the target account.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub user_id: String,
    pub amount_minor: i64,
    pub description: String,
    pub occurred_on: NaiveDate,
    pub kind: TransactionKind,
    pub notes: Option<String>,
    pub category_id: Uuid,
    pub account_id: Uuid,
    /// Instant stamped on the new transaction and the touched account.
    pub created_at: DateTime<Utc>,
}

impl CreateTransactionCmd {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        kind: TransactionKind,
        amount_minor: i64,
        occurred_on: NaiveDate,
        category_id: Uuid,
        account_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            amount_minor,
            description: String::new(),
            occurred_on,
            kind,
            notes: None,
            category_id,
            account_id,
            created_at,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Rewrite an existing transaction, reverting its old balance effect and
/// applying the new one.
///
/// The transaction kind is immutable; there is deliberately no `kind` field
/// here. All other fields are full replacements, not patches.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub transaction_id: Uuid,
    pub user_id: String,
    pub amount_minor: i64,
    pub description: String,
    pub occurred_on: NaiveDate,
    pub notes: Option<String>,
    pub category_id: Uuid,
    pub account_id: Uuid,
    /// Instant stamped on the transaction and every touched account.
    pub updated_at: DateTime<Utc>,
}

impl UpdateTransactionCmd {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        transaction_id: Uuid,
        user_id: impl Into<String>,
        amount_minor: i64,
        occurred_on: NaiveDate,
        category_id: Uuid,
        account_id: Uuid,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id,
            user_id: user_id.into(),
            amount_minor,
            description: String::new(),
            occurred_on,
            notes: None,
            category_id,
            account_id,
            updated_at,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}
