//! Ownership-scoped entity resolution.
//!
//! Every operation is implicitly filtered by the owning user; these helpers
//! are the single place that filter is spelled, together with the soft-delete
//! tombstone filter, so no read path can forget either.

use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, accounts, categories, transactions};

use super::Engine;

impl Engine {
    /// Resolve an account that is non-deleted and owned by `user_id`.
    ///
    /// Absent and not-owned are deliberately indistinguishable to the caller.
    pub(super) async fn require_account(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(account_id.to_string())
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::Deleted.eq(false))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("account not exists".to_string()))
    }

    /// Resolve a category that is non-deleted and owned by `user_id`.
    pub(super) async fn require_category(
        &self,
        db_tx: &DatabaseTransaction,
        category_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id.to_string())
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Deleted.eq(false))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("category not exists".to_string()))
    }

    /// Resolve a live (non-deleted) transaction owned by `user_id`.
    ///
    /// Soft-deleted rows resolve as `NotFound`, which is what gates balance
    /// reversal to exactly once per transaction.
    pub(super) async fn require_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::Deleted.eq(false))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("transaction not exists".to_string()))
    }
}
