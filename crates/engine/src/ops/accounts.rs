//! Account registry operations.
//!
//! Accounts are created and renamed here, but their cached balance is never
//! written by these operations; only the ledger writes in
//! `ops::transactions` may touch it.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{Account, MoneyCents, ResultEngine, accounts};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Add a new account for a user.
    ///
    /// The balance starts at zero; an opening balance is entered afterwards
    /// as an ordinary transaction so the balance always stays derivable from
    /// the ledger.
    pub async fn new_account(
        &self,
        name: &str,
        currency: &str,
        description: Option<&str>,
        user_id: &str,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        let name = normalize_required_name(name, "account")?;
        let currency = normalize_required_name(currency, "currency")?;
        let description = normalize_optional_text(description);
        with_tx!(self, |db_tx| {
            let account = Account::new(
                name,
                currency,
                description,
                user_id.to_string(),
                created_at,
            );
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            Ok(account)
        })
    }

    /// Return an account snapshot.
    pub async fn account(&self, account_id: Uuid, user_id: &str) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;
            Account::try_from(model)
        })
    }

    /// Lists a user's non-deleted accounts, newest first.
    pub async fn list_accounts(&self, user_id: &str) -> ResultEngine<Vec<Account>> {
        with_tx!(self, |db_tx| {
            let models = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id))
                .filter(accounts::Column::Deleted.eq(false))
                .order_by_desc(accounts::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Account::try_from).collect()
        })
    }

    /// Renames an account and/or replaces its description.
    ///
    /// Balance and currency are deliberately not editable here.
    pub async fn update_account(
        &self,
        account_id: Uuid,
        name: &str,
        description: Option<&str>,
        user_id: &str,
        updated_at: DateTime<Utc>,
    ) -> ResultEngine<Account> {
        let name = normalize_required_name(name, "account")?;
        let description = normalize_optional_text(description);
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;

            let active = accounts::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                name: ActiveValue::Set(name.clone()),
                description: ActiveValue::Set(description.clone()),
                updated_at: ActiveValue::Set(Some(updated_at)),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            let mut account = Account::try_from(model)?;
            account.name = name;
            account.description = description;
            account.updated_at = Some(updated_at);
            Ok(account)
        })
    }

    /// Soft-deletes an account.
    ///
    /// The row stays in storage as a tombstone; it disappears from lists,
    /// totals, and statistics.
    pub async fn delete_account(
        &self,
        account_id: Uuid,
        user_id: &str,
        deleted_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_account(&db_tx, account_id, user_id).await?;

            let active = accounts::ActiveModel {
                id: ActiveValue::Set(model.id),
                deleted: ActiveValue::Set(true),
                updated_at: ActiveValue::Set(Some(deleted_at)),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Sum of cached balances over a user's non-deleted accounts.
    ///
    /// Authoritative total for the owner; the per-account caches it sums are
    /// cross-checked against the ledger by `recompute_balances`.
    pub async fn total_balance(&self, user_id: &str) -> ResultEngine<MoneyCents> {
        with_tx!(self, |db_tx| {
            let models = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id))
                .filter(accounts::Column::Deleted.eq(false))
                .all(&db_tx)
                .await?;
            let total: i64 = models.iter().map(|m| m.balance_minor).sum();
            Ok(MoneyCents::new(total))
        })
    }
}
