//! Ledger write operations and transaction reads.
//!
//! Every write here mutates the cached account balance in the same DB
//! transaction as the ledger row, which is what keeps the balance invariant
//! (cached balance == sum of live transaction effects) intact under crashes
//! and concurrent edits.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};

use crate::{
    CreateTransactionCmd, DateRange, EngineError, MoneyCents, ResultEngine, Transaction,
    TransactionKind, UpdateTransactionCmd, accounts, categories, transactions,
};

use super::{Engine, with_tx};

/// A transaction joined with the names of its category and account.
///
/// This is the read shape for lists and dashboards; the bare [`Transaction`]
/// stays the write-side type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: Uuid,
    pub amount: MoneyCents,
    pub description: String,
    pub occurred_on: NaiveDate,
    pub kind: TransactionKind,
    pub notes: Option<String>,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_icon: String,
    pub category_color: String,
    pub account_id: Uuid,
    pub account_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Optional filters for [`Engine::list_transactions`]. All bounds are
/// inclusive; a default filter lists everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransactionListFilter {
    pub kind: Option<TransactionKind>,
    pub category_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<u64>,
}

/// One account whose cached balance disagreed with the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    pub account_id: Uuid,
    pub cached: MoneyCents,
    pub derived: MoneyCents,
}

fn view(tx: Transaction, category: &categories::Model, account: &accounts::Model) -> TransactionView {
    TransactionView {
        id: tx.id,
        amount: tx.amount,
        description: tx.description,
        occurred_on: tx.occurred_on,
        kind: tx.kind,
        notes: tx.notes,
        category_id: tx.category_id,
        category_name: category.name.clone(),
        category_icon: category.icon.clone().unwrap_or_default(),
        category_color: category.color.clone(),
        account_id: tx.account_id,
        account_name: account.name.clone(),
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    }
}

/// Fetch an account row without the tombstone filter.
///
/// Reverting a ledger effect must reach the account even after it was
/// soft-deleted, otherwise the tombstoned balance drifts from the ledger.
async fn account_row(
    db_tx: &DatabaseTransaction,
    account_id: &str,
    user_id: &str,
) -> ResultEngine<accounts::Model> {
    accounts::Entity::find_by_id(account_id.to_string())
        .filter(accounts::Column::UserId.eq(user_id))
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound("account not exists".to_string()))
}

async fn category_row(
    db_tx: &DatabaseTransaction,
    category_id: &str,
    user_id: &str,
) -> ResultEngine<categories::Model> {
    categories::Entity::find_by_id(category_id.to_string())
        .filter(categories::Column::UserId.eq(user_id))
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound("category not exists".to_string()))
}

fn balance_overflow() -> EngineError {
    EngineError::InvalidAmount("account balance overflow".to_string())
}

fn apply_effect(balance: MoneyCents, effect: MoneyCents) -> ResultEngine<MoneyCents> {
    balance.checked_add(effect).ok_or_else(balance_overflow)
}

fn revert_effect(balance: MoneyCents, effect: MoneyCents) -> ResultEngine<MoneyCents> {
    balance.checked_sub(effect).ok_or_else(balance_overflow)
}

async fn write_balance(
    db_tx: &DatabaseTransaction,
    account_id: String,
    balance_minor: i64,
    stamp: DateTime<Utc>,
) -> ResultEngine<()> {
    let active = accounts::ActiveModel {
        id: ActiveValue::Set(account_id),
        balance_minor: ActiveValue::Set(balance_minor),
        updated_at: ActiveValue::Set(Some(stamp)),
        ..Default::default()
    };
    active.update(db_tx).await?;
    Ok(())
}

fn require_kind_match(
    category: &categories::Model,
    kind: TransactionKind,
) -> ResultEngine<()> {
    let category_kind = TransactionKind::try_from(category.kind.as_str())?;
    if category_kind != kind {
        return Err(EngineError::TypeMismatch(format!(
            "category '{}' is {} but the transaction is {}",
            category.name,
            category_kind.as_str(),
            kind.as_str()
        )));
    }
    Ok(())
}

impl Engine {
    /// Records a transaction and applies its effect to the account balance.
    ///
    /// Fails without side effects when the amount is not positive, the
    /// account or category is missing, or the category kind disagrees with
    /// the transaction kind.
    pub async fn create_transaction(
        &self,
        cmd: CreateTransactionCmd,
    ) -> ResultEngine<TransactionView> {
        with_tx!(self, |db_tx| {
            let account = self
                .require_account(&db_tx, cmd.account_id, &cmd.user_id)
                .await?;
            let category = self
                .require_category(&db_tx, cmd.category_id, &cmd.user_id)
                .await?;
            require_kind_match(&category, cmd.kind)?;

            let transaction = Transaction::new(
                cmd.user_id.clone(),
                cmd.amount_minor,
                cmd.description.clone(),
                cmd.occurred_on,
                cmd.kind,
                cmd.notes.clone(),
                cmd.category_id,
                cmd.account_id,
                cmd.created_at,
            )?;
            transactions::ActiveModel::from(&transaction)
                .insert(&db_tx)
                .await?;

            let balance =
                apply_effect(MoneyCents::new(account.balance_minor), transaction.effect())?;
            write_balance(&db_tx, account.id.clone(), balance.cents(), cmd.created_at).await?;

            tracing::debug!(
                transaction_id = %transaction.id,
                account_id = %account.id,
                balance_minor = balance.cents(),
                "transaction recorded"
            );
            Ok(view(transaction, &category, &account))
        })
    }

    /// Rewrites a transaction, moving its balance effect accordingly.
    ///
    /// The old effect is reverted on the old account and the new effect is
    /// applied on the (possibly different) new account; when both are the
    /// same account the two steps net out to the delta. The kind is
    /// immutable, so the new category must carry the stored kind.
    pub async fn update_transaction(
        &self,
        cmd: UpdateTransactionCmd,
    ) -> ResultEngine<TransactionView> {
        if cmd.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, cmd.transaction_id, &cmd.user_id)
                .await?;
            let kind = TransactionKind::try_from(model.kind.as_str())?;

            let new_account = self
                .require_account(&db_tx, cmd.account_id, &cmd.user_id)
                .await?;
            let new_category = self
                .require_category(&db_tx, cmd.category_id, &cmd.user_id)
                .await?;
            require_kind_match(&new_category, kind)?;

            let old_account = account_row(&db_tx, &model.account_id, &cmd.user_id).await?;

            let mut balances: HashMap<String, MoneyCents> = HashMap::new();
            balances.insert(
                old_account.id.clone(),
                MoneyCents::new(old_account.balance_minor),
            );
            balances
                .entry(new_account.id.clone())
                .or_insert(MoneyCents::new(new_account.balance_minor));
            let old_slot = balances
                .entry(old_account.id.clone())
                .or_insert(MoneyCents::ZERO);
            *old_slot = revert_effect(
                *old_slot,
                MoneyCents::new(kind.signed_effect(model.amount_minor)),
            )?;
            let new_slot = balances
                .entry(new_account.id.clone())
                .or_insert(MoneyCents::ZERO);
            *new_slot = apply_effect(
                *new_slot,
                MoneyCents::new(kind.signed_effect(cmd.amount_minor)),
            )?;
            for (account_id, balance) in &balances {
                write_balance(&db_tx, account_id.clone(), balance.cents(), cmd.updated_at).await?;
            }

            let active = transactions::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                description: ActiveValue::Set(cmd.description.clone()),
                occurred_on: ActiveValue::Set(cmd.occurred_on),
                notes: ActiveValue::Set(cmd.notes.clone()),
                category_id: ActiveValue::Set(new_category.id.clone()),
                account_id: ActiveValue::Set(new_account.id.clone()),
                updated_at: ActiveValue::Set(Some(cmd.updated_at)),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            tracing::debug!(
                transaction_id = %cmd.transaction_id,
                old_account_id = %old_account.id,
                new_account_id = %new_account.id,
                "transaction rewritten"
            );

            let updated = Transaction {
                id: cmd.transaction_id,
                user_id: cmd.user_id.clone(),
                amount: MoneyCents::new(cmd.amount_minor),
                description: cmd.description.clone(),
                occurred_on: cmd.occurred_on,
                kind,
                notes: cmd.notes.clone(),
                category_id: cmd.category_id,
                account_id: cmd.account_id,
                deleted: false,
                created_at: model.created_at,
                updated_at: Some(cmd.updated_at),
            };
            Ok(view(updated, &new_category, &new_account))
        })
    }

    /// Soft-deletes a transaction and reverts its effect from the account.
    ///
    /// A second delete of the same id resolves as `NotFound` through the
    /// tombstone filter, so the effect is never reverted twice.
    pub async fn delete_transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
        deleted_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            let kind = TransactionKind::try_from(model.kind.as_str())?;

            let account = account_row(&db_tx, &model.account_id, user_id).await?;
            let balance = revert_effect(
                MoneyCents::new(account.balance_minor),
                MoneyCents::new(kind.signed_effect(model.amount_minor)),
            )?;
            write_balance(&db_tx, account.id.clone(), balance.cents(), deleted_at).await?;

            let active = transactions::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                deleted: ActiveValue::Set(true),
                updated_at: ActiveValue::Set(Some(deleted_at)),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            tracing::debug!(
                transaction_id = %transaction_id,
                account_id = %account.id,
                balance_minor = balance.cents(),
                "transaction tombstoned"
            );
            Ok(())
        })
    }

    /// Return a single transaction joined with its category and account.
    pub async fn transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<TransactionView> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, transaction_id, user_id)
                .await?;
            let category = category_row(&db_tx, &model.category_id, user_id).await?;
            let account = account_row(&db_tx, &model.account_id, user_id).await?;
            Ok(view(Transaction::try_from(model)?, &category, &account))
        })
    }

    /// Lists a user's live transactions, newest first.
    ///
    /// Ordered by occurrence date descending, then creation instant
    /// descending as the same-day tie-break. Category and account names are
    /// resolved in two bulk reads instead of per row.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<TransactionView>> {
        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::Deleted.eq(false));
            if let Some(kind) = filter.kind {
                query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
            }
            if let Some(category_id) = filter.category_id {
                query = query.filter(transactions::Column::CategoryId.eq(category_id.to_string()));
            }
            if let Some(account_id) = filter.account_id {
                query = query.filter(transactions::Column::AccountId.eq(account_id.to_string()));
            }
            if let Some(from) = filter.from {
                query = query.filter(transactions::Column::OccurredOn.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(transactions::Column::OccurredOn.lte(to));
            }
            query = query
                .order_by_desc(transactions::Column::OccurredOn)
                .order_by_desc(transactions::Column::CreatedAt);
            if let Some(limit) = filter.limit {
                query = query.limit(limit);
            }
            let rows = query.all(&db_tx).await?;

            let category_names: HashMap<String, categories::Model> = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect();
            let account_names: HashMap<String, accounts::Model> = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect();

            let mut views = Vec::with_capacity(rows.len());
            for row in rows {
                let category = category_names
                    .get(&row.category_id)
                    .ok_or_else(|| EngineError::NotFound("category not exists".to_string()))?;
                let account = account_names
                    .get(&row.account_id)
                    .ok_or_else(|| EngineError::NotFound("account not exists".to_string()))?;
                views.push(view(Transaction::try_from(row)?, category, account));
            }
            Ok(views)
        })
    }

    /// Sum of live transaction amounts of one kind, optionally restricted to
    /// an inclusive date window.
    ///
    /// Amounts are unsigned here: an expense total comes back positive, like
    /// the per-category totals in the breakdown reports.
    pub async fn total_by_kind(
        &self,
        user_id: &str,
        kind: TransactionKind,
        range: &DateRange,
    ) -> ResultEngine<MoneyCents> {
        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::Deleted.eq(false))
                .filter(transactions::Column::Kind.eq(kind.as_str()));
            if let Some(start) = range.start {
                query = query.filter(transactions::Column::OccurredOn.gte(start));
            }
            if let Some(end) = range.end {
                query = query.filter(transactions::Column::OccurredOn.lte(end));
            }
            let rows = query.all(&db_tx).await?;
            let total: i64 = rows.iter().map(|m| m.amount_minor).sum();
            Ok(MoneyCents::new(total))
        })
    }

    /// Re-derives every non-deleted account balance from the live ledger and
    /// rewrites the rows that drifted.
    ///
    /// Returns the drifts found, with the values before and after. An empty
    /// result is the expected outcome; anything else means a past write
    /// bypassed the engine.
    pub async fn recompute_balances(
        &self,
        user_id: &str,
        stamp: DateTime<Utc>,
    ) -> ResultEngine<Vec<BalanceDrift>> {
        with_tx!(self, |db_tx| {
            let account_rows = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id))
                .filter(accounts::Column::Deleted.eq(false))
                .order_by_asc(accounts::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            let transaction_rows = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::Deleted.eq(false))
                .all(&db_tx)
                .await?;

            let mut derived: HashMap<String, i64> = HashMap::new();
            for row in &transaction_rows {
                let kind = TransactionKind::try_from(row.kind.as_str())?;
                *derived.entry(row.account_id.clone()).or_insert(0) +=
                    kind.signed_effect(row.amount_minor);
            }

            let mut drifts = Vec::new();
            for account in account_rows {
                let derived_minor = derived.get(&account.id).copied().unwrap_or(0);
                if derived_minor == account.balance_minor {
                    continue;
                }
                tracing::warn!(
                    account_id = %account.id,
                    cached_minor = account.balance_minor,
                    derived_minor,
                    "cached balance drifted from ledger"
                );
                write_balance(&db_tx, account.id.clone(), derived_minor, stamp).await?;
                drifts.push(BalanceDrift {
                    account_id: Uuid::parse_str(&account.id)
                        .map_err(|_| EngineError::NotFound("account not exists".to_string()))?,
                    cached: MoneyCents::new(account.balance_minor),
                    derived: MoneyCents::new(derived_minor),
                });
            }
            Ok(drifts)
        })
    }
}
