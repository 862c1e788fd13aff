//! Category registry operations.
//!
//! Names are unique per owner and kind (case-insensitive); the uniqueness
//! check runs inside the same DB transaction as the write so two concurrent
//! creates cannot both pass it.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{Category, EngineError, ResultEngine, TransactionKind, categories, transactions};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

const DEFAULT_COLOR: &str = "#000000";

async fn name_taken(
    db_tx: &DatabaseTransaction,
    user_id: &str,
    kind: TransactionKind,
    name: &str,
    exclude_id: Option<&str>,
) -> ResultEngine<bool> {
    let mut query = categories::Entity::find()
        .filter(categories::Column::UserId.eq(user_id))
        .filter(categories::Column::Kind.eq(kind.as_str()))
        .filter(categories::Column::Deleted.eq(false))
        .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()));
    if let Some(id) = exclude_id {
        query = query.filter(categories::Column::Id.ne(id));
    }
    Ok(query.one(db_tx).await?.is_some())
}

fn normalize_color(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        DEFAULT_COLOR.to_string()
    } else {
        trimmed.to_string()
    }
}

impl Engine {
    /// Add a new category for a user.
    #[allow(clippy::too_many_arguments)]
    pub async fn new_category(
        &self,
        name: &str,
        kind: TransactionKind,
        icon: Option<&str>,
        color: &str,
        description: Option<&str>,
        user_id: &str,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;
        let icon = normalize_optional_text(icon);
        let description = normalize_optional_text(description);
        let color = normalize_color(color);
        with_tx!(self, |db_tx| {
            if name_taken(&db_tx, user_id, kind, &name, None).await? {
                return Err(EngineError::DuplicateName(name));
            }

            let category = Category::new(
                name,
                kind,
                icon,
                color,
                description,
                user_id.to_string(),
                created_at,
            );
            categories::ActiveModel::from(&category)
                .insert(&db_tx)
                .await?;
            Ok(category)
        })
    }

    /// Return a category snapshot.
    pub async fn category(&self, category_id: Uuid, user_id: &str) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, category_id, user_id).await?;
            Category::try_from(model)
        })
    }

    /// Lists a user's non-deleted categories, ordered by kind then name.
    pub async fn list_categories(
        &self,
        user_id: &str,
        kind: Option<TransactionKind>,
    ) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let mut query = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id))
                .filter(categories::Column::Deleted.eq(false));
            if let Some(kind) = kind {
                query = query.filter(categories::Column::Kind.eq(kind.as_str()));
            }
            let models = query
                .order_by_asc(categories::Column::Kind)
                .order_by_asc(categories::Column::Name)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Category::try_from).collect()
        })
    }

    /// Rewrites a category's display fields.
    ///
    /// The kind is immutable: changing it would break the kind invariant of
    /// every transaction already referencing the category.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        name: &str,
        icon: Option<&str>,
        color: &str,
        description: Option<&str>,
        user_id: &str,
        updated_at: DateTime<Utc>,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;
        let icon = normalize_optional_text(icon);
        let description = normalize_optional_text(description);
        let color = normalize_color(color);
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, category_id, user_id).await?;
            let kind = TransactionKind::try_from(model.kind.as_str())?;

            if name_taken(&db_tx, user_id, kind, &name, Some(model.id.as_str())).await? {
                return Err(EngineError::DuplicateName(name));
            }

            let active = categories::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                name: ActiveValue::Set(name.clone()),
                icon: ActiveValue::Set(icon.clone()),
                color: ActiveValue::Set(color.clone()),
                description: ActiveValue::Set(description.clone()),
                updated_at: ActiveValue::Set(Some(updated_at)),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            let mut category = Category::try_from(model)?;
            category.name = name;
            category.icon = icon;
            category.color = color;
            category.description = description;
            category.updated_at = Some(updated_at);
            Ok(category)
        })
    }

    /// Soft-deletes a category.
    ///
    /// Blocked while any transaction references the category, soft-deleted
    /// ones included: a tombstoned transaction can still be inspected and
    /// must keep resolving its category.
    pub async fn delete_category(
        &self,
        category_id: Uuid,
        user_id: &str,
        deleted_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, category_id, user_id).await?;

            let references = transactions::Entity::find()
                .filter(transactions::Column::CategoryId.eq(model.id.clone()))
                .count(&db_tx)
                .await?;
            if references > 0 {
                return Err(EngineError::ReferentialConflict(format!(
                    "category '{}' is referenced by {references} transaction(s)",
                    model.name
                )));
            }

            let active = categories::ActiveModel {
                id: ActiveValue::Set(model.id),
                deleted: ActiveValue::Set(true),
                updated_at: ActiveValue::Set(Some(deleted_at)),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }
}
