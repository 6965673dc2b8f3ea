use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};

use crate::{
    Contribution, Currency, EngineError, GiftItem, ItemType, Money, ResultEngine, contributions,
    items,
};

use super::{Engine, normalize_optional_text, normalize_required_name, with_tx};

impl Engine {
    /// Records one funding event against a pooled item.
    ///
    /// The contribution insert and the running-total update commit as one
    /// transaction, and the total moves via an atomic SQL increment rather
    /// than a read-modify-write, so concurrent contributors never overwrite
    /// each other. Overfunding past `target_amount_minor` is allowed; caps
    /// are a caller concern. There is no reversal operation.
    pub async fn record_contribution(
        &self,
        item_id: &str,
        contributor_name: &str,
        amount_minor: i64,
        currency: Currency,
        message: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Contribution> {
        let contributor_name = normalize_required_name(contributor_name, "contributor")?;
        let message = normalize_optional_text(message);

        with_tx!(self, |db_tx| {
            async {
                let item_model = items::Entity::find_by_id(item_id.to_string())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("item not exists".to_string()))?;
                let item = GiftItem::try_from(item_model)?;

                if item.item_type != ItemType::Pooled {
                    return Err(EngineError::InvalidItemType(
                        "contributions are only accepted on pooled items".to_string(),
                    ));
                }

                let amount = Money::new(amount_minor, currency);
                if !amount.is_positive() {
                    return Err(EngineError::InvalidAmount(
                        "amount_minor must be > 0".to_string(),
                    ));
                }
                // Currency check doubles as overflow check on the new total.
                Money::new(item.current_amount_minor, item.currency).checked_add(amount)?;

                let contribution = Contribution::new(
                    item.id,
                    contributor_name,
                    amount_minor,
                    currency,
                    message,
                    created_at,
                )?;
                contributions::ActiveModel::from(&contribution)
                    .insert(&db_tx)
                    .await?;

                let updated = items::Entity::update_many()
                    .col_expr(
                        items::Column::CurrentAmountMinor,
                        Expr::col(items::Column::CurrentAmountMinor).add(amount_minor),
                    )
                    .filter(items::Column::Id.eq(item_id.to_string()))
                    .exec(&db_tx)
                    .await?;
                if updated.rows_affected != 1 {
                    return Err(EngineError::Integrity(
                        "item vanished while recording a contribution".to_string(),
                    ));
                }

                Ok(contribution)
            }
            .await
        })
    }
}
