use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{NotificationType, ResultEngine, notification_log};

use super::{Engine, is_unique_violation};

impl Engine {
    /// Claims the right to send one notification, at most once ever.
    ///
    /// The claim is an INSERT against the unique dedup key: `Ok(true)` means
    /// this caller won and must send, `Ok(false)` means some process already
    /// claimed it (now or in any earlier run). The claim is deliberately not
    /// rolled back when a send later fails; a duplicate email is worse than
    /// a missed one.
    pub async fn try_claim_notification(
        &self,
        notification_type: NotificationType,
        user_id: &str,
        group_id: Option<&str>,
        target_user_id: Option<&str>,
        target_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> ResultEngine<bool> {
        let key = notification_log::dedup_key(
            notification_type,
            user_id,
            group_id,
            target_user_id,
            target_date,
        );

        let inserted = notification_log::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            notification_type: ActiveValue::Set(notification_type.as_str().to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            group_id: ActiveValue::Set(group_id.map(ToString::to_string)),
            target_user_id: ActiveValue::Set(target_user_id.map(ToString::to_string)),
            target_date: ActiveValue::Set(target_date),
            dedup_key: ActiveValue::Set(key),
            sent_at: ActiveValue::Set(now),
        }
        .insert(&self.database)
        .await;

        match inserted {
            Ok(_) => Ok(true),
            Err(err) if is_unique_violation(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
