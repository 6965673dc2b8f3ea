//! At-most-once log of sent notifications.
//!
//! The logical identity of a notification is the five-tuple
//! (type, user, group, target user, target date). Two of those members are
//! nullable and SQL UNIQUE treats NULLs as distinct, so the tuple is also
//! encoded into the NOT NULL `dedup_key` column, which carries the unique
//! index that makes `try_claim_notification` race-free.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationType {
    /// Personal heads-up ~30 days before the user's own birthday.
    Birthday30Days,
    /// Group reminder 14 days before a fellow member's birthday.
    GroupBirthday14Days,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Birthday30Days => "BIRTHDAY_30_DAYS",
            Self::GroupBirthday14Days => "GROUP_BIRTHDAY_14_DAYS",
        }
    }
}

impl TryFrom<&str> for NotificationType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "BIRTHDAY_30_DAYS" => Ok(Self::Birthday30Days),
            "GROUP_BIRTHDAY_14_DAYS" => Ok(Self::GroupBirthday14Days),
            other => Err(EngineError::Integrity(format!(
                "invalid notification type: {other}"
            ))),
        }
    }
}

/// Canonical encoding of the logical notification identity.
pub fn dedup_key(
    notification_type: NotificationType,
    user_id: &str,
    group_id: Option<&str>,
    target_user_id: Option<&str>,
    target_date: NaiveDate,
) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        notification_type.as_str(),
        user_id,
        group_id.unwrap_or(""),
        target_user_id.unwrap_or(""),
        target_date
    )
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "email_notification_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub notification_type: String,
    pub user_id: String,
    pub group_id: Option<String>,
    pub target_user_id: Option<String>,
    pub target_date: Date,
    #[sea_orm(unique)]
    pub dedup_key: String,
    pub sent_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
