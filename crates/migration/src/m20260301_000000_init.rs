//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for Giftpool:
//!
//! - `users`: accounts and birthdays
//! - `gift_items`: pooled or normal wishlist items with a running total
//! - `contributions`: append-only funding events against pooled items
//! - `groups`: gift-coordination circles
//! - `group_invites`: redeemable invite tokens
//! - `group_members`: membership rows with OWNER/MEMBER roles
//! - `group_gift_expenses`: recorded gift purchases
//! - `group_gift_debts`: per-member shares fanned out from an expense
//! - `email_notification_logs`: at-most-once reminder dedup log

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    HashedPassword,
    Birthday,
    CreatedAt,
}

#[derive(Iden)]
enum GiftItems {
    Table,
    Id,
    Title,
    ItemType,
    TargetAmountMinor,
    CurrentAmountMinor,
    Currency,
    CreatedAt,
}

#[derive(Iden)]
enum Contributions {
    Table,
    Id,
    ItemId,
    ContributorName,
    AmountMinor,
    Currency,
    Message,
    CreatedAt,
}

#[derive(Iden)]
enum Groups {
    Table,
    Id,
    Name,
    CreatedByUserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum GroupInvites {
    Table,
    Id,
    GroupId,
    Token,
    CreatedByUserId,
    CreatedAt,
    ExpiresAt,
    MaxUses,
    UsesCount,
    IsActive,
}

#[derive(Iden)]
enum GroupMembers {
    Table,
    Id,
    GroupId,
    UserId,
    Role,
    JoinedAt,
}

#[derive(Iden)]
enum GroupGiftExpenses {
    Table,
    Id,
    GroupId,
    BirthdayUserId,
    PaidByUserId,
    Title,
    AmountMinor,
    Currency,
    PaymentAccount,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum GroupGiftDebts {
    Table,
    Id,
    ExpenseId,
    OwedByUserId,
    OwedToUserId,
    AmountMinor,
    Currency,
    Status,
    PaidAt,
}

#[derive(Iden)]
enum EmailNotificationLogs {
    Table,
    Id,
    NotificationType,
    UserId,
    GroupId,
    TargetUserId,
    TargetDate,
    DedupKey,
    SentAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::HashedPassword).string().not_null())
                    .col(ColumnDef::new(Users::Birthday).date())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-email-unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Gift items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(GiftItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GiftItems::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GiftItems::Title).string().not_null())
                    .col(ColumnDef::new(GiftItems::ItemType).string().not_null())
                    .col(ColumnDef::new(GiftItems::TargetAmountMinor).big_integer())
                    .col(
                        ColumnDef::new(GiftItems::CurrentAmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GiftItems::Currency)
                            .string()
                            .not_null()
                            .default("UYU"),
                    )
                    .col(ColumnDef::new(GiftItems::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Contributions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Contributions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contributions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contributions::ItemId).string().not_null())
                    .col(
                        ColumnDef::new(Contributions::ContributorName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Contributions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Contributions::Currency).string().not_null())
                    .col(ColumnDef::new(Contributions::Message).string())
                    .col(
                        ColumnDef::new(Contributions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-contributions-item_id")
                            .from(Contributions::Table, Contributions::ItemId)
                            .to(GiftItems::Table, GiftItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-contributions-item_id-created_at")
                    .table(Contributions::Table)
                    .col(Contributions::ItemId)
                    .col(Contributions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Groups
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Groups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Groups::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Groups::Name).string().not_null())
                    .col(
                        ColumnDef::new(Groups::CreatedByUserId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Groups::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Groups::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-groups-created_by_user_id")
                            .from(Groups::Table, Groups::CreatedByUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Group invites
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(GroupInvites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupInvites::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupInvites::GroupId).string().not_null())
                    .col(ColumnDef::new(GroupInvites::Token).string().not_null())
                    .col(
                        ColumnDef::new(GroupInvites::CreatedByUserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupInvites::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupInvites::ExpiresAt).timestamp())
                    .col(ColumnDef::new(GroupInvites::MaxUses).integer())
                    .col(
                        ColumnDef::new(GroupInvites::UsesCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GroupInvites::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_invites-group_id")
                            .from(GroupInvites::Table, GroupInvites::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-group_invites-token-unique")
                    .table(GroupInvites::Table)
                    .col(GroupInvites::Token)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Group members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(GroupMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupMembers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GroupMembers::GroupId).string().not_null())
                    .col(ColumnDef::new(GroupMembers::UserId).string().not_null())
                    .col(ColumnDef::new(GroupMembers::Role).string().not_null())
                    .col(
                        ColumnDef::new(GroupMembers::JoinedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_members-group_id")
                            .from(GroupMembers::Table, GroupMembers::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_members-user_id")
                            .from(GroupMembers::Table, GroupMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One membership row per (group, user); the redemption path leans on
        // this to reject double joins under concurrency.
        manager
            .create_index(
                Index::create()
                    .name("idx-group_members-group_id-user_id-unique")
                    .table(GroupMembers::Table)
                    .col(GroupMembers::GroupId)
                    .col(GroupMembers::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Group gift expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(GroupGiftExpenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupGiftExpenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftExpenses::GroupId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftExpenses::BirthdayUserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftExpenses::PaidByUserId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupGiftExpenses::Title).string())
                    .col(
                        ColumnDef::new(GroupGiftExpenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftExpenses::Currency)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftExpenses::PaymentAccount)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupGiftExpenses::Note).string())
                    .col(
                        ColumnDef::new(GroupGiftExpenses::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_gift_expenses-group_id")
                            .from(GroupGiftExpenses::Table, GroupGiftExpenses::GroupId)
                            .to(Groups::Table, Groups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-group_gift_expenses-group_id-created_at")
                    .table(GroupGiftExpenses::Table)
                    .col(GroupGiftExpenses::GroupId)
                    .col(GroupGiftExpenses::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Group gift debts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(GroupGiftDebts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupGiftDebts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftDebts::ExpenseId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftDebts::OwedByUserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftDebts::OwedToUserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupGiftDebts::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GroupGiftDebts::Currency).string().not_null())
                    .col(ColumnDef::new(GroupGiftDebts::Status).string().not_null())
                    .col(ColumnDef::new(GroupGiftDebts::PaidAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_gift_debts-expense_id")
                            .from(GroupGiftDebts::Table, GroupGiftDebts::ExpenseId)
                            .to(GroupGiftExpenses::Table, GroupGiftExpenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-group_gift_debts-expense_id-owed_by-unique")
                    .table(GroupGiftDebts::Table)
                    .col(GroupGiftDebts::ExpenseId)
                    .col(GroupGiftDebts::OwedByUserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-group_gift_debts-owed_by-status")
                    .table(GroupGiftDebts::Table)
                    .col(GroupGiftDebts::OwedByUserId)
                    .col(GroupGiftDebts::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Email notification logs
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(EmailNotificationLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailNotificationLogs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EmailNotificationLogs::NotificationType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailNotificationLogs::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmailNotificationLogs::GroupId).string())
                    .col(ColumnDef::new(EmailNotificationLogs::TargetUserId).string())
                    .col(
                        ColumnDef::new(EmailNotificationLogs::TargetDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailNotificationLogs::DedupKey)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailNotificationLogs::SentAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // The at-most-once guarantee lives in this index: NULLable members of
        // the logical identity are folded into the NOT NULL dedup_key.
        manager
            .create_index(
                Index::create()
                    .name("idx-email_notification_logs-dedup_key-unique")
                    .table(EmailNotificationLogs::Table)
                    .col(EmailNotificationLogs::DedupKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailNotificationLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupGiftDebts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupGiftExpenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupInvites::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contributions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GiftItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
