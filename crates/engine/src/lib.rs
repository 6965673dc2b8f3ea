//! The contribution/settlement ledger behind Giftpool.
//!
//! Two independent ledgers live here: pooled-item funding (append-only
//! contributions plus a derived running total) and group gift expenses
//! (fan-out into per-member debts with settlement tracking), plus the
//! notification dedup log that keeps the reminder digest at-most-once.
//!
//! All cross-row invariants are enforced through database transactions and
//! unique indexes so that any number of worker processes can call into the
//! engine concurrently; the [`Engine`] holds nothing but a connection.

pub use contributions::Contribution;
pub use currency::Currency;
pub use debts::DebtStatus;
pub use error::EngineError;
pub use group_members::GroupRole;
pub use items::{GiftItem, ItemType};
pub use money::Money;
pub use notification_log::NotificationType;
pub use ops::{
    Balances, Engine, EngineBuilder, FundingStatus, GroupSummary, Mailer, MailerError, NewExpense,
    OwnerExitPolicy, ReminderRun,
};

pub mod contributions;
mod currency;
pub mod debts;
mod error;
pub mod expenses;
pub mod group_invites;
pub mod group_members;
pub mod groups;
pub mod items;
mod money;
pub mod notification_log;
mod ops;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;
