//! The module contains the errors the engine can throw.
//!
//! Broadly the variants fall into four families mirrored by the HTTP layer:
//! validation ([`InvalidAmount`], [`InvalidName`], [`InvalidItemType`],
//! [`CurrencyMismatch`]),
//! conflicts ([`AlreadyMember`], [`AlreadySettled`], the invite states,
//! [`LastOwnerCannotLeave`]), not-found ([`KeyNotFound`]) and internal faults
//! ([`Integrity`], [`Database`]).
//!
//! [`InvalidAmount`]: EngineError::InvalidAmount
//! [`InvalidName`]: EngineError::InvalidName
//! [`InvalidItemType`]: EngineError::InvalidItemType
//! [`CurrencyMismatch`]: EngineError::CurrencyMismatch
//! [`AlreadyMember`]: EngineError::AlreadyMember
//! [`AlreadySettled`]: EngineError::AlreadySettled
//! [`LastOwnerCannotLeave`]: EngineError::LastOwnerCannotLeave
//! [`KeyNotFound`]: EngineError::KeyNotFound
//! [`Integrity`]: EngineError::Integrity
//! [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid item type: {0}")]
    InvalidItemType(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invite is inactive")]
    InviteInactive,
    #[error("Invite has expired")]
    InviteExpired,
    #[error("Invite max uses reached")]
    InviteExhausted,
    #[error("Already a member of this group")]
    AlreadyMember,
    #[error("Debt already settled")]
    AlreadySettled,
    #[error("Cannot remove the last owner of the group")]
    LastOwnerCannotLeave,
    #[error("Integrity violation: {0}")]
    Integrity(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidItemType(a), Self::InvalidItemType(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::InviteInactive, Self::InviteInactive) => true,
            (Self::InviteExpired, Self::InviteExpired) => true,
            (Self::InviteExhausted, Self::InviteExhausted) => true,
            (Self::AlreadyMember, Self::AlreadyMember) => true,
            (Self::AlreadySettled, Self::AlreadySettled) => true,
            (Self::LastOwnerCannotLeave, Self::LastOwnerCannotLeave) => true,
            (Self::Integrity(a), Self::Integrity(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
