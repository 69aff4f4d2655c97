//! `SeaORM` active enums mapped to the Postgres enum types.

use cofre_core::budget::BudgetRecurrence as CoreBudgetRecurrence;
use cofre_core::ledger::{TransactionStatus as CoreTransactionStatus, WalletKind};
use cofre_core::obligation::ObligationStatus as CoreObligationStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "wallet_type")]
pub enum WalletType {
    #[sea_orm(string_value = "checking")]
    Checking,
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "obligation_status")]
pub enum ObligationStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "settled")]
    Settled,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "budget_recurrence")]
pub enum BudgetRecurrence {
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "once")]
    Once,
}

macro_rules! mirror_enum {
    ($db:ident, $domain:ident, [$($variant:ident),+]) => {
        impl From<$db> for $domain {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$domain> for $db {
            fn from(value: $domain) -> Self {
                match value {
                    $($domain::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(WalletType, WalletKind, [Checking, CreditCard]);
mirror_enum!(ObligationStatus, CoreObligationStatus, [Active, Completed, Cancelled]);
mirror_enum!(TransactionStatus, CoreTransactionStatus, [Pending, Settled, Cancelled]);
mirror_enum!(BudgetRecurrence, CoreBudgetRecurrence, [Monthly, Once]);
