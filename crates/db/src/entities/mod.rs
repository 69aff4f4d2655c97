//! `SeaORM` entity definitions.

pub mod accounts;
pub mod budgets;
pub mod incomes;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod wallets;
