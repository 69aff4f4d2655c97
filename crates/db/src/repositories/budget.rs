//! Budget repository for budget database operations.

use cofre_core::budget::{Budget, BudgetService, BudgetVsActual, CreateBudgetInput};
use cofre_core::calendar::MonthPeriod;
use cofre_core::Clock;
use cofre_shared::types::UserId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

use super::convert::{budget_active_model, budget_from_model, transaction_from_model};
use super::error::RepositoryError;
use crate::entities::{budgets, transactions};

/// Budget repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a budget after validating it against the owner's budgets.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAmount` or `DuplicateBudget`, or a database error.
    pub async fn create(
        &self,
        input: CreateBudgetInput,
        clock: &dyn Clock,
    ) -> Result<Budget, RepositoryError> {
        let txn = self.db.begin().await?;
        let existing = budgets::Entity::find()
            .filter(budgets::Column::OwnerId.eq(input.owner_id.into_inner()))
            .filter(budgets::Column::CategoryId.eq(input.category_id.into_inner()))
            .all(&txn)
            .await?
            .into_iter()
            .map(budget_from_model)
            .collect::<Vec<_>>();

        let budget = BudgetService::create(input, &existing, clock.now())?;
        budget_active_model(&budget).insert(&txn).await?;
        txn.commit().await?;
        Ok(budget)
    }

    /// Budgets owned by a user, by starting month.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, owner: UserId) -> Result<Vec<Budget>, RepositoryError> {
        Ok(budgets::Entity::find()
            .filter(budgets::Column::OwnerId.eq(owner.into_inner()))
            .order_by_asc(budgets::Column::Period)
            .all(&self.db)
            .await?
            .into_iter()
            .map(budget_from_model)
            .collect())
    }

    /// Budget vs actual for one month.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn budget_vs_actual(
        &self,
        owner: UserId,
        month: MonthPeriod,
    ) -> Result<Vec<BudgetVsActual>, RepositoryError> {
        let budgets = self.list(owner).await?;

        let transactions = transactions::Entity::find()
            .filter(transactions::Column::OwnerId.eq(owner.into_inner()))
            .filter(transactions::Column::AccountId.is_not_null())
            .filter(transactions::Column::SettledAt.between(month.first_day(), month.last_day()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(transaction_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BudgetService::budget_vs_actual(&budgets, &transactions, month))
    }
}
