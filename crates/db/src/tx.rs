//! Transactional write coordinator.
//!
//! A [`WriteCoordinator`] owns an ordered list of [`WriteStep`]s for one
//! aggregate kind and runs them inside a single transaction. Steps share a
//! mutable context, which is how a parent row's generated id reaches the
//! child-row steps that follow it.
//!
//! The transaction is committed only after every step succeeds. A failing step
//! triggers an explicit rollback; a dropped future or a panic drops the
//! transaction, which sqlx rolls back as well.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use storefront_core::types::DbId;

use crate::error::WriteError;

/// One statement (or small group of statements) in a write sequence.
#[async_trait]
pub trait WriteStep<C: Send>: Send + Sync {
    /// Stable name used in logs and error context.
    fn name(&self) -> &'static str;

    async fn execute(&self, conn: &mut PgConnection, ctx: &mut C) -> Result<(), sqlx::Error>;
}

/// Lifecycle of a single coordinator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Idle,
    TransactionOpen,
    StepsExecuting,
    Committed,
    RolledBack,
}

impl WriteState {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteState::Idle => "idle",
            WriteState::TransactionOpen => "transaction_open",
            WriteState::StepsExecuting => "steps_executing",
            WriteState::Committed => "committed",
            WriteState::RolledBack => "rolled_back",
        }
    }
}

/// Runs a fixed sequence of steps for one aggregate as an atomic unit.
pub struct WriteCoordinator<C> {
    aggregate: &'static str,
    steps: Vec<Box<dyn WriteStep<C>>>,
}

impl<C: Send> WriteCoordinator<C> {
    pub fn new(aggregate: &'static str) -> Self {
        Self {
            aggregate,
            steps: Vec::new(),
        }
    }

    /// Append a step. Steps run in the order they are added.
    pub fn step(mut self, step: impl WriteStep<C> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Execute every step in one transaction.
    ///
    /// Returns `Ok` only after a successful commit. On any error nothing from
    /// this run is visible to other connections.
    pub async fn run(&self, pool: &PgPool, ctx: &mut C) -> Result<(), WriteError> {
        let aggregate = self.aggregate;
        let mut state = WriteState::Idle;

        let mut tx = match pool.begin().await {
            Ok(tx) => tx,
            Err(source) => {
                tracing::warn!(aggregate, error = %source, "Failed to open write transaction");
                return Err(WriteError::TransactionOpen { aggregate, source });
            }
        };
        state = self.transition(state, WriteState::TransactionOpen);
        state = self.transition(state, WriteState::StepsExecuting);

        for step in &self.steps {
            let name = step.name();
            tracing::debug!(aggregate, step = name, "Executing write step");

            if let Err(source) = step.execute(&mut *tx, ctx).await {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(aggregate, error = %rollback_err, "Explicit rollback failed");
                }
                self.transition(state, WriteState::RolledBack);
                tracing::warn!(aggregate, step = name, error = %source, "Write rolled back");
                return Err(WriteError::Step {
                    aggregate,
                    step: name,
                    source,
                });
            }
        }

        if let Err(source) = tx.commit().await {
            self.transition(state, WriteState::RolledBack);
            tracing::warn!(aggregate, error = %source, "Write commit failed");
            return Err(WriteError::Commit { aggregate, source });
        }
        self.transition(state, WriteState::Committed);
        Ok(())
    }

    fn transition(&self, from: WriteState, to: WriteState) -> WriteState {
        tracing::debug!(
            aggregate = self.aggregate,
            from = from.as_str(),
            to = to.as_str(),
            "Write state transition"
        );
        to
    }
}

/// Id assigned by an earlier step in the same run.
///
/// A missing id means the steps were assembled out of order.
pub fn assigned_id(id: Option<DbId>, what: &str) -> Result<DbId, sqlx::Error> {
    id.ok_or_else(|| sqlx::Error::Protocol(format!("{what} id was not assigned by an earlier step")))
}
