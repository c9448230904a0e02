use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine, audit::AuditLogger};

mod access;
mod attachments;
mod balance;
mod imports;
mod owners;
mod patterns;
mod refills;
mod tags;
mod transactions;

pub use access::Actor;
pub use balance::BalanceEstimate;
pub use imports::ImportOutcome;
pub use patterns::RetroactiveOutcome;
pub use refills::{OwnerPaymentTotals, PaymentStatus, PendingPayment};
pub use transactions::TransactionListFilter;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    audit: AuditLogger,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The best-effort audit writer, shared with the HTTP boundary for
    /// session events.
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let audit = AuditLogger::new(self.database.clone());
        Ok(Engine {
            database: self.database,
            audit,
        })
    }
}
