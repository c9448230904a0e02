//! Core operations for the porteria back office: statement imports with
//! duplicate reconciliation, regex-based owner/tag attribution, LPG refill
//! cost splitting, payment reconciliation, and balance estimation, all over
//! a sea-orm database.

pub use allocation::{Allocation, MeterReading, allocate};
pub use attachments::{Attachment, AttachmentKind};
pub use audit::AuditLogger;
pub use batches::Batch;
pub use commands::{
    ImportStatementCmd, NewOwnerCmd, NewOwnerPatternCmd, NewRefillCmd, NewTagPatternCmd,
    NewTransactionCmd, UpdateOwnerCmd, UpdateTransactionCmd,
};
pub use error::{EngineError, StatementError};
pub use matcher::{CompiledPattern, PatternSet, validate_pattern};
pub use money::MoneyCents;
pub use ops::{
    Actor, BalanceEstimate, Engine, EngineBuilder, ImportOutcome, OwnerPaymentTotals,
    PaymentStatus, PendingPayment, RetroactiveOutcome, TransactionListFilter,
};
pub use owner_patterns::OwnerPattern;
pub use owners::Owner;
pub use refill_entries::RefillEntry;
pub use refills::Refill;
pub use statement::{Candidate, ParsedStatement, parse_statement};
pub use tag_patterns::TagPattern;
pub use tags::Tag;
pub use transactions::{Transaction, TransactionKind};

mod allocation;
mod attachments;
mod audit;
mod batches;
mod commands;
mod error;
mod kv;
mod matcher;
mod money;
mod ops;
mod owner_patterns;
mod owners;
mod refill_entries;
mod refills;
mod statement;
mod tag_patterns;
mod tags;
mod transaction_tags;
mod transactions;

type ResultEngine<T> = Result<T, EngineError>;
