use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod owner {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OwnerNew {
        pub name: String,
        pub apartment: String,
        pub email: Option<String>,
        pub phone: Option<String>,
    }

    /// Absent fields are left unchanged; the `clear_*` flags empty a field.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct OwnerUpdate {
        pub name: Option<String>,
        pub email: Option<String>,
        #[serde(default)]
        pub clear_email: bool,
        pub phone: Option<String>,
        #[serde(default)]
        pub clear_phone: bool,
        pub active: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OwnerView {
        pub id: Uuid,
        pub name: String,
        pub apartment: String,
        pub email: Option<String>,
        pub phone: Option<String>,
        pub active: bool,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        MoneyIn,
        MoneyOut,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub occurred_at: DateTime<Utc>,
        pub description: String,
        pub owner_id: Option<Uuid>,
        pub category: Option<String>,
        #[serde(default)]
        pub tag_ids: Vec<Uuid>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub description: Option<String>,
        pub owner_id: Option<Uuid>,
        #[serde(default)]
        pub clear_owner: bool,
        pub category: Option<String>,
        #[serde(default)]
        pub clear_category: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub occurred_at: DateTime<Utc>,
        pub description: String,
        pub bank_description: Option<String>,
        pub owner_id: Option<Uuid>,
        pub category: Option<String>,
        pub reference: Option<String>,
        pub serial: Option<String>,
        pub batch_id: Option<Uuid>,
        pub is_duplicate: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionDetailResponse {
        pub transaction: TransactionView,
        pub tags: Vec<super::tag::TagView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub limit: Option<u64>,
        pub cursor: Option<String>,
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
        pub kind: Option<TransactionKind>,
        pub owner_id: Option<Uuid>,
        pub tag_id: Option<Uuid>,
        pub include_duplicates: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TagAssign {
        pub tag_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionGet {
        pub id: Uuid,
    }
}

pub mod import {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ImportNew {
        pub filename: String,
        /// Statement file content, base64-encoded UTF-8 text.
        pub content_base64: String,
        pub use_pattern_matching: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ImportResult {
        pub batch_id: Uuid,
        pub account: Option<String>,
        pub total: i32,
        pub new_count: i32,
        pub duplicate_count: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchView {
        pub id: Uuid,
        pub original_filename: String,
        pub processed_at: DateTime<Utc>,
        pub total_count: i32,
        pub new_count: i32,
        pub duplicate_count: i32,
        /// False signals an interrupted import (counts don't add up).
        pub consistent: bool,
    }
}

pub mod pattern {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OwnerPatternNew {
        pub owner_id: Uuid,
        pub pattern: String,
        #[serde(default)]
        pub apply_to_existing: bool,
        #[serde(default)]
        pub only_unassigned: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TagPatternNew {
        pub tag_id: Uuid,
        pub pattern: String,
        #[serde(default)]
        pub apply_to_existing: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PatternView {
        pub id: Uuid,
        pub pattern: String,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RetroactiveView {
        pub scanned: u64,
        pub attributed: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PatternCreatedResponse {
        pub pattern: PatternView,
        pub retroactive: Option<RetroactiveView>,
    }
}

pub mod tag {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TagNew {
        pub name: String,
        pub parent_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TagRename {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TagReparent {
        pub parent_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TagView {
        pub id: Uuid,
        pub name: String,
        pub parent_id: Option<Uuid>,
    }
}

pub mod refill {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReadingNew {
        pub owner_id: Uuid,
        pub previous_reading: f64,
        pub current_reading: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RefillNew {
        pub bill_amount_minor: i64,
        pub gallons: f64,
        pub refill_date: DateTime<Utc>,
        pub efficiency_percent: Option<f64>,
        pub tag_id: Option<Uuid>,
        pub readings: Vec<ReadingNew>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RefillView {
        pub id: Uuid,
        pub bill_amount_minor: i64,
        pub gallons: f64,
        pub refill_date: DateTime<Utc>,
        pub efficiency_percent: f64,
        pub tag_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RefillEntryView {
        pub owner_id: Uuid,
        pub previous_reading: f64,
        pub current_reading: f64,
        pub consumption: f64,
        pub percentage: f64,
        pub subtotal: f64,
        pub total_amount: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RefillDetailResponse {
        pub refill: RefillView,
        pub entries: Vec<RefillEntryView>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentStatus {
        Paid,
        Pending,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PendingPaymentView {
        pub owner_id: Uuid,
        pub amount_owed: f64,
        pub amount_paid: f64,
        pub remaining: f64,
        pub status: PaymentStatus,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PendingSummaryView {
        pub owner_id: Uuid,
        pub total_owed: f64,
        pub total_paid: f64,
        pub remaining: f64,
    }
}

pub mod balance {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CheckpointSet {
        pub balance_minor: i64,
        pub date: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub checkpoint_balance_minor: Option<i64>,
        pub checkpoint_date: Option<DateTime<Utc>>,
        pub estimated_balance_minor: Option<i64>,
        pub transactions_since: u64,
    }
}

pub mod attachment {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AttachmentKind {
        Refill,
        Transaction,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AttachmentNew {
        pub entity_kind: AttachmentKind,
        pub entity_id: Uuid,
        pub filename: String,
        /// File bytes, base64-encoded.
        pub content_base64: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AttachmentView {
        pub id: Uuid,
        pub entity_kind: AttachmentKind,
        pub entity_id: Uuid,
        pub filename: String,
        pub uploaded_at: DateTime<Utc>,
    }
}
