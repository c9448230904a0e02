//! Command structs for engine operations.
//!
//! These types group parameters for write operations (imports, manual
//! entries, patterns, refills), keeping call sites readable and avoiding
//! long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{MeterReading, MoneyCents, TransactionKind};

/// Import one statement file into a new batch.
#[derive(Clone, Debug)]
pub struct ImportStatementCmd {
    pub original_filename: String,
    /// Name the upload was stored under (may differ from the original).
    pub stored_filename: String,
    /// Full statement text, already decoded to UTF-8.
    pub text: String,
    pub use_pattern_matching: bool,
}

impl ImportStatementCmd {
    #[must_use]
    pub fn new(original_filename: impl Into<String>, text: impl Into<String>) -> Self {
        let original_filename = original_filename.into();
        Self {
            stored_filename: original_filename.clone(),
            original_filename,
            text: text.into(),
            use_pattern_matching: true,
        }
    }

    #[must_use]
    pub fn stored_filename(mut self, name: impl Into<String>) -> Self {
        self.stored_filename = name.into();
        self
    }

    #[must_use]
    pub fn use_pattern_matching(mut self, enabled: bool) -> Self {
        self.use_pattern_matching = enabled;
        self
    }
}

/// Create a manual ledger transaction.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub kind: TransactionKind,
    pub amount: MoneyCents,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    pub owner_id: Option<Uuid>,
    pub category: Option<String>,
    pub tag_ids: Vec<Uuid>,
}

impl NewTransactionCmd {
    #[must_use]
    pub fn new(
        kind: TransactionKind,
        amount: MoneyCents,
        occurred_at: DateTime<Utc>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            amount,
            occurred_at,
            description: description.into(),
            owner_id: None,
            category: None,
            tag_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn owner_id(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag_id: Uuid) -> Self {
        self.tag_ids.push(tag_id);
        self
    }
}

/// Staff edit of an existing transaction.
///
/// `None` leaves a field unchanged; `Some(None)` clears it. The imported
/// `bank_description` is not editable.
#[derive(Clone, Debug, Default)]
pub struct UpdateTransactionCmd {
    pub description: Option<String>,
    pub owner_id: Option<Option<Uuid>>,
    pub category: Option<Option<String>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn owner_id(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(Some(owner_id));
        self
    }

    #[must_use]
    pub fn clear_owner(mut self) -> Self {
        self.owner_id = Some(None);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(Some(category.into()));
        self
    }

    #[must_use]
    pub fn clear_category(mut self) -> Self {
        self.category = Some(None);
        self
    }
}

/// Register an apartment owner.
#[derive(Clone, Debug)]
pub struct NewOwnerCmd {
    pub name: String,
    pub apartment: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl NewOwnerCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, apartment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            apartment: apartment.into(),
            email: None,
            phone: None,
        }
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// Update an apartment owner.
///
/// `None` leaves a field unchanged; for email/phone, `Some(None)` clears it.
#[derive(Clone, Debug, Default)]
pub struct UpdateOwnerCmd {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub active: Option<bool>,
}

impl UpdateOwnerCmd {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: Option<String>) -> Self {
        self.email = Some(email);
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: Option<String>) -> Self {
        self.phone = Some(phone);
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}

/// Create an owner attribution pattern.
#[derive(Clone, Debug)]
pub struct NewOwnerPatternCmd {
    pub owner_id: Uuid,
    pub pattern: String,
    /// Retroactively attribute matching stored transactions.
    pub apply_to_existing: bool,
    /// Restrict the retroactive pass to transactions with no owner yet.
    pub only_unassigned: bool,
}

impl NewOwnerPatternCmd {
    #[must_use]
    pub fn new(owner_id: Uuid, pattern: impl Into<String>) -> Self {
        Self {
            owner_id,
            pattern: pattern.into(),
            apply_to_existing: false,
            only_unassigned: false,
        }
    }

    #[must_use]
    pub fn apply_to_existing(mut self, only_unassigned: bool) -> Self {
        self.apply_to_existing = true;
        self.only_unassigned = only_unassigned;
        self
    }
}

/// Create a tag attribution pattern.
#[derive(Clone, Debug)]
pub struct NewTagPatternCmd {
    pub tag_id: Uuid,
    pub pattern: String,
    pub apply_to_existing: bool,
}

impl NewTagPatternCmd {
    #[must_use]
    pub fn new(tag_id: Uuid, pattern: impl Into<String>) -> Self {
        Self {
            tag_id,
            pattern: pattern.into(),
            apply_to_existing: false,
        }
    }

    #[must_use]
    pub fn apply_to_existing(mut self) -> Self {
        self.apply_to_existing = true;
        self
    }
}

/// Record an LPG refill and split its bill across apartments.
#[derive(Clone, Debug)]
pub struct NewRefillCmd {
    pub bill_amount: MoneyCents,
    pub gallons: f64,
    pub refill_date: DateTime<Utc>,
    pub efficiency_percent: f64,
    /// Tag linking payment transactions to this refill.
    pub tag_id: Option<Uuid>,
    pub readings: Vec<MeterReading>,
}

impl NewRefillCmd {
    #[must_use]
    pub fn new(
        bill_amount: MoneyCents,
        gallons: f64,
        refill_date: DateTime<Utc>,
        readings: Vec<MeterReading>,
    ) -> Self {
        Self {
            bill_amount,
            gallons,
            refill_date,
            efficiency_percent: 0.0,
            tag_id: None,
            readings,
        }
    }

    #[must_use]
    pub fn efficiency_percent(mut self, percent: f64) -> Self {
        self.efficiency_percent = percent;
        self
    }

    #[must_use]
    pub fn tag_id(mut self, tag_id: Uuid) -> Self {
        self.tag_id = Some(tag_id);
        self
    }
}
