use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use subhub_core::{DomainError, DomainResult, Entity, ProductId, ValueObject};

/// Product status lifecycle.
///
/// Products start in any status; see [`crate::lifecycle`] for the allowed moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    Published,
    Deprecated,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 3] = [
        ProductStatus::Draft,
        ProductStatus::Published,
        ProductStatus::Deprecated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Published => "published",
            ProductStatus::Deprecated => "deprecated",
        }
    }
}

impl core::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ProductStatus::Draft),
            "published" => Ok(ProductStatus::Published),
            "deprecated" => Ok(ProductStatus::Deprecated),
            other => Err(DomainError::validation(format!(
                "unknown product status '{other}' (expected draft, published or deprecated)"
            ))),
        }
    }
}

/// Monthly fee in euros: non-negative, at most two decimal places, no more
/// than [`MonthlyFee::MAX_CENTS`] cents (the range of a `NUMERIC(10, 2)`).
///
/// Always held at scale 2, so `9.9` and `9.90` are the same fee and render
/// identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MonthlyFee(Decimal);

impl MonthlyFee {
    /// Largest accepted fee, in cents: 99999999.99 euros.
    pub const MAX_CENTS: i64 = 9_999_999_999;

    pub fn max() -> Decimal {
        Decimal::new(Self::MAX_CENTS, 2)
    }

    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount < Decimal::ZERO {
            return Err(DomainError::validation("monthly fee cannot be negative"));
        }
        if amount > Self::max() {
            return Err(DomainError::validation(format!(
                "monthly fee cannot exceed {}",
                Self::max()
            )));
        }

        let mut normalized = amount.normalize();
        if normalized.scale() > 2 {
            return Err(DomainError::validation(
                "monthly fee cannot have more than two decimal places",
            ));
        }
        normalized.rescale(2);

        Ok(Self(normalized))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl ValueObject for MonthlyFee {}

impl TryFrom<Decimal> for MonthlyFee {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Entity: Product.
///
/// Immutable snapshot; use [`Product::with_status`] or build a new value to
/// express a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    monthly_fee: MonthlyFee,
    name: String,
    status: ProductStatus,
}

impl Product {
    pub fn new(
        id: ProductId,
        monthly_fee: MonthlyFee,
        name: impl Into<String>,
        status: ProductStatus,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Self {
            id,
            monthly_fee,
            name,
            status,
        })
    }

    pub fn monthly_fee(&self) -> MonthlyFee {
        self.monthly_fee
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ProductStatus {
        self.status
    }

    /// Same product with a different status.
    pub fn with_status(&self, status: ProductStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// True when every attribute except `status` matches `other`.
    pub fn same_payload_as(&self, other: &Product) -> bool {
        self.id == other.id && self.monthly_fee == other.monthly_fee && self.name == other.name
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
