use serde::{Deserialize, Serialize};

use gemledger_core::{DomainError, DomainResult, Entity, EntityId};

use crate::grade::{ClarityGrade, ColorGrade, CutGrade};

/// Diamond identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiamondId(pub EntityId);

impl DiamondId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for DiamondId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Diamond shape. Stones only ever match within the same shape.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Round,
    Princess,
    Cushion,
    Emerald,
    Oval,
    Radiant,
    Asscher,
    Marquise,
    Pear,
    Heart,
}

impl Shape {
    pub const ALL: &'static [Shape] = &[
        Shape::Round,
        Shape::Princess,
        Shape::Cushion,
        Shape::Emerald,
        Shape::Oval,
        Shape::Radiant,
        Shape::Asscher,
        Shape::Marquise,
        Shape::Pear,
        Shape::Heart,
    ];
}

impl core::fmt::Display for Shape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self, f)
    }
}

/// Where a diamond is in its sales lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InventoryStatus {
    #[default]
    Available,
    Reserved,
    Sold,
    #[serde(rename = "On Memo")]
    OnMemo,
    Returned,
}

/// Grading laboratory that issued the certificate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CertificationLab {
    #[serde(rename = "GIA")]
    Gia,
    #[serde(rename = "IGI")]
    Igi,
    #[serde(rename = "AGS")]
    Ags,
    #[serde(rename = "HRD")]
    Hrd,
    #[default]
    None,
}

/// A loose diamond held in inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diamond {
    pub id: DiamondId,
    pub sku: String,
    pub shape: Shape,
    /// Weight in carats.
    pub carat: f64,
    pub color: ColorGrade,
    pub clarity: ClarityGrade,
    pub cut: CutGrade,
    /// Retail price in smallest currency unit (e.g. cents).
    pub retail_price: u64,
    #[serde(default)]
    pub status: InventoryStatus,
    #[serde(default)]
    pub cert_lab: CertificationLab,
    #[serde(default)]
    pub cert_number: Option<String>,
}

impl Diamond {
    /// An available, uncertified diamond with a fresh id.
    pub fn new(
        sku: impl Into<String>,
        shape: Shape,
        carat: f64,
        color: ColorGrade,
        clarity: ClarityGrade,
        cut: CutGrade,
        retail_price: u64,
    ) -> Self {
        Self {
            id: DiamondId::new(EntityId::new()),
            sku: sku.into(),
            shape,
            carat,
            color,
            clarity,
            cut,
            retail_price,
            status: InventoryStatus::Available,
            cert_lab: CertificationLab::None,
            cert_number: None,
        }
    }

    pub fn with_id(mut self, id: DiamondId) -> Self {
        self.id = id;
        self
    }

    pub fn with_status(mut self, status: InventoryStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_certificate(mut self, lab: CertificationLab, number: impl Into<String>) -> Self {
        self.cert_lab = lab;
        self.cert_number = Some(number.into());
        self
    }

    /// Only available stones can be offered in a matched set.
    pub fn is_available(&self) -> bool {
        self.status == InventoryStatus::Available
    }

    /// A diamond can only anchor carat comparisons with a positive, finite weight.
    pub fn check_magnitude(&self) -> DomainResult<()> {
        if self.carat.is_finite() && self.carat > 0.0 {
            Ok(())
        } else {
            Err(DomainError::precondition(format!(
                "diamond {} has invalid carat weight {}",
                self.sku, self.carat
            )))
        }
    }
}

impl Entity for Diamond {
    type Id = DiamondId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
