use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use showcase_core::{AccountId, DomainError, DomainResult, ProductId};

/// What the founder is currently looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    LookingForMentor,
    LookingForCofounder,
    OfferingInternship,
    LookingForInvestment,
    LookingForTeamMembers,
    LookingForFeedback,
    LookingForPartnership,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::LookingForMentor => "looking_for_mentor",
            ProductStatus::LookingForCofounder => "looking_for_cofounder",
            ProductStatus::OfferingInternship => "offering_internship",
            ProductStatus::LookingForInvestment => "looking_for_investment",
            ProductStatus::LookingForTeamMembers => "looking_for_team_members",
            ProductStatus::LookingForFeedback => "looking_for_feedback",
            ProductStatus::LookingForPartnership => "looking_for_partnership",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "looking_for_mentor" => Ok(ProductStatus::LookingForMentor),
            "looking_for_cofounder" => Ok(ProductStatus::LookingForCofounder),
            "offering_internship" => Ok(ProductStatus::OfferingInternship),
            "looking_for_investment" => Ok(ProductStatus::LookingForInvestment),
            "looking_for_team_members" => Ok(ProductStatus::LookingForTeamMembers),
            "looking_for_feedback" => Ok(ProductStatus::LookingForFeedback),
            "looking_for_partnership" => Ok(ProductStatus::LookingForPartnership),
            other => Err(DomainError::validation(format!("unknown product status '{other}'"))),
        }
    }
}

impl core::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text pitch fields of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDetails {
    pub name: String,
    pub description: String,
    pub link_to_product: String,
    pub price: String,
    pub logo: String,
    pub about: String,
    pub problem: String,
    pub decision: String,
    pub advantages: String,
    pub additional: String,
    pub link: String,
}

/// A product listing.
///
/// # Invariants
/// - `owner_id` is assigned at creation and never changes.
/// - Deletion is soft: `is_active` goes false and the listing reads as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub owner_id: AccountId,
    pub details: ProductDetails,
    pub status: ProductStatus,
    pub born_date: NaiveDate,
    pub post_date: NaiveDate,
    pub pictures: Vec<String>,
    pub is_active: bool,
}

/// Validated creation input.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub details: ProductDetails,
    pub status: ProductStatus,
    pub born_date: NaiveDate,
    pub pictures: Vec<String>,
}

impl NewProduct {
    pub fn new(
        details: ProductDetails,
        status: ProductStatus,
        born_date: NaiveDate,
        pictures: Vec<String>,
    ) -> DomainResult<Self> {
        ensure_product_name(&details.name)?;
        Ok(Self {
            details,
            status,
            born_date,
            pictures,
        })
    }

    /// Materialize the listing for `owner`, posted on `today`.
    pub fn into_product(self, id: ProductId, owner_id: AccountId, today: NaiveDate) -> Product {
        Product {
            id,
            owner_id,
            details: self.details,
            status: self.status,
            born_date: self.born_date,
            post_date: today,
            pictures: self.pictures,
            is_active: true,
        }
    }
}

/// Partial update. Owner and post date are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub link_to_product: Option<String>,
    pub price: Option<String>,
    pub logo: Option<String>,
    pub about: Option<String>,
    pub problem: Option<String>,
    pub decision: Option<String>,
    pub advantages: Option<String>,
    pub additional: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "status_of_project")]
    pub status: Option<ProductStatus>,
    pub born_date: Option<NaiveDate>,
    pub pictures: Option<Vec<String>>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Err(DomainError::validation(
                "at least one parameter for product update info should be provided",
            ));
        }
        if let Some(name) = &self.name {
            ensure_product_name(name)?;
        }
        Ok(())
    }

    pub fn apply(&self, product: &mut Product) {
        let d = &mut product.details;
        let text = [
            (&self.name, &mut d.name),
            (&self.description, &mut d.description),
            (&self.link_to_product, &mut d.link_to_product),
            (&self.price, &mut d.price),
            (&self.logo, &mut d.logo),
            (&self.about, &mut d.about),
            (&self.problem, &mut d.problem),
            (&self.decision, &mut d.decision),
            (&self.advantages, &mut d.advantages),
            (&self.additional, &mut d.additional),
            (&self.link, &mut d.link),
        ];
        for (patch, field) in text {
            if let Some(value) = patch {
                *field = value.clone();
            }
        }

        if let Some(status) = self.status {
            product.status = status;
        }
        if let Some(born_date) = self.born_date {
            product.born_date = born_date;
        }
        if let Some(pictures) = &self.pictures {
            product.pictures = pictures.clone();
        }
    }
}

fn ensure_product_name(name: &str) -> DomainResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("product name cannot be empty"));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == ' ')
    {
        return Err(DomainError::validation(
            "product name should contain only letters, digits, spaces or '-'",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn details(name: &str) -> ProductDetails {
        ProductDetails {
            name: name.to_string(),
            description: "Rockets for everyone".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn create_sets_owner_post_date_and_active() {
        let owner = AccountId::new();
        let new = NewProduct::new(details("Skyward 2"), ProductStatus::LookingForInvestment, date(2023, 1, 9), vec![])
            .unwrap();
        let product = new.into_product(ProductId::new(), owner, date(2024, 3, 1));

        assert_eq!(product.owner_id, owner);
        assert_eq!(product.post_date, date(2024, 3, 1));
        assert_eq!(product.born_date, date(2023, 1, 9));
        assert!(product.is_active);
    }

    #[test]
    fn blank_or_symbolic_name_is_rejected() {
        for name in ["", "   ", "Rocket!", "<script>"] {
            let res = NewProduct::new(details(name), ProductStatus::default(), date(2024, 1, 1), vec![]);
            assert!(res.is_err(), "accepted {name:?}");
        }
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(ProductPatch::default().validate().is_err());
    }

    #[test]
    fn patch_keeps_owner_and_untouched_fields() {
        let owner = AccountId::new();
        let mut product = NewProduct::new(details("Skyward"), ProductStatus::default(), date(2024, 1, 1), vec![])
            .unwrap()
            .into_product(ProductId::new(), owner, date(2024, 2, 1));

        let patch = ProductPatch {
            price: Some("free".into()),
            status: Some(ProductStatus::LookingForFeedback),
            ..Default::default()
        };
        patch.validate().unwrap();
        patch.apply(&mut product);

        assert_eq!(product.details.price, "free");
        assert_eq!(product.details.name, "Skyward");
        assert_eq!(product.status, ProductStatus::LookingForFeedback);
        assert_eq!(product.owner_id, owner);
    }

    #[test]
    fn status_labels_parse_back() {
        for status in [
            ProductStatus::LookingForMentor,
            ProductStatus::LookingForCofounder,
            ProductStatus::OfferingInternship,
            ProductStatus::LookingForInvestment,
            ProductStatus::LookingForTeamMembers,
            ProductStatus::LookingForFeedback,
            ProductStatus::LookingForPartnership,
        ] {
            assert_eq!(ProductStatus::parse(status.as_str()).unwrap(), status);
            assert_eq!(serde_json::to_value(status).unwrap(), status.as_str());
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Applying a patch never moves a listing to another owner.
            #[test]
            fn patch_never_changes_owner(name in "[A-Za-z][A-Za-z0-9 -]{0,40}", price in ".{0,20}") {
                let owner = AccountId::new();
                let mut product = NewProduct::new(details("Seed"), ProductStatus::default(), date(2024, 1, 1), vec![])
                    .unwrap()
                    .into_product(ProductId::new(), owner, date(2024, 1, 2));

                let patch = ProductPatch { name: Some(name.clone()), price: Some(price), ..Default::default() };
                prop_assert!(patch.validate().is_ok());
                patch.apply(&mut product);

                prop_assert_eq!(product.owner_id, owner);
                prop_assert_eq!(product.details.name, name);
            }
        }
    }
}
