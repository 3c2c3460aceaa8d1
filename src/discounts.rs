//! Affiliate discount creation through the Admin API.
//!
//! A discount is two Admin API resources: a price rule holding the discount
//! logic, and a discount code under it that customers type at checkout.
//! [`create_discount`] creates both, in that order.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopify_bridge::clients::AdminClient;
//! use shopify_bridge::discounts::{create_discount, DiscountRequest};
//!
//! let client = AdminClient::new(&config, &shop, &store.access_token)?;
//! let request = DiscountRequest::new("brand-1", "CREATOR-ANNA-10", 10.0);
//! let created = create_discount(&client, &request).await?;
//! println!("price rule {}", created.price_rule["id"]);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::clients::{AdminClient, HttpError};

/// The type of value for the price rule discount.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceRuleValueType {
    /// A percentage discount.
    Percentage,
}

/// How the discount is allocated to qualifying items.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceRuleAllocationMethod {
    /// The discount is spread across all qualifying items.
    Across,
}

/// Which customers are eligible for the price rule.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceRuleCustomerSelection {
    /// All customers are eligible.
    All,
}

/// The type of target for the price rule.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceRuleTargetType {
    /// The discount applies to line items.
    LineItem,
}

/// Which items the price rule targets.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceRuleTargetSelection {
    /// The discount applies to all items.
    All,
}

/// Step names reported when a discount call fails.
pub const STEP_CREATE_PRICE_RULE: &str = "create_price_rule";
/// See [`STEP_CREATE_PRICE_RULE`].
pub const STEP_CREATE_DISCOUNT_CODE: &str = "create_discount_code";

/// A request to create an affiliate discount.
///
/// Field names follow the route's JSON body (`brandId`, `code`,
/// `percentage`). Missing fields deserialize to empty values and are caught
/// by [`DiscountRequest::validate`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscountRequest {
    /// The brand whose store receives the discount.
    #[serde(rename = "brandId")]
    pub brand_id: String,
    /// The code customers enter at checkout.
    pub code: String,
    /// The discount in percent, `0 < percentage <= 100`.
    pub percentage: f64,
}

impl DiscountRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(brand_id: impl Into<String>, code: impl Into<String>, percentage: f64) -> Self {
        Self {
            brand_id: brand_id.into(),
            code: code.into(),
            percentage,
        }
    }

    /// Checks that every field is usable.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::InvalidInput`] for an empty brand id or code,
    /// or a percentage outside `(0, 100]`.
    pub fn validate(&self) -> Result<(), DiscountError> {
        if self.brand_id.trim().is_empty()
            || self.code.trim().is_empty()
            || self.percentage == 0.0
        {
            return Err(DiscountError::InvalidInput {
                reason: "Missing brandId, code or percentage".to_string(),
            });
        }
        if !self.percentage.is_finite() || self.percentage < 0.0 || self.percentage > 100.0 {
            return Err(DiscountError::InvalidInput {
                reason: format!(
                    "percentage must be greater than 0 and at most 100, got {}",
                    self.percentage
                ),
            });
        }
        Ok(())
    }
}

/// The body of a new price rule.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewPriceRule {
    /// Internal title, `Affiliate {code}`.
    pub title: String,
    /// Always line items.
    pub target_type: PriceRuleTargetType,
    /// Always all items.
    pub target_selection: PriceRuleTargetSelection,
    /// Spread across the order.
    pub allocation_method: PriceRuleAllocationMethod,
    /// Always a percentage.
    pub value_type: PriceRuleValueType,
    /// Negative discount value.
    pub value: f64,
    /// Every customer is eligible.
    pub customer_selection: PriceRuleCustomerSelection,
    /// Customers may reuse the code.
    pub once_per_customer: bool,
    /// `None` serializes as `null`, meaning unlimited.
    pub usage_limit: Option<u32>,
    /// When the rule becomes active.
    pub starts_at: DateTime<Utc>,
}

impl NewPriceRule {
    /// Builds the price rule for an affiliate code.
    ///
    /// `percentage` is a validated value in `(0, 100]`; Shopify expects
    /// discounts as negative values, so it is sent negated.
    #[must_use]
    pub fn affiliate(code: &str, percentage: f64, starts_at: DateTime<Utc>) -> Self {
        Self {
            title: format!("Affiliate {code}"),
            target_type: PriceRuleTargetType::LineItem,
            target_selection: PriceRuleTargetSelection::All,
            allocation_method: PriceRuleAllocationMethod::Across,
            value_type: PriceRuleValueType::Percentage,
            value: -percentage,
            customer_selection: PriceRuleCustomerSelection::All,
            once_per_customer: false,
            usage_limit: None,
            starts_at,
        }
    }
}

/// The resources created for one discount.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedDiscount {
    /// The `price_rule` object Shopify returned.
    pub price_rule: Value,
    /// The `discount_code` object Shopify returned.
    pub discount: Value,
}

/// Errors from [`create_discount`].
#[derive(Debug, Error)]
pub enum DiscountError {
    /// The request failed validation; nothing was sent.
    #[error("{reason}")]
    InvalidInput {
        /// Description of the problem.
        reason: String,
    },

    /// An Admin API call failed.
    #[error("{step} failed: {source}")]
    Step {
        /// The failed step.
        step: &'static str,
        /// The underlying error.
        #[source]
        source: HttpError,
    },

    /// An Admin API call succeeded but its body lacked a required field.
    #[error("{step} returned an unexpected response: {reason}")]
    UnexpectedResponse {
        /// The step whose response was unusable.
        step: &'static str,
        /// What was missing.
        reason: String,
    },
}

impl DiscountError {
    /// Returns the failed step, if the error came from an API call.
    #[must_use]
    pub const fn step(&self) -> Option<&'static str> {
        match self {
            Self::InvalidInput { .. } => None,
            Self::Step { step, .. } | Self::UnexpectedResponse { step, .. } => Some(*step),
        }
    }
}

/// Creates a price rule and its discount code.
///
/// The calls are not transactional: if the code cannot be created, the price
/// rule created by the first call is left in place.
///
/// # Errors
///
/// - [`DiscountError::InvalidInput`] if the request fails validation
/// - [`DiscountError::Step`] if either Admin API call fails
/// - [`DiscountError::UnexpectedResponse`] if the price rule has no id
pub async fn create_discount(
    client: &AdminClient,
    request: &DiscountRequest,
) -> Result<CreatedDiscount, DiscountError> {
    request.validate()?;

    let price_rule = NewPriceRule::affiliate(&request.code, request.percentage, Utc::now());
    let response = client
        .post_json("price_rules.json", &json!({ "price_rule": price_rule }))
        .await
        .map_err(|source| DiscountError::Step {
            step: STEP_CREATE_PRICE_RULE,
            source,
        })?;

    let price_rule = response.body.get("price_rule").cloned().unwrap_or(Value::Null);
    let price_rule_id = price_rule
        .get("id")
        .filter(|id| id.is_number() || id.is_string())
        .map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .ok_or_else(|| DiscountError::UnexpectedResponse {
            step: STEP_CREATE_PRICE_RULE,
            reason: "missing price_rule.id".to_string(),
        })?;

    tracing::info!(price_rule_id = %price_rule_id, code = %request.code, "created price rule");

    let response = client
        .post_json(
            &format!("price_rules/{price_rule_id}/discount_codes.json"),
            &json!({ "discount_code": { "code": request.code } }),
        )
        .await
        .map_err(|source| DiscountError::Step {
            step: STEP_CREATE_DISCOUNT_CODE,
            source,
        })?;

    let discount = response
        .body
        .get("discount_code")
        .cloned()
        .unwrap_or(Value::Null);

    Ok(CreatedDiscount {
        price_rule,
        discount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_affiliate_price_rule_serialization() {
        let starts_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let rule = NewPriceRule::affiliate("ANNA10", 10.0, starts_at);
        let json = serde_json::to_value(&rule).unwrap();

        assert_eq!(json["title"], "Affiliate ANNA10");
        assert_eq!(json["target_type"], "line_item");
        assert_eq!(json["target_selection"], "all");
        assert_eq!(json["allocation_method"], "across");
        assert_eq!(json["value_type"], "percentage");
        assert_eq!(json["value"], -10.0);
        assert_eq!(json["customer_selection"], "all");
        assert_eq!(json["once_per_customer"], false);
        assert!(json["usage_limit"].is_null());
        assert!(json.as_object().unwrap().contains_key("usage_limit"));
        assert!(json["starts_at"].as_str().unwrap().starts_with("2024-03-01T12:00:00"));
    }

    #[test]
    fn test_negative_percentage_is_rejected_not_normalized() {
        let rule = NewPriceRule::affiliate("X", 15.0, Utc::now());
        assert!((rule.value + 15.0).abs() < f64::EPSILON);

        match DiscountRequest::new("b", "X", -15.0).validate() {
            Err(DiscountError::InvalidInput { reason }) => {
                assert!(reason.contains("greater than 0"), "{reason}");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_request_deserializes_route_body() {
        let request: DiscountRequest =
            serde_json::from_str(r#"{"brandId":"b1","code":"C","percentage":12.5}"#).unwrap();
        assert_eq!(request, DiscountRequest::new("b1", "C", 12.5));

        let partial: DiscountRequest = serde_json::from_str(r#"{"code":"C"}"#).unwrap();
        assert!(partial.brand_id.is_empty());
        assert!(matches!(
            partial.validate(),
            Err(DiscountError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_validate_percentage_bounds() {
        assert!(DiscountRequest::new("b", "C", 100.0).validate().is_ok());
        assert!(DiscountRequest::new("b", "C", 0.5).validate().is_ok());
        assert!(DiscountRequest::new("b", "C", 0.0).validate().is_err());
        assert!(DiscountRequest::new("b", "C", -5.0).validate().is_err());
        assert!(DiscountRequest::new("b", "C", 100.5).validate().is_err());
        assert!(DiscountRequest::new("b", "C", f64::NAN).validate().is_err());
        assert!(DiscountRequest::new("  ", "C", 10.0).validate().is_err());
    }

    #[test]
    fn test_error_step() {
        let error = DiscountError::UnexpectedResponse {
            step: STEP_CREATE_PRICE_RULE,
            reason: "missing".to_string(),
        };
        assert_eq!(error.step(), Some("create_price_rule"));
        assert_eq!(
            DiscountError::InvalidInput {
                reason: String::new()
            }
            .step(),
            None
        );
    }
}
