//! Money calculation utilities using rust_decimal for precision
//!
//! Order totals are computed once at creation, in `Decimal`, then converted
//! to `f64` for storage and serialization. They are never recomputed; the
//! price ledger upstream owns the unit price.

use rust_decimal::prelude::*;
use shared::error::{AppError, AppResult};
use shared::order::{ItemModifier, NewOrderItem};

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price per item
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per item
const MAX_QUANTITY: u32 = 9999;

/// Order-level totals computed at creation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub modifiers_total: f64,
    pub discount_total: f64,
    pub total_amount: f64,
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::validation(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate one creation item before persisting.
pub fn validate_new_item(item: &NewOrderItem) -> AppResult<()> {
    if item.name.trim().is_empty() {
        return Err(AppError::validation("item name must not be empty"));
    }

    if item.quantity == 0 {
        return Err(AppError::validation(format!(
            "quantity must be positive for item '{}'",
            item.name
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, item.quantity
        )));
    }

    require_finite(item.unit_price, "unit_price")?;
    if item.unit_price < 0.0 {
        return Err(AppError::validation(format!(
            "unit_price must be non-negative, got {}",
            item.unit_price
        )));
    }
    if item.unit_price > MAX_PRICE {
        return Err(AppError::validation(format!(
            "unit_price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, item.unit_price
        )));
    }

    for modifier in &item.modifiers {
        require_finite(modifier.price, "modifier price")?;
        if modifier.price.abs() > MAX_PRICE {
            return Err(AppError::validation(format!(
                "modifier price exceeds maximum allowed, got {}",
                modifier.price
            )));
        }
    }

    Ok(())
}

/// Validate an order-level discount amount.
pub fn validate_discount(discount_total: f64) -> AppResult<()> {
    require_finite(discount_total, "discount_total")?;
    if discount_total < 0.0 {
        return Err(AppError::validation(format!(
            "discount_total must be non-negative, got {}",
            discount_total
        )));
    }
    Ok(())
}

/// Resolve the order currency: explicit input wins, blank falls back to the
/// server default. Codes are ISO 4217 alpha-3, normalized to upper case.
pub fn normalize_currency(currency: Option<&str>, default_currency: &str) -> AppResult<String> {
    let code = match currency.map(str::trim) {
        Some(code) if !code.is_empty() => code,
        _ => default_currency.trim(),
    };
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::validation(format!(
            "currency must be a 3-letter ISO 4217 code, got '{}'",
            code
        )));
    }
    Ok(code.to_ascii_uppercase())
}

/// Sum of the per-unit modifier prices for one item.
pub fn modifiers_total(modifiers: &[ItemModifier]) -> Decimal {
    modifiers.iter().map(|m| to_decimal(m.price)).sum()
}

/// Line total: (unit_price + modifiers) * quantity.
pub fn line_total(unit_price: f64, modifiers: &[ItemModifier], quantity: u32) -> Decimal {
    let per_unit = to_decimal(unit_price) + modifiers_total(modifiers);
    (per_unit * Decimal::from(quantity))
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute the order totals from the creation items and the order-level
/// discount. `total_amount = subtotal + modifiers_total - discount_total`,
/// clamped to non-negative.
pub fn order_totals(items: &[NewOrderItem], discount_total: f64) -> OrderTotals {
    let mut subtotal = Decimal::ZERO;
    let mut modifiers = Decimal::ZERO;

    for item in items {
        let quantity = Decimal::from(item.quantity);
        subtotal += to_decimal(item.unit_price) * quantity;
        modifiers += modifiers_total(&item.modifiers) * quantity;
    }

    let discount = to_decimal(discount_total);
    let total = (subtotal + modifiers - discount).max(Decimal::ZERO);

    OrderTotals {
        subtotal: to_f64(subtotal),
        modifiers_total: to_f64(modifiers),
        discount_total: to_f64(discount),
        total_amount: to_f64(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(name: &str, unit_price: f64, quantity: u32) -> NewOrderItem {
        NewOrderItem {
            product_id: None,
            name: name.to_string(),
            description: None,
            image_url: None,
            quantity,
            unit_price,
            price_entry_id: None,
            modifiers: Vec::new(),
            special_instructions: None,
        }
    }

    #[test]
    fn test_to_decimal_precision() {
        // Classic floating point problem: 0.1 + 0.2 != 0.3
        let sum_f64 = 0.1_f64 + 0.2_f64;
        assert_ne!(sum_f64, 0.3);

        let sum_dec = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum_dec), 0.3);
    }

    #[test]
    fn test_accumulation_precision() {
        // 100 items at 0.01 each
        let items: Vec<NewOrderItem> = (0..100).map(|i| new_item(&format!("p{}", i), 0.01, 1)).collect();
        let totals = order_totals(&items, 0.0);
        assert_eq!(totals.subtotal, 1.0);
        assert_eq!(totals.total_amount, 1.0);
    }

    #[test]
    fn test_line_total_with_modifiers() {
        let modifiers = vec![
            ItemModifier {
                name: "Size".to_string(),
                option: "Large".to_string(),
                price: 3.0,
            },
            ItemModifier {
                name: "Topping".to_string(),
                option: "Extra Cheese".to_string(),
                price: 1.5,
            },
        ];
        // (12.0 + 4.5) * 2 = 33.0
        assert_eq!(to_f64(line_total(12.0, &modifiers, 2)), 33.0);
    }

    #[test]
    fn test_order_totals_with_discount() {
        let mut item = new_item("Pizza", 10.99, 3);
        item.modifiers.push(ItemModifier {
            name: "Extra".to_string(),
            option: "Cheese".to_string(),
            price: 0.5,
        });
        let totals = order_totals(&[item], 2.0);
        // subtotal 32.97, modifiers 1.50, total 32.47
        assert_eq!(totals.subtotal, 32.97);
        assert_eq!(totals.modifiers_total, 1.5);
        assert_eq!(totals.discount_total, 2.0);
        assert_eq!(totals.total_amount, 32.47);
    }

    #[test]
    fn test_discount_exceeding_subtotal_clamps_to_zero() {
        let totals = order_totals(&[new_item("Coffee", 2.0, 1)], 10.0);
        assert_eq!(totals.total_amount, 0.0);
    }

    #[test]
    fn test_validate_new_item_ok() {
        assert!(validate_new_item(&new_item("Coffee", 2.5, 1)).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        assert!(validate_new_item(&new_item("Coffee", 2.5, 0)).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        assert!(validate_new_item(&new_item("   ", 2.5, 1)).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        assert!(validate_new_item(&new_item("Coffee", -0.01, 1)).is_err());
    }

    #[test]
    fn test_validate_rejects_nan_price() {
        assert!(validate_new_item(&new_item("Coffee", f64::NAN, 1)).is_err());
    }

    #[test]
    fn test_validate_rejects_excessive_price() {
        assert!(validate_new_item(&new_item("Coffee", MAX_PRICE + 1.0, 1)).is_err());
    }

    #[test]
    fn test_validate_rejects_infinite_modifier() {
        let mut item = new_item("Coffee", 2.5, 1);
        item.modifiers.push(ItemModifier {
            name: "Milk".to_string(),
            option: "Oat".to_string(),
            price: f64::INFINITY,
        });
        assert!(validate_new_item(&item).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(0.0).is_ok());
        assert!(validate_discount(5.0).is_ok());
        assert!(validate_discount(-1.0).is_err());
        assert!(validate_discount(f64::NAN).is_err());
    }

    #[test]
    fn test_normalize_currency() {
        assert_eq!(normalize_currency(Some("usd"), "EUR").unwrap(), "USD");
        assert_eq!(normalize_currency(None, "EUR").unwrap(), "EUR");
        assert_eq!(normalize_currency(Some("  "), "EUR").unwrap(), "EUR");
        assert!(normalize_currency(Some("EURO"), "EUR").is_err());
        assert!(normalize_currency(Some("E1R"), "EUR").is_err());
    }
}
