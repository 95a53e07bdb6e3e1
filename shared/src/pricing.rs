//! Flash-sale pricing
//!
//! Discounted prices are computed with rust_decimal and rounded half away
//! from zero to a whole currency unit.

use crate::error::{AppError, ErrorCode};
use crate::models::{CartLine, FlashSale, FlashSaleProduct, Product, ProductView};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Maximum quantity of one cart line
pub const MAX_LINE_QUANTITY: i64 = 99;

/// Highest price an admin may set on a product
pub const MAX_PRICE: i64 = 1_000_000_000;

#[inline]
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// `round(original_price × (1 − discount_percentage / 100))`
///
/// Inputs are not validated: a negative discount raises the price and a
/// discount above 100 yields a negative price. Results outside the `i64`
/// range saturate.
pub fn flash_price(original_price: i64, discount_percentage: f64) -> i64 {
    let multiplier = Decimal::ONE - to_decimal(discount_percentage) / Decimal::ONE_HUNDRED;
    let saturated = if (original_price < 0) != multiplier.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    };
    Decimal::from(original_price)
        .checked_mul(multiplier)
        .and_then(|price| {
            price
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .unwrap_or(saturated)
}

impl FlashSale {
    /// Active iff enabled and `now` lies in `[start_date, end_date]`
    pub fn is_active_at(&self, now: i64) -> bool {
        self.is_active && self.start_date <= now && now <= self.end_date
    }

    /// Discount this sale grants to a product, `None` if not listed
    pub fn discount_for(&self, product_id: i64) -> Option<f64> {
        self.products
            .iter()
            .find(|p| p.product_id == product_id)
            .map(|p| p.discount_percentage.unwrap_or(self.global_discount_percentage))
    }
}

/// Highest discount among the sales active at `now` that list the product
pub fn resolve_discount(sales: &[FlashSale], product_id: i64, now: i64) -> Option<f64> {
    sales
        .iter()
        .filter(|sale| sale.is_active_at(now))
        .filter_map(|sale| sale.discount_for(product_id))
        .fold(None, |best: Option<f64>, d| match best {
            Some(b) if b >= d => Some(b),
            _ => Some(d),
        })
}

/// Storefront view of a product with its flash price resolved
pub fn price_product(product: Product, sales: &[FlashSale], now: i64) -> ProductView {
    let discount_percentage = resolve_discount(sales, product.id, now);
    let final_price = match discount_percentage {
        Some(d) => flash_price(product.price, d),
        None => product.price,
    };
    ProductView {
        product,
        discount_percentage,
        final_price,
    }
}

/// Admin-side bound check for discount fields
pub fn validate_discount(value: f64) -> Result<(), AppError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(AppError::discount_out_of_range(value))
    }
}

/// Admin-side product price bound
pub fn validate_price(price: i64) -> Result<(), AppError> {
    if !(0..=MAX_PRICE).contains(&price) {
        return Err(AppError::new(ErrorCode::ProductInvalidPrice).with_detail("price", price));
    }
    Ok(())
}

/// Admin-side check of a sale window and every product entry it carries.
///
/// A product may be listed once per sale.
pub fn validate_sale(
    global_discount: f64,
    entries: &[FlashSaleProduct],
    start_date: i64,
    end_date: i64,
) -> Result<(), AppError> {
    validate_discount(global_discount)?;
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.product_id) {
            return Err(AppError::validation("product listed twice in flash sale")
                .with_detail("product_id", entry.product_id));
        }
        if let Some(d) = entry.discount_percentage {
            validate_discount(d)?;
        }
    }
    if start_date >= end_date {
        return Err(AppError::new(ErrorCode::FlashSaleInvalidWindow)
            .with_detail("start_date", start_date)
            .with_detail("end_date", end_date));
    }
    Ok(())
}

/// A priced cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotedLine {
    pub product_id: i64,
    pub title: String,
    pub size: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub discount_percentage: Option<f64>,
    pub final_unit_price: i64,
    pub line_total: i64,
    pub available: i64,
    pub in_stock: bool,
}

/// Priced cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartQuote {
    pub lines: Vec<QuotedLine>,
    pub total: i64,
    pub all_in_stock: bool,
}

impl CartQuote {
    /// Lines sharing a product and size draw on the same stock, so `in_stock`
    /// is re-evaluated against their combined quantity.
    pub fn from_lines(mut lines: Vec<QuotedLine>) -> Self {
        let mut requested: BTreeMap<(i64, String), i64> = BTreeMap::new();
        for line in &lines {
            *requested
                .entry((line.product_id, line.size.clone()))
                .or_insert(0) += line.quantity;
        }
        for line in &mut lines {
            let wanted = requested
                .get(&(line.product_id, line.size.clone()))
                .copied()
                .unwrap_or(line.quantity);
            line.in_stock = wanted <= line.available;
        }

        let total = lines.iter().map(|l| l.line_total).sum();
        let all_in_stock = lines.iter().all(|l| l.in_stock);
        Self {
            lines,
            total,
            all_in_stock,
        }
    }
}

/// Price one cart line against the product's current state.
///
/// Fails for inactive products, unknown sizes, quantities outside
/// `1..=MAX_LINE_QUANTITY` and line totals that overflow. Insufficient stock
/// is reported through `in_stock`, not as an error.
pub fn quote_line(
    product: &Product,
    line: &CartLine,
    sales: &[FlashSale],
    now: i64,
) -> Result<QuotedLine, AppError> {
    if !product.is_active {
        return Err(AppError::new(ErrorCode::ProductInactive).with_detail("product_id", product.id));
    }
    if !(1..=MAX_LINE_QUANTITY).contains(&line.quantity) {
        return Err(AppError::new(ErrorCode::OrderInvalidQuantity)
            .with_detail("product_id", product.id)
            .with_detail("quantity", line.quantity));
    }
    let available = product.stock_for(&line.size).ok_or_else(|| {
        AppError::new(ErrorCode::ProductSizeNotFound)
            .with_detail("product_id", product.id)
            .with_detail("size", line.size.as_str())
    })?;

    let discount_percentage = resolve_discount(sales, product.id, now);
    let final_unit_price = match discount_percentage {
        Some(d) => flash_price(product.price, d),
        None => product.price,
    };
    let line_total = final_unit_price.checked_mul(line.quantity).ok_or_else(|| {
        AppError::new(ErrorCode::ProductInvalidPrice)
            .with_detail("product_id", product.id)
            .with_detail("price", final_unit_price)
    })?;

    Ok(QuotedLine {
        product_id: product.id,
        title: product.title.clone(),
        size: line.size.clone(),
        quantity: line.quantity,
        unit_price: product.price,
        discount_percentage,
        final_unit_price,
        line_total,
        available,
        in_stock: line.quantity <= available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlashSaleProduct;

    const NOW: i64 = 1_750_000_000_000;

    fn make_sale(global: f64, products: &[(i64, Option<f64>)]) -> FlashSale {
        FlashSale {
            id: 1,
            title: "Soldes".to_string(),
            description: None,
            global_discount_percentage: global,
            start_date: NOW - 1_000,
            end_date: NOW + 1_000,
            is_active: true,
            products: products
                .iter()
                .map(|(id, d)| FlashSaleProduct {
                    product_id: *id,
                    discount_percentage: *d,
                })
                .collect(),
            created_at: 0,
        }
    }

    fn make_product(id: i64, price: i64, sizes: &[(&str, i64)]) -> Product {
        Product {
            id,
            title: format!("Produit {id}"),
            description: None,
            category: "robes".to_string(),
            price,
            sizes: sizes.iter().map(|(s, q)| (s.to_string(), *q)).collect(),
            images: vec![],
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn cart_line(product_id: i64, size: &str, quantity: i64) -> CartLine {
        CartLine {
            product_id,
            size: size.to_string(),
            quantity,
        }
    }

    #[test]
    fn flash_price_reference_points() {
        assert_eq!(flash_price(10000, 25.0), 7500);
        assert_eq!(flash_price(10000, 0.0), 10000);
        assert_eq!(flash_price(10000, 100.0), 0);
    }

    #[test]
    fn flash_price_rounds_half_away_from_zero() {
        // 15 * 0.9 = 13.5
        assert_eq!(flash_price(15, 10.0), 14);
        // 999 * 0.67 = 669.33
        assert_eq!(flash_price(999, 33.0), 669);
        // 25 * 0.5 = 12.5
        assert_eq!(flash_price(25, 50.0), 13);
    }

    #[test]
    fn flash_price_does_not_validate() {
        assert_eq!(flash_price(1000, -10.0), 1100);
        assert_eq!(flash_price(1000, 150.0), -500);
    }

    #[test]
    fn flash_price_saturates_instead_of_wrapping() {
        assert_eq!(flash_price(i64::MAX, -10.0), i64::MAX);
        assert_eq!(flash_price(i64::MIN, -10.0), i64::MIN);
        assert_eq!(flash_price(i64::MAX, 0.0), i64::MAX);
    }

    #[test]
    fn price_bounds() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(MAX_PRICE).is_ok());
        assert_eq!(
            validate_price(-5).unwrap_err().code,
            ErrorCode::ProductInvalidPrice
        );
        assert_eq!(
            validate_price(MAX_PRICE + 1).unwrap_err().code,
            ErrorCode::ProductInvalidPrice
        );
    }

    #[test]
    fn sale_window_is_inclusive() {
        let sale = make_sale(10.0, &[]);
        assert!(sale.is_active_at(sale.start_date));
        assert!(sale.is_active_at(sale.end_date));
        assert!(!sale.is_active_at(sale.start_date - 1));
        assert!(!sale.is_active_at(sale.end_date + 1));
    }

    #[test]
    fn disabled_sale_is_never_active() {
        let mut sale = make_sale(10.0, &[]);
        sale.is_active = false;
        assert!(!sale.is_active_at(NOW));
    }

    #[test]
    fn entry_discount_overrides_global() {
        let sale = make_sale(10.0, &[(1, Some(30.0)), (2, None)]);
        assert_eq!(sale.discount_for(1), Some(30.0));
        assert_eq!(sale.discount_for(2), Some(10.0));
        assert_eq!(sale.discount_for(3), None);
    }

    #[test]
    fn highest_active_discount_wins() {
        let mut expired = make_sale(90.0, &[(1, None)]);
        expired.end_date = NOW - 1;
        let sales = vec![
            make_sale(10.0, &[(1, None)]),
            make_sale(5.0, &[(1, Some(40.0))]),
            expired,
        ];
        assert_eq!(resolve_discount(&sales, 1, NOW), Some(40.0));
        assert_eq!(resolve_discount(&sales, 2, NOW), None);
    }

    #[test]
    fn price_product_applies_resolved_discount() {
        let sales = vec![make_sale(25.0, &[(1, None)])];
        let view = price_product(make_product(1, 10000, &[("M", 1)]), &sales, NOW);
        assert_eq!(view.discount_percentage, Some(25.0));
        assert_eq!(view.final_price, 7500);

        let view = price_product(make_product(2, 10000, &[("M", 1)]), &sales, NOW);
        assert_eq!(view.discount_percentage, None);
        assert_eq!(view.final_price, 10000);
    }

    #[test]
    fn discount_validation_bounds() {
        assert!(validate_discount(0.0).is_ok());
        assert!(validate_discount(100.0).is_ok());
        assert!(validate_discount(-0.5).is_err());
        assert!(validate_discount(100.5).is_err());
        assert!(validate_discount(f64::NAN).is_err());
    }

    #[test]
    fn sale_validation_checks_entries_and_window() {
        let entries = make_sale(10.0, &[(1, Some(20.0)), (2, None)]).products;
        assert!(validate_sale(10.0, &entries, 1, 2).is_ok());

        let entries = make_sale(10.0, &[(1, Some(120.0))]).products;
        let err = validate_sale(10.0, &entries, 1, 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::DiscountOutOfRange);

        let err = validate_sale(10.0, &[], 2, 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::FlashSaleInvalidWindow);
    }

    #[test]
    fn sale_validation_rejects_repeated_product() {
        let entries = make_sale(10.0, &[(1, None), (2, None), (1, Some(30.0))]).products;
        let err = validate_sale(10.0, &entries, 1, 2).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn quote_line_prices_with_discount() {
        let product = make_product(1, 10000, &[("M", 5)]);
        let sales = vec![make_sale(25.0, &[(1, None)])];
        let line = quote_line(&product, &cart_line(1, "M", 2), &sales, NOW).unwrap();

        assert_eq!(line.unit_price, 10000);
        assert_eq!(line.final_unit_price, 7500);
        assert_eq!(line.line_total, 15000);
        assert!(line.in_stock);
    }

    #[test]
    fn quote_line_reports_shortage_without_failing() {
        let product = make_product(1, 10000, &[("M", 1)]);
        let line = quote_line(&product, &cart_line(1, "M", 3), &[], NOW).unwrap();
        assert!(!line.in_stock);
        assert_eq!(line.available, 1);
    }

    #[test]
    fn quote_line_rejects_bad_input() {
        let product = make_product(1, 10000, &[("M", 5)]);

        let err = quote_line(&product, &cart_line(1, "XL", 1), &[], NOW).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductSizeNotFound);

        let err = quote_line(&product, &cart_line(1, "M", 0), &[], NOW).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderInvalidQuantity);

        let err = quote_line(&product, &cart_line(1, "M", 100), &[], NOW).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderInvalidQuantity);

        let mut inactive = product.clone();
        inactive.is_active = false;
        let err = quote_line(&inactive, &cart_line(1, "M", 1), &[], NOW).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInactive);

        let pricey = make_product(1, i64::MAX, &[("M", 5)]);
        let err = quote_line(&pricey, &cart_line(1, "M", 2), &[], NOW).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);
    }

    #[test]
    fn cart_quote_sums_lines_of_same_size() {
        let product = make_product(1, 1000, &[("M", 5), ("L", 5)]);
        let lines = vec![
            quote_line(&product, &cart_line(1, "M", 3), &[], NOW).unwrap(),
            quote_line(&product, &cart_line(1, "M", 3), &[], NOW).unwrap(),
            quote_line(&product, &cart_line(1, "L", 3), &[], NOW).unwrap(),
        ];
        assert!(lines.iter().all(|l| l.in_stock));

        let quote = CartQuote::from_lines(lines);
        assert!(!quote.all_in_stock);
        assert!(!quote.lines[0].in_stock);
        assert!(!quote.lines[1].in_stock);
        assert!(quote.lines[2].in_stock);
        assert_eq!(quote.total, 9000);
    }

    #[test]
    fn cart_quote_totals() {
        let a = make_product(1, 1000, &[("S", 1)]);
        let b = make_product(2, 2500, &[("M", 4)]);
        let lines = vec![
            quote_line(&a, &cart_line(1, "S", 2), &[], NOW).unwrap(),
            quote_line(&b, &cart_line(2, "M", 2), &[], NOW).unwrap(),
        ];
        let quote = CartQuote::from_lines(lines);
        assert_eq!(quote.total, 7000);
        assert!(!quote.all_in_stock);
    }
}
