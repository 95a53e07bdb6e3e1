//! Stock comparison
//!
//! Reconciles stock additions recorded in the stock history against the
//! quantities of non-cancelled order lines, per product. Products whose
//! stock was overwritten by hand are left out since their history no longer
//! describes their stock.

use crate::models::{OrderLine, SizeStock, StockHistoryEntry};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Remaining share at or below which a product counts as low on stock
pub const LOW_STOCK_PERCENT: i64 = 20;

/// Product identity fed to the comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductRef {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
    /// More ordered than ever added
    Anomaly,
}

impl StockStatus {
    /// Anomaly first, then out of stock, then the low-stock threshold
    pub fn classify(total_added: i64, total_remaining: i64) -> Self {
        if total_remaining < 0 {
            StockStatus::Anomaly
        } else if total_remaining == 0 {
            StockStatus::OutOfStock
        } else if total_remaining * 100 <= total_added * LOW_STOCK_PERCENT {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductComparisonRow {
    pub id: i64,
    pub title: String,
    pub added_by_size: SizeStock,
    pub ordered_by_size: SizeStock,
    pub total_added: i64,
    pub total_ordered: i64,
    pub total_remaining: i64,
    /// `100 × remaining / added`, 0 when nothing was added
    pub remaining_percentage: f64,
    pub status: StockStatus,
}

impl ProductComparisonRow {
    fn new(product: &ProductRef, added_by_size: SizeStock, ordered_by_size: SizeStock) -> Self {
        let total_added: i64 = added_by_size.values().sum();
        let total_ordered: i64 = ordered_by_size.values().sum();
        let total_remaining = total_added - total_ordered;
        let remaining_percentage = if total_added > 0 {
            100.0 * total_remaining as f64 / total_added as f64
        } else {
            0.0
        };

        Self {
            id: product.id,
            title: product.title.clone(),
            added_by_size,
            ordered_by_size,
            total_added,
            total_ordered,
            total_remaining,
            remaining_percentage,
            status: StockStatus::classify(total_added, total_remaining),
        }
    }
}

/// Row counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub in_stock: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub anomaly: usize,
}

impl ComparisonSummary {
    fn count(&mut self, status: StockStatus) {
        self.total += 1;
        match status {
            StockStatus::InStock => self.in_stock += 1,
            StockStatus::LowStock => self.low_stock += 1,
            StockStatus::OutOfStock => self.out_of_stock += 1,
            StockStatus::Anomaly => self.anomaly += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockComparison {
    pub rows: Vec<ProductComparisonRow>,
    pub summary: ComparisonSummary,
}

impl StockComparison {
    /// Rows with the given status, all rows for `None`
    pub fn filter(&self, status: Option<StockStatus>) -> impl Iterator<Item = &ProductComparisonRow> {
        self.rows
            .iter()
            .filter(move |row| status.is_none_or(|s| row.status == s))
    }
}

/// Build one row per non-edited product, in input order.
///
/// History entries created before `reference_date` are ignored. Order lines
/// are expected to be pre-filtered to the same period by the caller.
pub fn compute_comparison(
    products: &[ProductRef],
    history: &[StockHistoryEntry],
    lines: &[OrderLine],
    edited: &HashSet<i64>,
    reference_date: Option<i64>,
) -> StockComparison {
    let mut added: HashMap<i64, SizeStock> = HashMap::new();
    for entry in history
        .iter()
        .filter(|e| reference_date.is_none_or(|cutoff| e.created_at >= cutoff))
    {
        let sizes = added.entry(entry.product_id).or_default();
        for (size, qty) in &entry.added_by_size {
            *sizes.entry(size.clone()).or_insert(0) += qty;
        }
    }

    let mut ordered: HashMap<i64, SizeStock> = HashMap::new();
    for line in lines.iter().filter(|l| l.status.counts_as_ordered()) {
        *ordered
            .entry(line.product_id)
            .or_default()
            .entry(line.size.clone())
            .or_insert(0) += line.quantity;
    }

    let mut summary = ComparisonSummary::default();
    let rows = products
        .iter()
        .filter(|p| !edited.contains(&p.id))
        .map(|p| {
            let row = ProductComparisonRow::new(
                p,
                added.remove(&p.id).unwrap_or_default(),
                ordered.remove(&p.id).unwrap_or_default(),
            );
            summary.count(row.status);
            row
        })
        .collect();

    StockComparison { rows, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderStatus;

    fn make_product(id: i64) -> ProductRef {
        ProductRef {
            id,
            title: format!("Produit {id}"),
        }
    }

    fn make_entry(product_id: i64, sizes: &[(&str, i64)], created_at: i64) -> StockHistoryEntry {
        StockHistoryEntry {
            id: created_at,
            product_id,
            added_by_size: sizes.iter().map(|(s, q)| (s.to_string(), *q)).collect(),
            note: None,
            created_at,
        }
    }

    fn make_line(product_id: i64, size: &str, quantity: i64, status: OrderStatus) -> OrderLine {
        OrderLine {
            product_id,
            size: size.to_string(),
            quantity,
            status,
        }
    }

    fn single_row(added: i64, ordered: i64) -> ProductComparisonRow {
        let history = [make_entry(1, &[("M", added)], 10)];
        let lines = [make_line(1, "M", ordered, OrderStatus::Confirmed)];
        let cmp = compute_comparison(&[make_product(1)], &history, &lines, &HashSet::new(), None);
        cmp.rows.into_iter().next().unwrap()
    }

    #[test]
    fn never_anomaly_when_ordered_within_added() {
        for a in 0..40 {
            for o in 0..=a {
                let row = single_row(a, o);
                assert_eq!(row.total_remaining, a - o);
                assert!(row.total_remaining >= 0);
                assert_ne!(row.status, StockStatus::Anomaly, "a={a} o={o}");
            }
        }
    }

    #[test]
    fn always_anomaly_when_oversold() {
        for a in 0..40 {
            for o in (a + 1)..(a + 10) {
                assert_eq!(single_row(a, o).status, StockStatus::Anomaly, "a={a} o={o}");
            }
        }
    }

    #[test]
    fn twenty_percent_is_low_stock() {
        let row = single_row(100, 80);
        assert_eq!(row.remaining_percentage, 20.0);
        assert_eq!(row.status, StockStatus::LowStock);
    }

    #[test]
    fn twenty_one_percent_is_in_stock() {
        let row = single_row(100, 79);
        assert_eq!(row.remaining_percentage, 21.0);
        assert_eq!(row.status, StockStatus::InStock);
    }

    #[test]
    fn zero_remaining_is_out_of_stock() {
        assert_eq!(single_row(10, 10).status, StockStatus::OutOfStock);
        assert_eq!(single_row(0, 0).status, StockStatus::OutOfStock);
        assert_eq!(single_row(0, 0).remaining_percentage, 0.0);
    }

    #[test]
    fn sums_sizes_and_entries() {
        let history = [
            make_entry(1, &[("S", 3), ("M", 5)], 10),
            make_entry(1, &[("M", 2)], 20),
            make_entry(2, &[("L", 7)], 30),
        ];
        let lines = [
            make_line(1, "M", 4, OrderStatus::Pending),
            make_line(1, "S", 1, OrderStatus::Delivered),
        ];
        let cmp = compute_comparison(
            &[make_product(1), make_product(2)],
            &history,
            &lines,
            &HashSet::new(),
            None,
        );

        let row = &cmp.rows[0];
        assert_eq!(row.added_by_size.get("S"), Some(&3));
        assert_eq!(row.added_by_size.get("M"), Some(&7));
        assert_eq!(row.total_added, 10);
        assert_eq!(row.ordered_by_size.get("M"), Some(&4));
        assert_eq!(row.total_ordered, 5);
        assert_eq!(row.total_remaining, 5);
        assert_eq!(row.status, StockStatus::InStock);

        assert_eq!(cmp.rows[1].total_added, 7);
        assert_eq!(cmp.rows[1].total_ordered, 0);
    }

    #[test]
    fn cancelled_lines_are_not_ordered() {
        let history = [make_entry(1, &[("M", 5)], 10)];
        let lines = [
            make_line(1, "M", 5, OrderStatus::Cancelled),
            make_line(1, "M", 1, OrderStatus::Shipped),
        ];
        let cmp = compute_comparison(&[make_product(1)], &history, &lines, &HashSet::new(), None);
        assert_eq!(cmp.rows[0].total_ordered, 1);
    }

    #[test]
    fn reference_date_drops_older_history() {
        let history = [
            make_entry(1, &[("M", 50)], 100),
            make_entry(1, &[("M", 10)], 200),
        ];
        let cmp = compute_comparison(&[make_product(1)], &history, &[], &HashSet::new(), Some(200));
        assert_eq!(cmp.rows[0].total_added, 10);
    }

    #[test]
    fn edited_products_are_excluded() {
        let edited: HashSet<i64> = [2].into_iter().collect();
        let cmp = compute_comparison(
            &[make_product(1), make_product(2), make_product(3)],
            &[],
            &[],
            &edited,
            None,
        );
        let ids: Vec<i64> = cmp.rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(cmp.summary.total, 2);
    }

    #[test]
    fn rows_keep_input_order_and_summary_counts() {
        let history = [
            make_entry(3, &[("M", 10)], 1),
            make_entry(1, &[("M", 10)], 1),
            make_entry(2, &[("M", 10)], 1),
        ];
        let lines = [
            make_line(1, "M", 12, OrderStatus::Pending),
            make_line(2, "M", 9, OrderStatus::Pending),
            make_line(3, "M", 10, OrderStatus::Pending),
        ];
        let products = [make_product(3), make_product(1), make_product(2), make_product(4)];
        let cmp = compute_comparison(&products, &history, &lines, &HashSet::new(), None);

        let ids: Vec<i64> = cmp.rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2, 4]);
        assert_eq!(
            cmp.summary,
            ComparisonSummary {
                total: 4,
                in_stock: 0,
                low_stock: 1,
                out_of_stock: 2,
                anomaly: 1,
            }
        );
    }

    #[test]
    fn filter_is_a_predicate_over_rows() {
        let history = [make_entry(1, &[("M", 10)], 1), make_entry(2, &[("M", 10)], 1)];
        let lines = [make_line(1, "M", 11, OrderStatus::Pending)];
        let cmp = compute_comparison(
            &[make_product(1), make_product(2)],
            &history,
            &lines,
            &HashSet::new(),
            None,
        );

        let anomalies: Vec<i64> = cmp.filter(Some(StockStatus::Anomaly)).map(|r| r.id).collect();
        assert_eq!(anomalies, vec![1]);
        assert_eq!(cmp.filter(None).count(), 2);
        assert_eq!(cmp.filter(Some(StockStatus::LowStock)).count(), 0);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&StockStatus::OutOfStock).unwrap(),
            "\"out_of_stock\""
        );
        let s: StockStatus = serde_json::from_str("\"low_stock\"").unwrap();
        assert_eq!(s, StockStatus::LowStock);
    }
}
