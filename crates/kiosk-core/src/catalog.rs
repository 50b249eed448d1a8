//! # Catalog Filtering
//!
//! In-memory filtering of the product list the register shows.
//! Search matches the name case-insensitively or the barcode as a substring.

use serde::{Deserialize, Serialize};

use crate::types::{Category, Product};

/// Search text plus an optional category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub search: String,
    pub category: Option<Category>,
}

impl ProductFilter {
    pub fn new(search: impl Into<String>, category: Option<Category>) -> Self {
        ProductFilter {
            search: search.into(),
            category,
        }
    }

    /// Checks a single product against the filter.
    ///
    /// An empty search matches everything.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category {
            if product.category != category {
                return false;
            }
        }

        let needle = self.search.trim();
        if needle.is_empty() {
            return true;
        }

        product.name.to_lowercase().contains(&needle.to_lowercase()) || product.barcode.contains(needle)
    }

    /// Returns the matching products in their original order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Products under the low-stock threshold, lowest stock first.
pub fn low_stock(products: &[Product], threshold: i64) -> Vec<&Product> {
    let mut low: Vec<&Product> = products.iter().filter(|p| p.is_low_stock(threshold)).collect();
    low.sort_by_key(|p| p.stock);
    low
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn catalog() -> Vec<Product> {
        vec![
            Product::new("7790001", "Agua 500ml", Money::from_cents(1000), 25, Category::Beverages),
            Product::new("7790002", "Coca Cola", Money::from_cents(1800), 4, Category::Beverages),
            Product::new("7791234", "Papas Lays", Money::from_cents(1500), 0, Category::Snacks),
        ]
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let products = catalog();
        assert_eq!(ProductFilter::default().apply(&products).len(), 3);
    }

    #[test]
    fn test_search_by_name_case_insensitive() {
        let products = catalog();
        let found = ProductFilter::new("COCA", None).apply(&products);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Coca Cola");
    }

    #[test]
    fn test_search_by_barcode_substring() {
        let products = catalog();
        let found = ProductFilter::new("1234", None).apply(&products);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].barcode, "7791234");
    }

    #[test]
    fn test_category_filter_combines_with_search() {
        let products = catalog();
        let filter = ProductFilter::new("779", Some(Category::Beverages));
        assert_eq!(filter.apply(&products).len(), 2);

        let filter = ProductFilter::new("agua", Some(Category::Snacks));
        assert!(filter.apply(&products).is_empty());
    }

    #[test]
    fn test_low_stock_sorted() {
        let products = catalog();
        let low = low_stock(&products, 10);
        let names: Vec<&str> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Papas Lays", "Coca Cola"]);
    }
}
