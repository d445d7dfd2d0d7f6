//! The product catalog.
//!
//! The catalog is built once at startup and never mutated afterwards. Views
//! borrow products from it; carts copy the fields they need at add time.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Category, CategoryFilter, ProductId};

/// A purchasable menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub category: Category,
    /// Image reference, served from `/static`.
    pub image: String,
    pub description: String,
}

impl Product {
    /// Create a product.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
        category: Category,
        image: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            category,
            image: image.into(),
            description: description.into(),
        }
    }
}

/// Errors building a catalog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),
    #[error("negative price for product {0}")]
    NegativePrice(ProductId),
}

/// Fixed, ordered list of products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog, checking that ids are unique and prices non-negative.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on the first invalid product.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if product.price < Decimal::ZERO {
                return Err(CatalogError::NegativePrice(product.id.clone()));
            }
            if !seen.insert(&product.id) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }
        Ok(Self { products })
    }

    /// The Brew & Bites café menu.
    #[must_use]
    pub fn cafe_menu() -> Self {
        let item = |id: &str, name: &str, cents: i64, category, image: &str, description: &str| {
            Product::new(
                id,
                name,
                Decimal::new(cents, 2),
                category,
                format!("/static/images/{image}"),
                description,
            )
        };

        Self {
            products: vec![
                item("espresso", "Espresso", 350, Category::Coffee, "espresso.svg", "Rich and bold espresso shot"),
                item("latte", "Latte", 450, Category::Coffee, "latte.svg", "Smooth espresso with steamed milk"),
                item("cappuccino", "Cappuccino", 425, Category::Coffee, "cappuccino.svg", "Equal parts espresso, milk, and foam"),
                item("cold_brew", "Cold Brew", 475, Category::Coffee, "cold-brew.svg", "16-hour steeped smooth coffee"),
                item("chocolate_croissant", "Chocolate Croissant", 325, Category::Pastries, "croissant.svg", "Flaky croissant with rich chocolate"),
                item("blueberry_muffin", "Blueberry Muffin", 295, Category::Pastries, "muffin.svg", "Moist muffin with fresh blueberries"),
                item("turkey_sandwich", "Turkey Avocado Sandwich", 750, Category::Sandwiches, "sandwich.svg", "Fresh turkey with avocado on artisan bread"),
                item("green_tea", "Green Tea", 275, Category::Tea, "tea.svg", "Premium Japanese green tea"),
            ],
        }
    }

    /// All products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == id)
    }

    /// Products passing `filter`, in catalog order.
    ///
    /// [`CategoryFilter::All`] yields the full catalog unchanged.
    pub fn filter(&self, filter: CategoryFilter) -> impl Iterator<Item = &Product> {
        self.products
            .iter()
            .filter(move |product| filter.matches(product.category))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::cafe_menu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<'a>(products: impl Iterator<Item = &'a Product>) -> Vec<&'a str> {
        products.map(|product| product.id.as_str()).collect()
    }

    #[test]
    fn test_cafe_menu_is_valid() {
        let menu = Catalog::cafe_menu();
        assert_eq!(menu.len(), 8);
        assert_eq!(Catalog::new(menu.products().to_vec()), Ok(menu));
    }

    #[test]
    fn test_filter_all_returns_full_catalog_in_order() {
        let menu = Catalog::cafe_menu();
        let all: Vec<&Product> = menu.filter(CategoryFilter::All).collect();
        let expected: Vec<&Product> = menu.products().iter().collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_filter_by_category_preserves_order() {
        let menu = Catalog::cafe_menu();
        assert_eq!(
            ids(menu.filter(CategoryFilter::Only(Category::Coffee))),
            vec!["espresso", "latte", "cappuccino", "cold_brew"]
        );
        assert_eq!(
            ids(menu.filter(CategoryFilter::Only(Category::Pastries))),
            vec!["chocolate_croissant", "blueberry_muffin"]
        );
        assert_eq!(
            ids(menu.filter(CategoryFilter::Only(Category::Tea))),
            vec!["green_tea"]
        );
    }

    #[test]
    fn test_every_filter_returns_only_matching_products() {
        let menu = Catalog::cafe_menu();
        for category in Category::ALL {
            let filtered: Vec<&Product> = menu.filter(CategoryFilter::Only(category)).collect();
            assert!(!filtered.is_empty());
            assert!(filtered.iter().all(|product| product.category == category));
            let expected = menu
                .products()
                .iter()
                .filter(|product| product.category == category)
                .count();
            assert_eq!(filtered.len(), expected);
        }
    }

    #[test]
    fn test_get() {
        let menu = Catalog::cafe_menu();
        let espresso = menu.get(&ProductId::from("espresso")).expect("espresso on menu");
        assert_eq!(espresso.price, Decimal::new(350, 2));
        assert_eq!(espresso.image, "/static/images/espresso.svg");
        assert!(menu.get(&ProductId::from("mocha")).is_none());
    }

    #[test]
    fn test_new_rejects_duplicate_ids() {
        let espresso = Product::new(
            "espresso",
            "Espresso",
            Decimal::new(350, 2),
            Category::Coffee,
            "/static/images/espresso.svg",
            "",
        );
        let result = Catalog::new(vec![espresso.clone(), espresso]);
        assert_eq!(
            result,
            Err(CatalogError::DuplicateId(ProductId::from("espresso")))
        );
    }

    #[test]
    fn test_new_rejects_negative_prices() {
        let refund = Product::new("refund", "Refund", Decimal::new(-100, 2), Category::Tea, "", "");
        assert_eq!(
            Catalog::new(vec![refund]),
            Err(CatalogError::NegativePrice(ProductId::from("refund")))
        );
    }

    #[test]
    fn test_new_accepts_free_items() {
        let water = Product::new("water", "Water", Decimal::ZERO, Category::Tea, "", "");
        assert!(Catalog::new(vec![water]).is_ok());
    }
}
