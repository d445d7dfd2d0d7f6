//! Menu page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use brew_and_bites_core::{CategoryFilter, Product};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::CartStore;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: String,
}

impl ProductView {
    fn new(product: &Product, state: &AppState) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: state.format_price(product.price),
            image: product.image.clone(),
        }
    }
}

/// One button in the category filter bar.
#[derive(Clone)]
pub struct CategoryView {
    pub slug: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Menu query parameters.
#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    pub category: Option<String>,
}

/// Menu page template.
#[derive(Template, WebTemplate)]
#[template(path = "menu/index.html")]
pub struct MenuTemplate {
    pub categories: Vec<CategoryView>,
    pub products: Vec<ProductView>,
    pub cart_count: u32,
}

/// Parse the `category` query parameter; absent means all.
fn parse_filter(query: &MenuQuery) -> Result<CategoryFilter> {
    query.category.as_deref().map_or(Ok(CategoryFilter::All), |raw| {
        raw.parse::<CategoryFilter>()
            .map_err(|e| AppError::BadRequest(e.to_string()))
    })
}

/// Display the menu, optionally filtered to one category.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<MenuQuery>,
) -> Result<impl IntoResponse> {
    let filter = parse_filter(&query)?;
    let store = CartStore::load(session).await?;

    let categories = CategoryFilter::CHOICES
        .into_iter()
        .map(|choice| CategoryView {
            slug: choice.as_str(),
            label: choice.label(),
            active: choice == filter,
        })
        .collect();

    let products = state
        .catalog()
        .filter(filter)
        .map(|product| ProductView::new(product, &state))
        .collect();

    Ok(MenuTemplate {
        categories,
        products,
        cart_count: store.cart().total_count(),
    })
}

#[cfg(test)]
mod tests {
    use brew_and_bites_core::Category;

    use super::*;

    fn query(category: Option<&str>) -> MenuQuery {
        MenuQuery {
            category: category.map(String::from),
        }
    }

    #[test]
    fn test_parse_filter_defaults_to_all() {
        assert_eq!(parse_filter(&query(None)).ok(), Some(CategoryFilter::All));
    }

    #[test]
    fn test_parse_filter_category() {
        assert_eq!(
            parse_filter(&query(Some("sandwiches"))).ok(),
            Some(CategoryFilter::Only(Category::Sandwiches))
        );
    }

    #[test]
    fn test_parse_filter_rejects_unknown() {
        assert!(matches!(
            parse_filter(&query(Some("brunch"))),
            Err(AppError::BadRequest(_))
        ));
    }
}
