//! Page selectors and their canonical paths.
//!
//! A page is a name plus at most one string parameter (a slug or an order
//! id). Clients send selectors like `product` + `modern-ceramic-vase`; the
//! server answers with paths like `/products/modern-ceramic-vase`.

use serde::Serialize;

/// A storefront page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "page", content = "param", rename_all = "snake_case")]
pub enum Page {
    Home,
    Shop,
    Product(String),
    Checkout,
    Confirmation(String),
    Journal,
    Article(String),
    Contact,
}

impl Page {
    /// Resolve a page name and optional parameter.
    ///
    /// Unknown names, and names that need a parameter but got none, fall
    /// back to [`Page::Home`].
    #[must_use]
    pub fn from_parts(name: &str, param: Option<&str>) -> Self {
        let param = param.map(str::trim).filter(|p| !p.is_empty());
        match (name.trim().to_ascii_lowercase().as_str(), param) {
            ("shop", _) => Self::Shop,
            ("product", Some(slug)) => Self::Product(slug.to_string()),
            ("checkout", _) => Self::Checkout,
            ("confirmation", Some(id)) => Self::Confirmation(id.to_string()),
            ("journal", _) => Self::Journal,
            ("article", Some(slug)) => Self::Article(slug.to_string()),
            ("contact", _) => Self::Contact,
            _ => Self::Home,
        }
    }

    /// Parse a canonical path. Anything unrecognised is [`Page::Home`].
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["shop"] => Self::Shop,
            ["products", slug] => Self::Product((*slug).to_string()),
            ["checkout"] => Self::Checkout,
            ["confirmation", id] => Self::Confirmation((*id).to_string()),
            ["journal"] => Self::Journal,
            ["journal", slug] => Self::Article((*slug).to_string()),
            ["contact"] => Self::Contact,
            _ => Self::Home,
        }
    }

    /// The page name used in selectors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Shop => "shop",
            Self::Product(_) => "product",
            Self::Checkout => "checkout",
            Self::Confirmation(_) => "confirmation",
            Self::Journal => "journal",
            Self::Article(_) => "article",
            Self::Contact => "contact",
        }
    }

    /// The page parameter, if the page carries one.
    #[must_use]
    pub fn param(&self) -> Option<&str> {
        match self {
            Self::Product(p) | Self::Confirmation(p) | Self::Article(p) => Some(p),
            _ => None,
        }
    }

    /// Canonical path for this page.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Shop => "/shop".to_string(),
            Self::Product(slug) => format!("/products/{slug}"),
            Self::Checkout => "/checkout".to_string(),
            Self::Confirmation(id) => format!("/confirmation/{id}"),
            Self::Journal => "/journal".to_string(),
            Self::Article(slug) => format!("/journal/{slug}"),
            Self::Contact => "/contact".to_string(),
        }
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}
