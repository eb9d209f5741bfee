use crate::domain::product::Product;
use crate::error::Result;
use serde::Deserialize;
use std::io::Read;

#[derive(Deserialize)]
struct CatalogDocument {
    products: Vec<Product>,
}

/// Reads the product catalog from a JSON document
/// `{"products": [{id, name, type, ...}, ...]}`.
pub struct CatalogReader<R: Read> {
    source: R,
}

impl<R: Read> CatalogReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Parses the whole document and strips NUL padding from text fields.
    pub fn products(self) -> Result<Vec<Product>> {
        let document: CatalogDocument = serde_json::from_reader(self.source)?;
        Ok(document.products.into_iter().map(Product::sanitize).collect())
    }
}
