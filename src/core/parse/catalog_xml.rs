// FileMill - core/parse/catalog_xml.rs
//
// Product-catalog XML parser built on quick-xml's pull reader. The document
// is walked with an element-name stack; no DOM is materialised. Field-level
// problems inside a product are tolerated with defaults — only a malformed
// document is a hard error.

use crate::core::model::{Catalog, CatalogMetadata, Product};
use crate::core::parse::{read_file, ParseOutcome};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// Parse a catalog XML document.
///
/// Extracts `<metadata>/<generated>`, `<metadata>/<source>` and every
/// `<product>` node (id and currency come from attributes, the rest from
/// child elements). An empty or absent products list is a valid catalog
/// with zero totals.
pub fn parse(path: &Path) -> ParseOutcome<Catalog> {
    let content = match read_file(path) {
        Ok(c) => c,
        Err(reason) => return ParseOutcome::Error(reason),
    };

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut catalog = Catalog::default();

    // Element-name stack; the top names the field the next text node fills.
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<ProductBuilder> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = element_name(&e);
                if name == "product" {
                    current = Some(ProductBuilder::from_attributes(&e));
                } else if name == "price" {
                    if let Some(builder) = current.as_mut() {
                        builder.read_currency(&e);
                    }
                }
                stack.push(name);
            }
            Ok(Event::Empty(e)) => {
                // Self-closing product: attributes only, all fields default.
                if element_name(&e) == "product" {
                    catalog
                        .products
                        .push(ProductBuilder::from_attributes(&e).build());
                }
            }
            Ok(Event::Text(t)) => {
                let text = match t.unescape() {
                    Ok(text) => text.into_owned(),
                    Err(e) => return ParseOutcome::Error(format!("Invalid XML: {e}")),
                };
                apply_text(&stack, &text, &mut catalog.metadata, current.as_mut());
            }
            Ok(Event::End(_)) => {
                if stack.pop().as_deref() == Some("product") {
                    if let Some(builder) = current.take() {
                        catalog.products.push(builder.build());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return ParseOutcome::Error(format!("Invalid XML: {e}")),
        }
    }

    catalog.total_products = catalog.products.len();
    catalog.total_stock = catalog.products.iter().map(|p| p.stock).sum();
    for product in &catalog.products {
        if !product.category.is_empty() && !catalog.categories.contains(&product.category) {
            catalog.categories.push(product.category.clone());
        }
    }

    tracing::debug!(
        file = %path.display(),
        products = catalog.total_products,
        "Catalog XML parsed"
    );
    ParseOutcome::Ok(catalog)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Route a text node to the field named by the element stack.
fn apply_text(
    stack: &[String],
    text: &str,
    metadata: &mut CatalogMetadata,
    current: Option<&mut ProductBuilder>,
) {
    let Some(element) = stack.last() else {
        return;
    };
    let parent = stack.len().checked_sub(2).and_then(|i| stack.get(i));

    if parent.map(String::as_str) == Some("metadata") {
        match element.as_str() {
            "generated" => metadata.generated = Some(text.to_string()),
            "source" => metadata.source = Some(text.to_string()),
            _ => {}
        }
        return;
    }

    if let Some(builder) = current {
        builder.set_field(element, text);
    }
}

/// Accumulates one product's fields as its child elements stream past.
/// Unparseable numerics default to zero rather than failing the document.
struct ProductBuilder {
    id: String,
    name: String,
    category: String,
    price: f64,
    currency: Option<String>,
    stock: i64,
    supplier: String,
}

impl ProductBuilder {
    fn from_attributes(e: &BytesStart<'_>) -> Self {
        let mut id = String::new();
        for attr in e.attributes().flatten() {
            if attr.key.as_ref() == b"id" {
                if let Ok(value) = attr.unescape_value() {
                    id = value.into_owned();
                }
            }
        }
        Self {
            id,
            name: String::new(),
            category: String::new(),
            price: 0.0,
            currency: None,
            stock: 0,
            supplier: String::new(),
        }
    }

    fn read_currency(&mut self, e: &BytesStart<'_>) {
        for attr in e.attributes().flatten() {
            if attr.key.as_ref() == b"currency" {
                if let Ok(value) = attr.unescape_value() {
                    self.currency = Some(value.into_owned());
                }
            }
        }
    }

    fn set_field(&mut self, element: &str, text: &str) {
        match element {
            "name" => self.name = text.to_string(),
            "category" => self.category = text.to_string(),
            "price" => self.price = text.parse().unwrap_or(0.0),
            "stock" => self.stock = text.parse().unwrap_or(0),
            "supplier" => self.supplier = text.to_string(),
            _ => {}
        }
    }

    fn build(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            category: self.category,
            price: self.price,
            currency: self.currency.unwrap_or_else(|| "USD".to_string()),
            stock: self.stock,
            supplier: self.supplier,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
