use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::config::ScraperConfig;
use crate::models::{Price, ProductRecord, ProductReference};
use crate::page::PageDriver;
use crate::site::SiteAdapter;
use crate::{AppError, Result};

// Search results view
const RESULTS_CONTAINER: &str = "div.sooqrSearchContainer";
const RESULT_ITEM: &str = "div.sqr-resultItem";
const RESULT_ID_ATTR: &str = "data-id";
const RESULT_TITLE_LINK: &str = "h3.productlist-title a";

// Product detail page
const SPECS_PANEL: &str = "div.pdetail-specsholder";
const PAGE_TITLE: &str = "h1#pageheadertitle";
const PRICE: &str = "span.product-price";
const PRICE_ATTR: &str = "content";
const AVAILABILITY: &str = "div#ContentPlaceHolder1_upStockInfoDescription";
const SPECS_TABLE: &str = "div#pdetailTableSpecs";

// Attribute table labels, as rendered by the shop (German)
const NEEDLE_SIZE_LABEL: &str = "Nadelstärke";
const COMPOSITION_LABEL: &str = "Zusammenstellung";

// All selectors in this module are literals, covered by the selector test below.
fn selector(source: &str) -> Selector {
    Selector::parse(source).expect("selector literal")
}

fn collect_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Scraper for wollplatz.de.
pub struct WollplatzSite {
    base_url: Url,
    selector_timeout: Duration,
    settle_delay: Duration,
}

impl WollplatzSite {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(&config.base_url)?,
            selector_timeout: config.selector_timeout(),
            settle_delay: config.settle_delay(),
        })
    }

    fn search_url(&self, search_term: &str) -> String {
        format!(
            "{}/?#sqr:(q%5B{}%5D)",
            self.base_url.as_str().trim_end_matches('/'),
            urlencoding::encode(search_term)
        )
    }

    fn parse_listing(&self, html: &str) -> Vec<ProductReference> {
        let document = Html::parse_document(html);
        let mut references = Vec::new();

        for item in document.select(&selector(RESULT_ITEM)) {
            match self.parse_result_item(&item) {
                Some(reference) => references.push(reference),
                None => tracing::warn!("skipping malformed result item"),
            }
        }

        references
    }

    fn parse_result_item(&self, item: &ElementRef) -> Option<ProductReference> {
        let id = item.value().attr(RESULT_ID_ATTR)?.trim();
        if id.is_empty() {
            return None;
        }

        let link = item.select(&selector(RESULT_TITLE_LINK)).next()?;
        let name = link.value().attr("title").unwrap_or_default().trim();
        let href = link.value().attr("href")?.trim();
        if href.is_empty() {
            return None;
        }

        let url = self.base_url.join(href).ok()?;
        if url.origin() != self.base_url.origin() {
            // a listing must not hand out references to other sites
            return None;
        }

        tracing::debug!(id, name, url = %url, "found product");

        Some(ProductReference {
            id: id.to_string(),
            url: url.to_string(),
        })
    }

    fn parse_details(&self, html: &str, reference: &ProductReference) -> Result<ProductRecord> {
        let document = Html::parse_document(html);

        let name = document
            .select(&selector(PAGE_TITLE))
            .next()
            .map(|el| collect_text(&el))
            .unwrap_or_default();
        if name.is_empty() {
            return Err(AppError::RequiredFieldMissing {
                field: "name",
                url: reference.url.clone(),
            });
        }

        let amount = document
            .select(&selector(PRICE))
            .next()
            .and_then(|el| el.value().attr(PRICE_ATTR))
            .map(str::trim)
            .unwrap_or_default();
        if amount.is_empty() {
            return Err(AppError::RequiredFieldMissing {
                field: "price",
                url: reference.url.clone(),
            });
        }

        let availability = document
            .select(&selector(AVAILABILITY))
            .next()
            .map(|el| collect_text(&el))
            .filter(|text| !text.is_empty());

        let mut specs = parse_specs_table(&document);

        Ok(ProductRecord {
            reference: reference.clone(),
            name,
            price: Price::eur(amount),
            needle_size: specs.remove(NEEDLE_SIZE_LABEL),
            composition: specs.remove(COMPOSITION_LABEL),
            availability,
        })
    }
}

/// Key/value pairs from the specification table. Rows with a cell count other
/// than two carry layout, not data, and are ignored.
fn parse_specs_table(document: &Html) -> HashMap<String, String> {
    let mut specs = HashMap::new();

    let Some(table) = document.select(&selector(SPECS_TABLE)).next() else {
        return specs;
    };

    for row in table.select(&selector("tr")) {
        let cells: Vec<ElementRef> = row.select(&selector("td")).collect();
        if cells.len() != 2 {
            continue;
        }

        let key = collect_text(&cells[0]);
        let value = collect_text(&cells[1]);
        if key.is_empty() || value.is_empty() {
            continue;
        }

        specs.insert(key, value);
    }

    specs
}

#[async_trait]
impl SiteAdapter for WollplatzSite {
    async fn find_products(
        &self,
        page: &dyn PageDriver,
        search_term: &str,
    ) -> Result<Vec<ProductReference>> {
        let search_url = self.search_url(search_term);
        tracing::info!(search_term, "searching for products");

        page.goto(&search_url).await?;
        page.wait_for(RESULTS_CONTAINER, self.selector_timeout).await?;
        // the results grid keeps filling in after the container exists
        page.settle(self.settle_delay).await;

        let html = page.content().await?;
        let references = self.parse_listing(&html);
        tracing::info!(count = references.len(), search_term, "listing scan finished");

        Ok(references)
    }

    async fn fetch_details(
        &self,
        page: &dyn PageDriver,
        reference: &ProductReference,
    ) -> Result<ProductRecord> {
        tracing::info!(id = %reference.id, "fetching product details");

        page.goto(&reference.url).await?;
        page.wait_for(SPECS_PANEL, self.selector_timeout).await?;

        let html = page.content().await?;
        self.parse_details(&html, reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn site() -> WollplatzSite {
        let config = ScraperConfig {
            base_url: "https://www.wollplatz.de".to_string(),
            user_agent: "TestAgent/1.0".to_string(),
            headless: true,
            chrome_path: None,
            navigation_timeout_secs: 30,
            selector_timeout_secs: 10,
            settle_delay_ms: 0,
        };
        WollplatzSite::new(&config).unwrap()
    }

    fn reference() -> ProductReference {
        ProductReference {
            id: "12345".to_string(),
            url: "https://www.wollplatz.de/wol/drops/drops-safran".to_string(),
        }
    }

    fn listing_page(items: &str) -> String {
        format!(
            r#"<html><body><div class="sooqrSearchContainer">{}</div></body></html>"#,
            items
        )
    }

    fn detail_page(title: &str, price_span: &str, rows: &str) -> String {
        format!(
            r#"<html><body>
                <h1 id="pageheadertitle">{title}</h1>
                {price_span}
                <div id="ContentPlaceHolder1_upStockInfoDescription">  Lieferbar  </div>
                <div class="pdetail-specsholder">
                    <div id="pdetailTableSpecs"><table>{rows}</table></div>
                </div>
            </body></html>"#
        )
    }

    const GOOD_ITEM: &str = r#"
        <div class="sqr-resultItem" data-id="12345">
            <h3 class="productlist-title">
                <a title=" Drops Safran " href="/wol/drops/drops-safran">Drops Safran</a>
            </h3>
        </div>"#;

    #[test]
    fn test_selector_literals_are_valid() {
        for source in [
            RESULTS_CONTAINER,
            RESULT_ITEM,
            RESULT_TITLE_LINK,
            SPECS_PANEL,
            PAGE_TITLE,
            PRICE,
            AVAILABILITY,
            SPECS_TABLE,
            "tr",
            "td",
        ] {
            assert!(Selector::parse(source).is_ok(), "selector '{}'", source);
        }
    }

    #[test]
    fn test_search_url_percent_encodes_term() {
        assert_eq!(
            site().search_url("Drops Safran"),
            "https://www.wollplatz.de/?#sqr:(q%5BDrops%20Safran%5D)"
        );
    }

    #[test]
    fn test_listing_parses_items_in_page_order() {
        let html = listing_page(
            r#"
            <div class="sqr-resultItem" data-id="12345">
                <h3 class="productlist-title"><a title="Drops Safran Rood" href="/drops-safran-rood">x</a></h3>
            </div>
            <div class="sqr-resultItem" data-id="67890">
                <h3 class="productlist-title"><a title="Drops Safran Geel" href="/drops-safran-geel">x</a></h3>
            </div>"#,
        );

        let references = site().parse_listing(&html);

        assert_eq!(
            references,
            vec![
                ProductReference {
                    id: "12345".to_string(),
                    url: "https://www.wollplatz.de/drops-safran-rood".to_string(),
                },
                ProductReference {
                    id: "67890".to_string(),
                    url: "https://www.wollplatz.de/drops-safran-geel".to_string(),
                },
            ]
        );
    }

    #[rstest]
    #[case::missing_id_attribute(
        r#"<div class="sqr-resultItem">
            <h3 class="productlist-title"><a title="No Id" href="/no-id">x</a></h3>
        </div>"#
    )]
    #[case::empty_id_attribute(
        r#"<div class="sqr-resultItem" data-id="  ">
            <h3 class="productlist-title"><a title="Blank Id" href="/blank-id">x</a></h3>
        </div>"#
    )]
    #[case::missing_title_link(r#"<div class="sqr-resultItem" data-id="99999"></div>"#)]
    #[case::empty_href(
        r#"<div class="sqr-resultItem" data-id="99999">
            <h3 class="productlist-title"><a title="No Link" href="">x</a></h3>
        </div>"#
    )]
    #[case::foreign_origin_href(
        r#"<div class="sqr-resultItem" data-id="99999">
            <h3 class="productlist-title"><a title="Elsewhere" href="https://evil.example.com/p">x</a></h3>
        </div>"#
    )]
    fn test_malformed_item_is_skipped_without_aborting_scan(#[case] bad_item: &str) {
        // the malformed item sits before a good one; the scan must continue
        let html = listing_page(&format!("{}{}", bad_item, GOOD_ITEM));

        let references = site().parse_listing(&html);

        assert_eq!(references.len(), 1);
        assert_eq!(references[0].id, "12345");
    }

    #[test]
    fn test_listing_with_no_items_is_empty_not_an_error() {
        let references = site().parse_listing(&listing_page(""));
        assert!(references.is_empty());
    }

    #[test]
    fn test_details_maps_known_spec_labels() {
        let html = detail_page(
            "Drops Safran",
            r#"<span class="product-price" content="6.95">€ 6,95</span>"#,
            r#"<tr><td>Nadelstärke</td><td> 4-5 mm </td></tr>
               <tr><td>Zusammenstellung</td><td>100% Baumwolle</td></tr>
               <tr><td>Lauflänge</td><td>85m / 100g</td></tr>"#,
        );

        let record = site().parse_details(&html, &reference()).unwrap();

        assert_eq!(record.name, "Drops Safran");
        assert_eq!(record.price, Price::eur("6.95"));
        assert_eq!(record.needle_size.as_deref(), Some("4-5 mm"));
        assert_eq!(record.composition.as_deref(), Some("100% Baumwolle"));
        assert_eq!(record.availability.as_deref(), Some("Lieferbar"));
        assert_eq!(record.reference, reference());
    }

    #[test]
    fn test_details_ignores_rows_with_wrong_cell_count() {
        let html = detail_page(
            "Drops Safran",
            r#"<span class="product-price" content="6.95"></span>"#,
            r#"<tr><td>Nadelstärke</td><td>4-5 mm</td><td>extra</td></tr>
               <tr><td>only one cell</td></tr>
               <tr><td>Zusammenstellung</td><td>100% Baumwolle</td></tr>"#,
        );

        let record = site().parse_details(&html, &reference()).unwrap();

        assert!(record.needle_size.is_none());
        assert_eq!(record.composition.as_deref(), Some("100% Baumwolle"));
    }

    #[test]
    fn test_details_without_specs_table_yields_absent_fields() {
        let html = r#"<html><body>
            <h1 id="pageheadertitle">Drops Safran</h1>
            <span class="product-price" content="6.95"></span>
        </body></html>"#;

        let record = site().parse_details(html, &reference()).unwrap();

        assert!(record.needle_size.is_none());
        assert!(record.composition.is_none());
        assert!(record.availability.is_none());
    }

    #[test]
    fn test_details_missing_name_is_required_field_error() {
        let html = detail_page(
            "   ",
            r#"<span class="product-price" content="6.95"></span>"#,
            "",
        );

        let result = site().parse_details(&html, &reference());

        assert!(matches!(
            result,
            Err(AppError::RequiredFieldMissing { field: "name", .. })
        ));
    }

    #[rstest]
    #[case::no_price_element("")]
    #[case::no_content_attribute(r#"<span class="product-price">€ 6,95</span>"#)]
    #[case::empty_content_attribute(r#"<span class="product-price" content=" "></span>"#)]
    fn test_details_missing_price_is_required_field_error(#[case] price_span: &str) {
        let html = detail_page("Drops Safran", price_span, "");

        let result = site().parse_details(&html, &reference());

        assert!(matches!(
            result,
            Err(AppError::RequiredFieldMissing { field: "price", .. })
        ));
    }
}
