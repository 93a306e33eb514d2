//! Listing and detail extraction over rendered-DOM snapshots.
//!
//! Pure functions per document: the session hands over HTML, these turn it
//! into domain values. Selector constants mirror the target site's markup.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use entidades_shared::types::{DetailInfo, EntityStub, NOT_AVAILABLE};

/// Ready-state selector for a rendered listing page.
pub const LISTING_READY_SELECTOR: &str = "table";

/// Ready-state selector for a rendered detail page.
pub const DETAIL_READY_SELECTOR: &str = ".infoTextContainer";

/// Cancel button of the onboarding overlay.
pub const OVERLAY_SELECTOR: &str = "button.shepherd-cancel-icon";

/// Substring marking a fragment as the geographic/location block.
const LOCATION_MARKER: &str = "PERU";

/// Turn a rendered listing page into entity stubs, in document order.
///
/// A row becomes a stub only if it carries a detail-page anchor; the anchor's
/// href is resolved against `base` into an absolute URL. This is the only row
/// validity rule. Missing cells default to empty strings.
pub fn listing_entries(html: &str, base: &Url) -> Vec<EntityStub> {
    let doc = Html::parse_document(html);
    let row_sel = Selector::parse("table tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();
    let link_sel = Selector::parse(r#"a[href*="/entidad/"]"#).unwrap();

    let mut stubs = Vec::new();
    for row in doc.select(&row_sel) {
        let Some(url) = row
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| base.join(href).ok())
        else {
            continue;
        };

        let cells: Vec<String> = row.select(&cell_sel).map(|c| collapse_text(&c)).collect();
        let field = |i: usize| cells.get(i).cloned().unwrap_or_default();

        stubs.push(EntityStub {
            url: url.to_string(),
            name: field(0),
            tax_id: field(1),
            process_count: field(2),
            contracted_amount: field(3),
            last_process_date: field(4),
        });
    }

    debug!(entities = stubs.len(), "listing extracted");
    stubs
}

/// Turn a rendered detail page into its location/phone pair.
///
/// Scans all info fragments and picks the first one satisfying each
/// predicate: a geographic marker for location, a digit-bearing leading span
/// for phone. A field with no qualifying fragment gets the
/// [`NOT_AVAILABLE`] sentinel — that is a successful outcome, not an error.
pub fn detail_info(html: &str) -> DetailInfo {
    let doc = Html::parse_document(html);
    let fragment_sel = Selector::parse(".infoTextContainer").unwrap();
    let span_sel = Selector::parse("span").unwrap();

    let fragments: Vec<ElementRef> = doc.select(&fragment_sel).collect();

    let location = fragments
        .iter()
        .find(|frag| collapse_text(frag).contains(LOCATION_MARKER))
        .map(|frag| span_texts(frag, &span_sel))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let phone = fragments
        .iter()
        .filter(|frag| contains_digit(&collapse_text(frag)))
        .find_map(|frag| {
            let first_span = frag.select(&span_sel).next()?;
            let text = collapse_text(&first_span);
            contains_digit(&text).then_some(text)
        })
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    DetailInfo { location, phone }
}

/// Text content of an element with whitespace runs collapsed to single
/// spaces.
fn collapse_text(el: &ElementRef) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-empty span texts of a fragment, joined by single spaces.
fn span_texts(frag: &ElementRef, span_sel: &Selector) -> String {
    frag.select(span_sel)
        .map(|span| collapse_text(&span))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}
