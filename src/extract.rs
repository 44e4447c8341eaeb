use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::config::{ContentType, PageSource};

pub const MAX_HEADINGS: usize = 10;
pub const MAX_PARAGRAPHS: usize = 15;
pub const MAX_LIST_ITEMS: usize = 20;

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static META_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1, h2, h3, h4").unwrap());
static PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static LIST_ITEMS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ul li, ol li").unwrap());

/// Bounded, cleaned content of one fetched page. Collections preserve
/// document order and are capped so the downstream prompt stays bounded.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub url: String,
    pub content_type: ContentType,
    pub title: String,
    pub meta_description: String,
    pub headings: Vec<String>,
    pub paragraphs: Vec<String>,
    pub list_items: Vec<String>,
}

/// Extract structured content from raw HTML. Never fails: selectors that
/// match nothing produce empty collections.
pub fn extract(html: &str, source: &PageSource) -> ExtractedContent {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let meta_description = doc
        .select(&META_DESCRIPTION)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    let headings = collect_text(&doc, &HEADINGS, MAX_HEADINGS, |len| len > 3 && len < 200);
    let paragraphs = collect_text(&doc, &PARAGRAPHS, MAX_PARAGRAPHS, |len| len > 20);
    let list_items = collect_text(&doc, &LIST_ITEMS, MAX_LIST_ITEMS, |len| len > 5 && len < 200);

    ExtractedContent {
        url: source.url.clone(),
        content_type: source.content_type,
        title,
        meta_description,
        headings,
        paragraphs,
        list_items,
    }
}

fn collect_text(
    doc: &Html,
    selector: &Selector,
    cap: usize,
    keep: impl Fn(usize) -> bool,
) -> Vec<String> {
    doc.select(selector)
        .filter(|el| !in_boilerplate(*el))
        .map(clean_text)
        .filter(|text| keep(text.chars().count()))
        .take(cap)
        .collect()
}

/// True when the element or any of its ancestors is non-content chrome:
/// scripts, styles, navigation, page header/footer, buttons, or anything
/// class-tagged as a cookie banner, popup, or ad.
fn in_boilerplate(el: ElementRef) -> bool {
    std::iter::successors(Some(el), |e| e.parent().and_then(ElementRef::wrap))
        .any(|e| is_boilerplate(&e))
}

fn is_boilerplate(el: &ElementRef) -> bool {
    let element = el.value();
    matches!(
        element.name(),
        "script" | "style" | "nav" | "header" | "footer" | "button"
    ) || element.classes().any(|class| {
        let class = class.to_ascii_lowercase();
        class == "btn"
            || class.contains("cookie")
            || class.contains("popup")
            || class.contains("ad")
    })
}

/// Text of an element with boilerplate subtrees (e.g. an inline button)
/// left out.
fn clean_text(el: ElementRef) -> String {
    let mut out = String::new();
    append_text(el, &mut out);
    out.trim().to_string()
}

fn append_text(el: ElementRef, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(element) = ElementRef::wrap(child) {
            if !is_boilerplate(&element) {
                append_text(element, out);
            }
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> PageSource {
        PageSource {
            url: "https://example.com/about".into(),
            content_type: ContentType::About,
        }
    }

    #[test]
    fn fixture_page_extracts_content_without_chrome() {
        let html = std::fs::read_to_string("tests/fixtures/about.html").unwrap();
        let content = extract(&html, &source());

        assert_eq!(content.title, "About Us | Acme Web Studio");
        assert_eq!(
            content.meta_description,
            "Acme Web Studio builds custom web and mobile applications."
        );
        assert!(content.headings.iter().any(|h| h == "Our Story"));
        assert!(content
            .paragraphs
            .iter()
            .any(|p| p.contains("founded in 2015")));
        assert!(content.list_items.iter().any(|i| i == "Web application development"));

        // Nothing from nav, footer, cookie banner, or buttons leaks through.
        let all: Vec<&String> = content
            .headings
            .iter()
            .chain(&content.paragraphs)
            .chain(&content.list_items)
            .collect();
        assert!(all.iter().all(|t| !t.contains("Accept all cookies")));
        assert!(all.iter().all(|t| !t.contains("Home")));
        assert!(all.iter().all(|t| !t.contains("Get a quote")));
        assert!(all.iter().all(|t| !t.contains("Copyright")));
    }

    #[test]
    fn collections_never_exceed_caps() {
        let mut html = String::from("<html><head><title>Caps</title></head><body><ul>");
        for i in 0..25 {
            html.push_str(&format!("<li>List item number {i} here</li>"));
        }
        html.push_str("</ul>");
        for i in 0..14 {
            html.push_str(&format!("<h2>Section heading number {i}</h2>"));
        }
        for i in 0..18 {
            html.push_str(&format!(
                "<p>This is paragraph number {i}, long enough to pass the length filter.</p>"
            ));
        }
        html.push_str("</body></html>");

        let content = extract(&html, &source());
        assert_eq!(content.headings.len(), MAX_HEADINGS);
        assert_eq!(content.paragraphs.len(), MAX_PARAGRAPHS);
        assert_eq!(content.list_items.len(), MAX_LIST_ITEMS);
        // Order-preserving truncation keeps the first matches.
        assert_eq!(content.headings[0], "Section heading number 0");
        assert_eq!(content.list_items[0], "List item number 0 here");
    }

    #[test]
    fn length_filters_drop_short_and_oversized_text() {
        let long_heading = "x".repeat(200);
        let html = format!(
            "<html><body><h1>FAQ</h1><h2>Frequently Asked Questions</h2><h3>{long_heading}</h3>\
             <p>Too short.</p><p>This paragraph has comfortably more than twenty characters.</p>\
             <ul><li>tiny</li><li>A list item of reasonable length</li></ul></body></html>"
        );
        let content = extract(&html, &source());

        // "FAQ" is 3 chars, not >3; the 200-char heading fails the <200 bound.
        assert_eq!(content.headings, vec!["Frequently Asked Questions"]);
        assert_eq!(content.paragraphs.len(), 1);
        assert_eq!(content.list_items, vec!["A list item of reasonable length"]);
    }

    #[test]
    fn class_matched_chrome_is_removed() {
        let html = r#"<html><body>
            <div class="cookie-banner"><p>We use cookies to improve your experience.</p></div>
            <div class="newsletter-popup"><p>Subscribe to our newsletter for updates!</p></div>
            <div class="ad-slot"><p>Sponsored: buy widgets at half price today.</p></div>
            <p>Real page copy that should survive extraction intact.</p>
            <p>Click <a class="btn">Sign up now</a> to get started with our service.</p>
        </body></html>"#;
        let content = extract(html, &source());

        assert_eq!(content.paragraphs.len(), 2);
        assert!(content.paragraphs[0].contains("Real page copy"));
        // The inline .btn anchor is dropped from the surrounding paragraph.
        assert!(!content.paragraphs[1].contains("Sign up now"));
        assert!(content.paragraphs[1].contains("to get started"));
    }

    #[test]
    fn empty_document_yields_empty_collections() {
        let content = extract("", &source());
        assert!(content.title.is_empty());
        assert!(content.meta_description.is_empty());
        assert!(content.headings.is_empty());
        assert!(content.paragraphs.is_empty());
        assert!(content.list_items.is_empty());
    }
}
