//! Listing-page parsing built on `scraper`.

use scraper::{ElementRef, Html, Selector};

/// Row data pulled from one listing page, in page order.
///
/// `meta` holds `(item href, relative age)` and `links` holds `(story href, title)`.
/// Both describe the same story rows; the scraper checks their lengths agree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub meta: Vec<(String, String)>,
    pub links: Vec<(String, String)>,
}

pub trait PageParser: Send + Sync {
    fn parse(&self, html: &str) -> ParsedPage;
}

/// Parser for the site's upvoted listing markup.
pub struct ListingPageParser {
    age: Selector,
    title: Selector,
}

impl ListingPageParser {
    pub fn new() -> Self {
        Self {
            age: Selector::parse(".subtext .age a").expect("age selector"),
            title: Selector::parse("td.title > .titleline > a").expect("title selector"),
        }
    }
}

impl Default for ListingPageParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PageParser for ListingPageParser {
    fn parse(&self, html: &str) -> ParsedPage {
        let doc = Html::parse_document(html);
        let meta = doc.select(&self.age).map(href_and_text).collect();
        let links = doc.select(&self.title).map(href_and_text).collect();
        ParsedPage { meta, links }
    }
}

fn href_and_text(el: ElementRef<'_>) -> (String, String) {
    let href = el.value().attr("href").unwrap_or("").to_string();
    let text = el.text().collect::<String>().trim().to_string();
    (href, text)
}
