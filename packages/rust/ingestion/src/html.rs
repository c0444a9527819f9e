//! Markup extractor: the built-in [`Scraper`] for ordinary web pages.
//!
//! Chrome subtrees (navigation, footers, scripts and the like) are skipped;
//! content is taken from `<main>`, then `<article>`, then `<body>`.

use async_trait::async_trait;
use chrono::Utc;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, instrument};
use url::Url;

use trainingcatalog_fetch::Fetcher;
use trainingcatalog_shared::text::{content_hash, truncate_chars};
use trainingcatalog_shared::{ContentType, Resource, Result, ScrapedContent};

use crate::scraper::Scraper;

/// Subtrees never considered content.
const STRIPPED_TAGS: &[&str] = &[
    "nav", "footer", "header", "aside", "script", "style", "noscript", "iframe",
];

const MAX_TEXT_CHARS: usize = 50_000;
const MAX_HEADINGS: usize = 50;
const MAX_CODE_BLOCKS: usize = 30;
const MIN_CODE_BLOCK_CHARS: usize = 20;
const MAX_LINKS: usize = 100;

// ---------------------------------------------------------------------------
// HtmlScraper
// ---------------------------------------------------------------------------

/// Fetches a page through the shared [`Fetcher`] and extracts its content.
/// Handles everything except papers.
#[derive(Debug, Clone)]
pub struct HtmlScraper {
    fetcher: Fetcher,
}

impl HtmlScraper {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Scraper for HtmlScraper {
    fn name(&self) -> &str {
        "html"
    }

    fn can_handle(&self, resource: &Resource) -> bool {
        resource.content_type != ContentType::Paper
    }

    #[instrument(skip_all, fields(url = %resource.url))]
    async fn scrape(&self, resource: &Resource) -> Result<Option<ScrapedContent>> {
        let response = self.fetcher.get(&resource.url).await?;
        if !response.is_success() {
            debug!(status = response.status, "page not usable");
            return Ok(None);
        }

        let page = extract(&response.body);
        debug!(
            words = page.word_count,
            headings = page.headings.len(),
            code_blocks = page.code_blocks.len(),
            "page extracted"
        );

        Ok(Some(ScrapedContent {
            resource_id: resource.id.clone(),
            url: resource.url.clone(),
            content_hash: content_hash(&page.text),
            word_count: page.word_count,
            text: truncate_chars(&page.text, MAX_TEXT_CHARS).to_string(),
            headings: page.headings,
            code_blocks: page.code_blocks,
            links: page.links,
            scraped_at: Utc::now(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Content pulled out of one HTML document.
///
/// `text` and `word_count` are uncapped; list fields are already capped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedPage {
    pub text: String,
    pub headings: Vec<String>,
    pub code_blocks: Vec<String>,
    pub links: Vec<String>,
    pub word_count: usize,
}

/// Extract text, headings, code blocks and absolute links from `html`.
pub fn extract(html: &str) -> ExtractedPage {
    let doc = Html::parse_document(html);
    let root = content_root(&doc);

    let mut collector = Collector::default();
    collector.walk(root, false);

    let text = collector.texts.join("\n");
    ExtractedPage {
        word_count: text.split_whitespace().count(),
        text,
        headings: collector.headings,
        code_blocks: collector.code_blocks,
        links: collector.links,
    }
}

/// `<main>`, else `<article>`, else `<body>`, else the document element.
fn content_root(doc: &Html) -> ElementRef<'_> {
    for tag in ["main", "article", "body"] {
        let sel = Selector::parse(tag).unwrap();
        if let Some(el) = doc.select(&sel).next() {
            return el;
        }
    }
    doc.root_element()
}

#[derive(Default)]
struct Collector {
    texts: Vec<String>,
    headings: Vec<String>,
    code_blocks: Vec<String>,
    links: Vec<String>,
}

impl Collector {
    fn walk(&mut self, el: ElementRef<'_>, in_pre: bool) {
        for child in el.children() {
            match child.value() {
                Node::Text(t) => {
                    let t = t.trim();
                    if !t.is_empty() {
                        self.texts.push(t.to_string());
                    }
                }
                Node::Element(e) if STRIPPED_TAGS.contains(&e.name()) => {}
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.visit(child_el, in_pre);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit(&mut self, el: ElementRef<'_>, in_pre: bool) {
        let name = el.value().name();
        match name {
            "h1" | "h2" | "h3" | "h4" if self.headings.len() < MAX_HEADINGS => {
                let heading = inline_text(el);
                if !heading.is_empty() {
                    self.headings.push(heading);
                }
            }
            // Nested <pre><code> is one block.
            "pre" | "code" if !in_pre && self.code_blocks.len() < MAX_CODE_BLOCKS => {
                let code = el.text().collect::<String>().trim().to_string();
                if code.chars().count() > MIN_CODE_BLOCK_CHARS {
                    self.code_blocks.push(code);
                }
            }
            "a" if self.links.len() < MAX_LINKS => {
                if let Some(link) = el.value().attr("href").and_then(absolute_http) {
                    self.links.push(link);
                }
            }
            _ => {}
        }
        self.walk(el, in_pre || name == "pre");
    }
}

/// Element text with whitespace runs collapsed.
fn inline_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn absolute_http(href: &str) -> Option<String> {
    let url = Url::parse(href.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}
