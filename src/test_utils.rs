//! Test utilities
//!
//! HTML fixture builders shaped like a real search surface (home page with
//! category dropdown and search box, result pages with sort dropdown,
//! listings and pagination), plus the scripted session that serves them.

pub use crate::infrastructure::scripted_session::{
    ScriptedSession, ScriptedSessionBuilder, SessionJournal, SessionRecorder,
};

/// Selectors the default site profile resolves first, for scripting routes
pub mod selectors {
    pub const CATEGORY: &str = "select#searchDropdownBox";
    pub const SEARCH_BOX: &str = "input#twotabsearchtextbox";
    pub const SORT: &str = "select#s-result-sort-select";
    pub const NEXT_PAGE: &str = ".s-pagination-next:not(.s-pagination-disabled)";
}

/// One listing on a result page
#[derive(Debug, Clone, Default)]
pub struct ItemFixture {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub price: Option<String>,
    pub link: Option<String>,
}

impl ItemFixture {
    pub fn new(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    pub fn author(mut self, author: &str) -> Self {
        self.authors.push(author.to_string());
        self
    }

    pub fn price(mut self, price: &str) -> Self {
        self.price = Some(price.to_string());
        self
    }

    pub fn link(mut self, link: &str) -> Self {
        self.link = Some(link.to_string());
        self
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from(r#"<div data-component-type="s-search-result" class="s-result-item">"#);

        if let Some(link) = &self.link {
            html.push_str(&format!(r#"<a class="a-link-normal s-no-outline" href="{link}"><img alt=""></a>"#));
        }
        if let Some(title) = &self.title {
            html.push_str(&format!("<h2><span>{title}</span></h2>"));
        }
        if !self.authors.is_empty() {
            html.push_str(r#"<div class="a-row a-size-base a-color-secondary"><span class="a-size-base">by </span>"#);
            let names: Vec<String> = self
                .authors
                .iter()
                .map(|a| format!(r#"<a class="a-size-base a-link-normal" href="/e/x">{a}</a>"#))
                .collect();
            html.push_str(&names.concat());
            html.push_str("</div>");
        }
        if let Some(price) = &self.price {
            html.push_str(&format!(
                r#"<div class="a-row"><span class="a-price"><span class="a-offscreen">{price}</span><span aria-hidden="true">{price}</span></span></div>"#
            ));
        }

        html.push_str("</div>");
        html
    }
}

/// `count` priced listings for page `page`, priced `page * 100 + i`
pub fn numbered_items(page: usize, count: usize) -> Vec<ItemFixture> {
    (1..=count)
        .map(|i| {
            ItemFixture::new(&format!("Book {page}-{i}"))
                .author("Some Author")
                .price(&format!("₹{}.00", page * 100 + i))
                .link(&format!("/dp/{page}{i:03}"))
        })
        .collect()
}

/// Landing page of the site
pub fn home_page(with_category: bool, with_search_box: bool) -> String {
    let mut html = String::from(r#"<html><body><form name="site-search" action="/s" method="GET">"#);
    if with_category {
        html.push_str(
            r#"<select id="searchDropdownBox" name="url"><option value="search-alias=aps" selected>All Categories</option><option value="search-alias=stripbooks">Books</option></select>"#,
        );
    }
    if with_search_box {
        html.push_str(r#"<input type="text" id="twotabsearchtextbox" name="field-keywords" value="">"#);
    }
    html.push_str(r#"<input type="submit" value="Go"></form></body></html>"#);
    html
}

/// A result page with a sort dropdown, `items` and an enabled or disabled next control
pub fn results_page(items: &[ItemFixture], has_next: bool) -> String {
    let mut html = String::from(
        r#"<html><body><form action="/s" method="get"><select id="s-result-sort-select" name="s"><option value="relevanceblender" selected>Featured</option><option value="review-rank">Avg. Customer Review</option></select></form><div class="s-main-slot">"#,
    );
    for item in items {
        html.push_str(&item.to_html());
    }
    html.push_str("</div>");
    html.push_str(if has_next {
        r#"<a class="s-pagination-item s-pagination-next" href="/s?page=next">Next</a>"#
    } else {
        r#"<span class="s-pagination-item s-pagination-next s-pagination-disabled" aria-disabled="true">Next</span>"#
    });
    html.push_str("</body></html>");
    html
}

/// A scripted session over `pages` result pages, chained by next-page clicks.
///
/// Page `n` lives at `{base}/s?page={n}`; the builder starts there on page 1.
pub fn paginated_session(base: &str, pages: &[Vec<ItemFixture>]) -> ScriptedSessionBuilder {
    let url = |n: usize| format!("{base}/s?page={n}");
    let mut builder = ScriptedSession::builder().start_at(url(1));

    for (i, items) in pages.iter().enumerate() {
        let n = i + 1;
        let has_next = n < pages.len();
        builder = builder.page(url(n), results_page(items, has_next));
        if has_next {
            builder = builder.on_click(&url(n), selectors::NEXT_PAGE, &url(n + 1));
        }
    }

    builder
}
