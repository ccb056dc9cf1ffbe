//! HTTP-backed document session
//!
//! Drives server-rendered search pages without a browser. Interactions are
//! translated into the requests a browser would send:
//! - choosing an option in a dropdown that shares its form with a text input
//!   is remembered and sent with that form's next submission;
//! - choosing an option in a dropdown-only form (sort selectors) submits
//!   that form right away;
//! - submitting text serializes the enclosing form (hidden inputs, current
//!   dropdown values, pending selections) and sends it to the form action;
//! - clicking follows the href of the element or its enclosing anchor.
//!
//! Documents never change on their own, so the session reports itself as
//! static and locator lookups probe it once.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Method;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

use super::http_client::{FetchedPage, HttpClient};
use super::parsing::is_enabled;
use super::session::{DocumentSession, OptionChoice, SessionError, SessionResult};

static FORMS: Lazy<Selector> = Lazy::new(|| Selector::parse("form").expect("static selector"));
static FORM_FIELDS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input, select, textarea").expect("static selector"));
static OPTIONS: Lazy<Selector> = Lazy::new(|| Selector::parse("option").expect("static selector"));

/// A request equivalent to submitting a form
#[derive(Debug, Clone, PartialEq, Eq)]
struct FormSubmission {
    method: Method,
    action: Url,
    fields: Vec<(String, String)>,
}

/// A dropdown choice waiting for its form to be submitted
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingSelection {
    form_index: usize,
    name: String,
    value: String,
}

#[derive(Debug)]
enum SelectionPlan {
    Defer(PendingSelection),
    Submit(FormSubmission),
}

/// Document session over plain HTTP
pub struct HttpSession {
    client: HttpClient,
    page: Option<FetchedPage>,
    pending: Vec<PendingSelection>,
    closed: bool,
}

impl HttpSession {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            page: None,
            pending: Vec::new(),
            closed: false,
        }
    }

    fn page(&self) -> SessionResult<&FetchedPage> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        self.page.as_ref().ok_or(SessionError::NoDocument)
    }

    async fn load(&mut self, submission: FormSubmission) -> SessionResult<()> {
        let page = self
            .client
            .fetch(submission.method, &submission.action, &submission.fields)
            .await?;
        self.page = Some(page);
        self.pending.clear();
        Ok(())
    }

    fn plan_selection(&self, selector: &str, choice: &OptionChoice) -> SessionResult<SelectionPlan> {
        let page = self.page()?;
        let document = Html::parse_document(&page.body);
        let select = first_element(&document, selector)?;

        if select.value().name() != "select" {
            return Err(SessionError::not_interactable(selector, "not a <select> element"));
        }
        let name = select
            .value()
            .attr("name")
            .ok_or_else(|| SessionError::not_interactable(selector, "dropdown has no name"))?;

        let value = select
            .select(&OPTIONS)
            .find(|option| choice.matches(&option_text(option), option.value().attr("value")))
            .map(|option| option_value(&option))
            .ok_or_else(|| SessionError::element_not_found(format!("{selector} option {choice}")))?;

        let (form_index, form) = enclosing_form(&document, select)
            .ok_or_else(|| SessionError::not_interactable(selector, "dropdown is not inside a form"))?;

        let selection = PendingSelection {
            form_index,
            name: name.to_string(),
            value,
        };

        if has_text_input(form) {
            Ok(SelectionPlan::Defer(selection))
        } else {
            build_submission(&page.url, form, &[(selection.name, selection.value)])
                .map(SelectionPlan::Submit)
        }
    }

    fn plan_text_submission(&self, selector: &str, text: &str) -> SessionResult<FormSubmission> {
        let page = self.page()?;
        let document = Html::parse_document(&page.body);
        let input = first_element(&document, selector)?;

        if !matches!(input.value().name(), "input" | "textarea") {
            return Err(SessionError::not_interactable(selector, "not a text input"));
        }
        let name = input
            .value()
            .attr("name")
            .ok_or_else(|| SessionError::not_interactable(selector, "input has no name"))?;

        let (form_index, form) = enclosing_form(&document, input)
            .ok_or_else(|| SessionError::not_interactable(selector, "input is not inside a form"))?;

        let mut overrides: Vec<(String, String)> = self
            .pending
            .iter()
            .filter(|p| p.form_index == form_index)
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect();
        overrides.push((name.to_string(), text.to_string()));

        build_submission(&page.url, form, &overrides)
    }

    fn plan_click(&self, selector: &str) -> SessionResult<FormSubmission> {
        let page = self.page()?;
        let document = Html::parse_document(&page.body);
        let element = first_enabled_element(&document, selector)?;

        let href = std::iter::once(element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .find(|e| e.value().name() == "a")
            .and_then(|anchor| anchor.value().attr("href"))
            .ok_or_else(|| SessionError::not_interactable(selector, "element has no link target"))?;

        let target = page
            .url
            .join(href)
            .map_err(|e| SessionError::navigation(href, e))?;

        Ok(FormSubmission {
            method: Method::GET,
            action: target,
            fields: Vec::new(),
        })
    }
}

#[async_trait]
impl DocumentSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        let url = Url::parse(url).map_err(|e| SessionError::navigation(url, e))?;
        self.load(FormSubmission {
            method: Method::GET,
            action: url,
            fields: Vec::new(),
        })
        .await
    }

    async fn content(&self) -> SessionResult<String> {
        Ok(self.page()?.body.clone())
    }

    fn current_url(&self) -> Option<String> {
        self.page.as_ref().map(|p| p.url.to_string())
    }

    fn renders_asynchronously(&self) -> bool {
        false
    }

    async fn select_option(&mut self, selector: &str, choice: &OptionChoice) -> SessionResult<()> {
        match self.plan_selection(selector, choice)? {
            SelectionPlan::Defer(selection) => {
                debug!("Holding {}={} until form submission", selection.name, selection.value);
                self.pending
                    .retain(|p| !(p.form_index == selection.form_index && p.name == selection.name));
                self.pending.push(selection);
                Ok(())
            }
            SelectionPlan::Submit(submission) => self.load(submission).await,
        }
    }

    async fn submit_text(&mut self, selector: &str, text: &str) -> SessionResult<()> {
        let submission = self.plan_text_submission(selector, text)?;
        self.load(submission).await
    }

    async fn click(&mut self, selector: &str) -> SessionResult<()> {
        let submission = self.plan_click(selector)?;
        self.load(submission).await
    }

    async fn close(&mut self) -> SessionResult<()> {
        if !self.closed {
            info!("Closing HTTP session");
        }
        self.closed = true;
        self.page = None;
        self.pending.clear();
        Ok(())
    }
}

fn parse_selector(selector: &str) -> SessionResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| SessionError::not_interactable(selector, format!("invalid selector: {e}")))
}

fn first_element<'a>(document: &'a Html, selector: &str) -> SessionResult<ElementRef<'a>> {
    let parsed = parse_selector(selector)?;
    document
        .select(&parsed)
        .next()
        .ok_or_else(|| SessionError::element_not_found(selector))
}

/// First match of `selector` that is not disabled
fn first_enabled_element<'a>(document: &'a Html, selector: &str) -> SessionResult<ElementRef<'a>> {
    let parsed = parse_selector(selector)?;
    let mut matches = document.select(&parsed).peekable();

    if matches.peek().is_none() {
        return Err(SessionError::element_not_found(selector));
    }
    matches
        .find(is_enabled)
        .ok_or_else(|| SessionError::not_interactable(selector, "element is disabled"))
}

fn enclosing_form<'a>(document: &'a Html, element: ElementRef<'a>) -> Option<(usize, ElementRef<'a>)> {
    let form = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "form")?;
    let index = document.select(&FORMS).position(|f| f.id() == form.id())?;
    Some((index, form))
}

fn has_text_input(form: ElementRef<'_>) -> bool {
    form.select(&FORM_FIELDS).any(|field| match field.value().name() {
        "textarea" => true,
        "input" => matches!(
            field.value().attr("type").map(str::to_ascii_lowercase).as_deref(),
            None | Some("text" | "search")
        ),
        _ => false,
    })
}

fn option_text(option: &ElementRef<'_>) -> String {
    option.text().collect::<String>()
}

fn option_value(option: &ElementRef<'_>) -> String {
    option
        .value()
        .attr("value")
        .map_or_else(|| option_text(option).trim().to_string(), str::to_string)
}

/// Serialize a form the way a browser would, then apply overrides
fn build_submission(
    base: &Url,
    form: ElementRef<'_>,
    overrides: &[(String, String)],
) -> SessionResult<FormSubmission> {
    let method = match form.value().attr("method") {
        Some(m) if m.eq_ignore_ascii_case("post") => Method::POST,
        _ => Method::GET,
    };

    let mut action = match form.value().attr("action").filter(|a| !a.trim().is_empty()) {
        Some(action) => base
            .join(action)
            .map_err(|e| SessionError::navigation(action, e))?,
        None => base.clone(),
    };
    if method == Method::GET {
        action.set_query(None);
    }

    let mut fields: Vec<(String, String)> = form
        .select(&FORM_FIELDS)
        .filter_map(|field| field_entry(&field))
        .collect();

    for (name, value) in overrides {
        match fields.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1.clone_from(value),
            None => fields.push((name.clone(), value.clone())),
        }
    }

    Ok(FormSubmission {
        method,
        action,
        fields,
    })
}

fn field_entry(field: &ElementRef<'_>) -> Option<(String, String)> {
    let element = field.value();
    let name = element.attr("name")?;
    if element.attr("disabled").is_some() {
        return None;
    }

    let value = match element.name() {
        "select" => {
            let options: Vec<ElementRef<'_>> = field.select(&OPTIONS).collect();
            let chosen = options
                .iter()
                .find(|o| o.value().attr("selected").is_some())
                .or_else(|| options.first())?;
            option_value(chosen)
        }
        "textarea" => field.text().collect(),
        _ => {
            let kind = element.attr("type").unwrap_or("text").to_ascii_lowercase();
            match kind.as_str() {
                "submit" | "button" | "image" | "reset" | "file" => return None,
                "checkbox" | "radio" if element.attr("checked").is_none() => return None,
                "checkbox" | "radio" => element.attr("value").unwrap_or("on").to_string(),
                _ => element.attr("value").unwrap_or_default().to_string(),
            }
        }
    };

    Some((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::HttpClientConfig;

    const HOME: &str = r#"
        <html><body>
          <form name="site-search" action="/s/ref=nb_sb_noss" method="GET">
            <select id="searchDropdownBox" name="url">
              <option value="search-alias=aps" selected>All Categories</option>
              <option value="search-alias=stripbooks">Books</option>
            </select>
            <input type="text" id="twotabsearchtextbox" name="field-keywords" value="">
            <input type="hidden" name="__mk_en_IN" value="ÅMÅŽÕÑ">
            <input type="submit" value="Go">
          </form>
        </body></html>"#;

    const RESULTS: &str = r#"
        <html><body>
          <form action="/s" method="get" class="s-result-sort-form">
            <input type="hidden" name="k" value="Dune">
            <select id="s-result-sort-select" name="s">
              <option value="relevanceblender" selected>Featured</option>
              <option value="review-rank">Avg. Customer Review</option>
            </select>
          </form>
          <a class="s-pagination-next" href="/s?k=Dune&amp;page=2">Next</a>
          <span class="s-pagination-previous" aria-disabled="true">Previous</span>
        </body></html>"#;

    fn session_on(url: &str, body: &str) -> HttpSession {
        let client = HttpClient::new(&HttpClientConfig::default()).unwrap();
        let mut session = HttpSession::new(client);
        session.page = Some(FetchedPage {
            url: Url::parse(url).unwrap(),
            body: body.to_string(),
        });
        session
    }

    #[test]
    fn test_category_choice_is_deferred_to_search_submission() {
        let mut session = session_on("https://www.amazon.in/", HOME);

        let plan = session
            .plan_selection("select#searchDropdownBox", &OptionChoice::VisibleText("Books".into()))
            .unwrap();
        let SelectionPlan::Defer(selection) = plan else {
            panic!("expected deferred selection");
        };
        session.pending.push(selection);

        let submission = session
            .plan_text_submission("input#twotabsearchtextbox", "Dune")
            .unwrap();
        assert_eq!(submission.method, Method::GET);
        assert_eq!(submission.action.as_str(), "https://www.amazon.in/s/ref=nb_sb_noss");
        assert!(submission.fields.contains(&("url".into(), "search-alias=stripbooks".into())));
        assert!(submission.fields.contains(&("field-keywords".into(), "Dune".into())));
        assert!(submission.fields.iter().any(|(n, _)| n == "__mk_en_IN"));
        assert!(!submission.fields.iter().any(|(_, v)| v == "Go"));
    }

    #[test]
    fn test_sort_choice_submits_immediately() {
        let session = session_on("https://www.amazon.in/s?k=Dune", RESULTS);

        let plan = session
            .plan_selection("select#s-result-sort-select", &OptionChoice::Value("review-rank".into()))
            .unwrap();
        let SelectionPlan::Submit(submission) = plan else {
            panic!("expected immediate submission");
        };
        assert_eq!(submission.action.as_str(), "https://www.amazon.in/s");
        assert_eq!(
            submission.fields,
            vec![("k".to_string(), "Dune".to_string()), ("s".to_string(), "review-rank".to_string())]
        );
    }

    #[test]
    fn test_missing_option_is_not_found() {
        let session = session_on("https://www.amazon.in/", HOME);
        let err = session
            .plan_selection("select#searchDropdownBox", &OptionChoice::VisibleText("Music".into()))
            .unwrap_err();
        assert!(err.is_optional_step_failure());
    }

    #[test]
    fn test_click_follows_link() {
        let session = session_on("https://www.amazon.in/s?k=Dune", RESULTS);
        let submission = session.plan_click(".s-pagination-next").unwrap();
        assert_eq!(submission.action.as_str(), "https://www.amazon.in/s?k=Dune&page=2");
    }

    #[test]
    fn test_disabled_control_cannot_be_clicked() {
        let session = session_on("https://www.amazon.in/s?k=Dune", RESULTS);
        let err = session.plan_click(".s-pagination-previous").unwrap_err();
        assert!(matches!(err, SessionError::NotInteractable { .. }));
    }

    #[test]
    fn test_click_uses_enabled_duplicate() {
        let page = r#"<a rel="next" aria-disabled="true" href="/s?page=0">Next</a><a rel="next" href="/s?page=2">Next</a>"#;
        let session = session_on("https://www.amazon.in/s?page=1", page);
        let submission = session.plan_click("a[rel='next']").unwrap();
        assert_eq!(submission.action.as_str(), "https://www.amazon.in/s?page=2");
    }

    #[tokio::test]
    async fn test_closed_session_rejects_reads() {
        let mut session = session_on("https://www.amazon.in/", HOME);
        session.close().await.unwrap();
        assert_eq!(session.content().await.unwrap_err(), SessionError::Closed);
        assert!(session.current_url().is_none());
    }
}
