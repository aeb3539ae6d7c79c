//! HTML for the dashboard page.

use minijinja::Environment;
use serde::Serialize;

use crate::dashboard::{Page, Selected, TITLE};
use crate::error::Error;
use crate::summary::{EMPTY_WARNING, Summary};
use crate::table::Table;

static PAGE_TMPL: &str = include_str!("./templates/page.html.jinja");
static ERROR_TMPL: &str = include_str!("./templates/error.html.jinja");

/// Compiled page templates. Names end in `.html`, which turns on HTML
/// auto-escaping for every interpolated value.
pub struct Templates {
    env: Environment<'static>,
}

#[derive(Serialize)]
struct PageView<'a> {
    title: &'a str,
    table: &'a Table,
    summary: Option<SummaryView<'a>>,
    warning: Option<&'static str>,
    groups: Vec<GroupView<'a>>,
    selected: Option<&'a Selected>,
    unknown_selection: Option<&'a str>,
    result: Option<&'a Table>,
    error: Option<String>,
}

#[derive(Serialize)]
struct SummaryView<'a> {
    driver_age: &'a str,
    driver_gender: &'a str,
    violation: &'a str,
    stop_time: &'a str,
    search_phrase: &'static str,
    drug_phrase: &'static str,
}

#[derive(Serialize)]
struct GroupView<'a> {
    title: &'static str,
    labels: &'a [&'static str],
}

impl<'a> PageView<'a> {
    fn new(page: &'a Page) -> Self {
        let summary = match &page.summary {
            Summary::Stop(stop) => Some(SummaryView {
                driver_age: &stop.driver_age,
                driver_gender: &stop.driver_gender,
                violation: &stop.violation,
                stop_time: &stop.stop_time,
                search_phrase: stop.search_phrase(),
                drug_phrase: stop.drug_phrase(),
            }),
            Summary::Empty => None,
        };
        let (result, error) = match &page.result {
            Some(Ok(table)) => (Some(table), None),
            Some(Err(err)) => (None, Some(err.to_string())),
            None => (None, None),
        };
        PageView {
            title: page.title,
            table: &page.table,
            warning: summary.is_none().then_some(EMPTY_WARNING),
            summary,
            groups: page
                .options
                .iter()
                .map(|(group, labels)| GroupView {
                    title: group.title(),
                    labels,
                })
                .collect(),
            selected: page.selected.as_ref(),
            unknown_selection: page.unknown_selection.as_deref(),
            result,
            error,
        }
    }
}

#[derive(Serialize)]
struct ErrorView {
    title: &'static str,
    error: String,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("page.html", PAGE_TMPL)?;
        env.add_template("error.html", ERROR_TMPL)?;
        Ok(Templates { env })
    }

    pub fn page(&self, page: &Page) -> Result<String, minijinja::Error> {
        self.env
            .get_template("page.html")?
            .render(PageView::new(page))
    }

    /// Page-level failure: the table could not be loaded or the page rendered.
    pub fn error_page(&self, err: &Error) -> Result<String, minijinja::Error> {
        self.env.get_template("error.html")?.render(ErrorView {
            title: TITLE,
            error: err.to_string(),
        })
    }
}
