use axum::response::Html;
use handlebars::{html_escape, Handlebars};
use serde::Serialize;

use crate::error::AppError;
use crate::models::{ColumnSummary, DescribeTable, MissingCount};

const TABLE_CLASS: &str = "table table-striped";
const MISSING_CELL: &str = "NaN";

/// Page templates compiled into the binary.
pub struct Views {
    registry: Handlebars<'static>,
}

impl Views {
    pub fn new() -> Result<Self, AppError> {
        let mut registry = Handlebars::new();
        registry.register_partial("layout", include_str!("../templates/layout.hbs"))?;
        registry.register_template_string("index", include_str!("../templates/index.hbs"))?;
        registry.register_template_string("process", include_str!("../templates/process.hbs"))?;
        registry.register_template_string("details", include_str!("../templates/details.hbs"))?;
        registry.register_template_string(
            "process_file",
            include_str!("../templates/process_file.hbs"),
        )?;
        registry.register_template_string("gallery", include_str!("../templates/gallery.hbs"))?;
        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<Html<String>, AppError> {
        let body = self.registry.render(name, data)?;
        Ok(Html(body))
    }
}

/// Small builder for the striped result tables; every cell is escaped.
#[derive(Debug, Default)]
pub struct HtmlTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl HtmlTable {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_html(&self) -> String {
        let mut html = format!("<table class=\"{}\">\n<thead>\n<tr>", TABLE_CLASS);
        for cell in &self.header {
            html.push_str(&format!("<th>{}</th>", html_escape(cell)));
        }
        html.push_str("</tr>\n</thead>\n<tbody>\n");
        for row in &self.rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str(&format!("<td>{}</td>", html_escape(cell)));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>");
        html
    }
}

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| MISSING_CELL.to_string())
}

/// Statistic labels down the side, one column per described column.
pub fn describe_table(describe: &DescribeTable) -> String {
    let mut table = HtmlTable::new(std::iter::once(String::new()).chain(describe.columns.iter().cloned()));
    for row in &describe.rows {
        table.row(std::iter::once(row.label.to_string()).chain(row.cells.iter().map(cell)));
    }
    table.to_html()
}

pub fn missing_table<'a>(missing: impl IntoIterator<Item = &'a MissingCount>) -> String {
    let mut table = HtmlTable::new(["Column", "Missing Values"]);
    for entry in missing {
        table.row([entry.column.clone(), entry.missing.to_string()]);
    }
    table.to_html()
}

pub fn info_table(columns: &[ColumnSummary]) -> String {
    let mut table = HtmlTable::new([
        "Column", "Type", "Non-null", "Missing", "Unique", "Sample values", "Min", "Max",
    ]);
    for column in columns {
        table.row([
            column.name.clone(),
            column.data_type.label().to_string(),
            column.non_null_count.to_string(),
            column.null_count.to_string(),
            column.unique_count.to_string(),
            column.sample_values.join(", "),
            column.min_value.clone().unwrap_or_default(),
            column.max_value.clone().unwrap_or_default(),
        ]);
    }
    table.to_html()
}

pub fn head_table(columns: &[String], rows: &[Vec<Option<String>>]) -> String {
    let mut table = HtmlTable::new(columns.iter().cloned());
    for row in rows {
        table.row(row.iter().map(cell));
    }
    table.to_html()
}
