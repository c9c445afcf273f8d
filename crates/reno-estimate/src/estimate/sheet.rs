use std::fmt::Write as _;
use std::io::{Read, Write};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{format_won, pyung_to_m2, Category, Task, TaskId};
use super::input::coerce_number;
use super::model::Estimate;

/// Printable estimate: the rows, totals and attachments a document renderer lays out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateSheet {
    pub title: &'static str,
    pub issued_on: NaiveDate,
    pub template_label: &'static str,
    pub base_area: f64,
    pub base_area_m2: f64,
    pub rows: Vec<SheetRow>,
    pub total: f64,
    pub total_display: String,
    pub memo: Option<String>,
    pub photo_urls: Vec<String>,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRow {
    pub category: Category,
    pub name: String,
    pub description: String,
    pub quantity: f64,
    pub unit_label: &'static str,
    pub unit_price: f64,
    pub line_total: f64,
}

impl EstimateSheet {
    /// Only included tasks appear on the sheet.
    pub fn from_estimate(estimate: &Estimate, issued_on: NaiveDate) -> Self {
        let rows = estimate
            .tasks()
            .iter()
            .filter(|task| task.included)
            .map(|task| SheetRow {
                category: task.category,
                name: task.name.clone(),
                description: if task.description.trim().is_empty() {
                    "-".to_string()
                } else {
                    task.description.clone()
                },
                quantity: task.quantity,
                unit_label: task.category.unit().label(),
                unit_price: task.unit_price,
                line_total: task.line_total(),
            })
            .collect();

        let total = estimate.total();
        let base_area = estimate.base_area().unwrap_or(0.0);
        let memo = Some(estimate.memo().trim())
            .filter(|memo| !memo.is_empty())
            .map(str::to_string);

        Self {
            title: "리뉴얼 공사 예가 산출서",
            issued_on,
            template_label: estimate.template().label(),
            base_area,
            base_area_m2: pyung_to_m2(base_area),
            rows,
            total,
            total_display: format_won(total),
            memo,
            photo_urls: estimate
                .images()
                .iter()
                .map(|image| image.url.clone())
                .collect(),
            file_name: format!("견적서_{}.pdf", issued_on.format("%Y-%m-%d")),
        }
    }

    /// A4 print layout markup handed to the document rasterizer.
    pub fn render_html(&self) -> String {
        let mut html = String::new();
        let _ = writeln!(html, "<!DOCTYPE html>");
        let _ = writeln!(
            html,
            "<html lang=\"ko\"><head><meta charset=\"utf-8\"><title>{}</title></head><body>",
            escape_html(self.title)
        );
        let _ = writeln!(html, "<header><h1>{}</h1>", escape_html(self.title));
        let _ = writeln!(html, "<p>Renewal Construction Preliminary Estimate</p></header>");
        let _ = writeln!(html, "<section class=\"meta\">");
        let _ = writeln!(html, "<p>산출일자: {}</p>", self.issued_on.format("%Y-%m-%d"));
        let _ = writeln!(
            html,
            "<p>기준면적: {} 평 ({:.2} m²)</p>",
            self.base_area, self.base_area_m2
        );
        let _ = writeln!(html, "<p>공사 유형: {}</p>", escape_html(self.template_label));
        let _ = writeln!(
            html,
            "<p>총 예상 소요 금액 (VAT 별도): <strong>{}</strong></p>",
            self.total_display
        );
        let _ = writeln!(html, "</section>");

        let _ = writeln!(html, "<table><thead><tr>");
        for heading in ["공종(카테고리)", "항목 / 내용", "세부사양", "수량", "단가", "합계"] {
            let _ = write!(html, "<th>{heading}</th>");
        }
        let _ = writeln!(html, "</tr></thead><tbody>");
        for row in &self.rows {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{} {}</td><td>{}</td><td>{}</td></tr>",
                escape_html(row.category.label()),
                escape_html(&row.name),
                escape_html(&row.description),
                row.quantity,
                row.unit_label,
                group_digits(row.unit_price),
                group_digits(row.line_total)
            );
        }
        let _ = writeln!(
            html,
            "</tbody><tfoot><tr><td colspan=\"5\">총 합계</td><td>{}</td></tr></tfoot></table>",
            self.total_display
        );

        if let Some(memo) = &self.memo {
            let _ = writeln!(
                html,
                "<section class=\"memo\"><h3>산출 근거 및 비고</h3><p>{}</p></section>",
                escape_html(memo).replace('\n', "<br>")
            );
        }

        if !self.photo_urls.is_empty() {
            let _ = writeln!(html, "<section class=\"photos\"><h3>현장 사진 대장</h3>");
            for url in &self.photo_urls {
                let _ = writeln!(html, "<img src=\"{}\" alt=\"site\">", escape_html(url));
            }
            let _ = writeln!(html, "</section>");
        }

        let _ = writeln!(html, "</body></html>");
        html
    }

    /// Writes the included rows plus a trailing total row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), SheetError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "category",
            "item_name",
            "description",
            "area",
            "unit",
            "unit_price",
            "line_total",
        ])?;
        for row in &self.rows {
            csv_writer.write_record([
                row.category.label().to_string(),
                row.name.clone(),
                row.description.clone(),
                row.quantity.to_string(),
                row.unit_label.to_string(),
                row.unit_price.to_string(),
                row.line_total.to_string(),
            ])?;
        }
        csv_writer.write_record([
            "총 합계".to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            self.total.to_string(),
        ])?;
        csv_writer.flush()?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("task sheet csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("task sheet io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads a task sheet. Numeric cells go through the same coercion as editor
/// input, unknown categories become 기타 and a missing `included` column
/// means included.
pub fn import_tasks<R: Read>(reader: R) -> Result<Vec<Task>, SheetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut tasks = Vec::new();

    for record in csv_reader.deserialize::<TaskSheetRow>() {
        let row = record?;
        tasks.push(Task {
            id: TaskId::generate(),
            included: row.included.unwrap_or(true),
            category: Category::from_label_or_other(&row.category),
            name: row.item_name,
            description: row.description.unwrap_or_default(),
            unit_price: row
                .unit_price
                .as_deref()
                .map(coerce_number)
                .unwrap_or(0.0),
            quantity: row.area.as_deref().map(coerce_number).unwrap_or(0.0),
        });
    }

    Ok(tasks)
}

#[derive(Debug, Deserialize)]
struct TaskSheetRow {
    category: String,
    item_name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    unit_price: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    area: Option<String>,
    #[serde(default, deserialize_with = "flag_cell")]
    included: Option<bool>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

fn flag_cell<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = empty_string_as_none(deserializer)?;
    Ok(raw.map(|value| {
        !matches!(
            value.to_ascii_lowercase().as_str(),
            "false" | "0" | "no" | "n" | "x"
        )
    }))
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn group_digits(amount: f64) -> String {
    format_won(amount).replacen('₩', "", 1)
}
