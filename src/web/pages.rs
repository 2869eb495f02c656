use crate::domain::model::Sheet;
use crate::utils::error::{Result, TimetableError};
use crate::web::error::{ApiError, ApiResult};
use axum::response::Html;
use handlebars::Handlebars;
use serde_json::{json, Value};

const PARTIALS: [(&str, &str); 1] = [("head", include_str!("templates/head.hbs"))];

const TEMPLATES: [(&str, &str); 6] = [
    ("grid", include_str!("templates/grid.hbs")),
    ("class_index", include_str!("templates/class_index.hbs")),
    ("login", include_str!("templates/login.hbs")),
    ("public", include_str!("templates/public.hbs")),
    ("exam_upload", include_str!("templates/exam_upload.hbs")),
    ("exam_view", include_str!("templates/exam_view.hbs")),
];

/// Compiled page templates.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        for (name, source) in PARTIALS {
            registry.register_partial(name, source)?;
        }
        for (name, source) in TEMPLATES {
            registry.register_template_string(name, source)?;
        }
        Ok(Self { registry })
    }

    pub fn render(&self, name: &str, context: &Value) -> ApiResult<Html<String>> {
        self.registry
            .render(name, context)
            .map(Html)
            .map_err(|e| ApiError::from(TimetableError::from(e)))
    }

    /// A sheet as a plain HTML table.
    pub fn grid(&self, heading: &str, subtitle: Option<&str>, back: &str, sheet: &Sheet) -> ApiResult<Html<String>> {
        self.render(
            "grid",
            &json!({
                "title": heading,
                "heading": heading,
                "subtitle": subtitle,
                "back": back,
                "columns": sheet.columns,
                "rows": sheet.rows,
            }),
        )
    }
}

/// Sheet context with row/column positions, used by the editable view.
pub fn editable_sheet(sheet: &Sheet, editable: bool) -> Value {
    let rows: Vec<Value> = sheet
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let cells: Vec<Value> = cells
                .iter()
                .enumerate()
                .map(|(col, value)| json!({ "row": row, "col": col, "value": value, "editable": editable }))
                .collect();
            json!({ "cells": cells })
        })
        .collect();
    json!({ "name": sheet.name, "columns": sheet.columns, "rows": rows })
}
