use crate::app::pipelines::ClassPipeline;
use crate::config::schedule_config::ScheduleConfig;
use crate::core::class_reports::teacher_file_name;
use crate::core::{GenerationEngine, Storage};
use crate::ingest::class_inputs::{COURSES_FILE, ELECTIVES_FILE, ROOMS_FILE};
use crate::ingest::CsvTable;
use crate::utils::export::{sheet_to_csv, zip_entries};
use crate::utils::validation;
use crate::web::error::{ApiError, ApiResult};
use crate::web::state::ClassState;
use crate::web::attachment;
use axum::extract::{Multipart, Path, State};
use axum::response::{Html, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const UPLOAD_FIELDS: [(&str, &str); 3] = [
    ("combined", COURSES_FILE),
    ("rooms", ROOMS_FILE),
    ("elective", ELECTIVES_FILE),
];

const NO_TEACHERS: &str = "Teacher timetables not found. Generate timetables first.";
const NO_TIMETABLE: &str = "No timetables generated yet";

pub async fn index(State(state): State<Arc<ClassState>>) -> ApiResult<Html<String>> {
    let timetable = state.timetable.read().await;
    let context = match timetable.as_ref() {
        Some(t) => json!({
            "title": "Class Timetable Generator",
            "generated_at": t.generated_at,
            "sections": t.section_titles(),
            "teachers": t.faculty_names(),
        }),
        None => json!({ "title": "Class Timetable Generator" }),
    };
    state.pages.render("class_index", &context)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Class Timetable Generator is running" }))
}

pub async fn upload(State(state): State<Arc<ClassState>>, mut multipart: Multipart) -> ApiResult<Json<Value>> {
    let mut accepted: Vec<(&str, String, axum::body::Bytes)> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(field_name) = field.name().map(|n| n.to_string()) else {
            continue;
        };
        let Some((_, target)) = UPLOAD_FIELDS.iter().find(|(name, _)| *name == field_name) else {
            tracing::debug!("Ignoring upload field '{}'", field_name);
            continue;
        };
        let original = field.file_name().unwrap_or_default().to_string();
        if original.is_empty() {
            continue;
        }
        validation::validate_file_extensions(&field_name, &[original.clone()], &["csv"])
            .map_err(|_| ApiError::BadRequest(format!("Only CSV files are allowed ({})", original)))?;

        let data = field.bytes().await?;
        CsvTable::parse(target, &data)?;
        accepted.push((*target, original, data));
    }

    if accepted.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    // 全部檢查通過才覆蓋舊檔
    let mut saved = Vec::with_capacity(accepted.len());
    for (target, original, data) in &accepted {
        state.inputs.write_file(target, data).await?;
        tracing::info!("📁 Saved {} as {}", original, target);
        saved.push(target.to_string());
    }
    Ok(Json(json!({
        "success": true,
        "message": format!("Uploaded {} file(s)", saved.len()),
        "files": saved,
    })))
}

async fn input_table(state: &ClassState, file: &str, missing: &str) -> ApiResult<CsvTable> {
    if !state.inputs.exists(file).await {
        return Err(ApiError::NotFound(missing.to_string()));
    }
    Ok(CsvTable::parse(file, &state.inputs.read_file(file).await?)?)
}

pub async fn courses(State(state): State<Arc<ClassState>>) -> ApiResult<Json<Value>> {
    let table = input_table(&state, COURSES_FILE, "combined.csv not found").await?;

    let mut grouped: Map<String, Value> = Map::new();
    for record in table.records() {
        let department = record.get("Department").filter(|v| !v.is_empty()).map_or("Unknown", |v| v.as_str());
        let semester = record.get("Semester").filter(|v| !v.is_empty()).map_or("Unknown", |v| v.as_str());
        let key = format!("{} - Semester {}", department, semester);
        if let Value::Array(rows) = grouped.entry(key).or_insert_with(|| Value::Array(Vec::new())) {
            rows.push(json!(record));
        }
    }
    Ok(Json(json!({ "courses": grouped })))
}

pub async fn electives(State(state): State<Arc<ClassState>>) -> ApiResult<Json<Value>> {
    let table = input_table(&state, ELECTIVES_FILE, "No electives file found").await?;
    Ok(Json(json!({ "electives": table.records() })))
}

pub async fn get_config(State(state): State<Arc<ClassState>>) -> Json<ScheduleConfig> {
    Json(state.schedule.read().await.clone())
}

pub async fn update_config(
    State(state): State<Arc<ClassState>>,
    Json(patch): Json<Value>,
) -> ApiResult<Json<Value>> {
    let mut schedule = state.schedule.write().await;
    let merged = schedule.merged(&patch)?;
    merged.save(&state.config_path).await?;
    *schedule = merged;
    tracing::info!("⚙️ Schedule configuration updated");
    Ok(Json(json!({ "success": true, "config": *schedule })))
}

pub async fn generate(State(state): State<Arc<ClassState>>) -> ApiResult<Json<Value>> {
    let _running = state
        .generation
        .try_lock()
        .map_err(|_| ApiError::generation_running())?;

    let config = state.schedule.read().await.clone();
    let pipeline = ClassPipeline::new(state.inputs.clone(), state.outputs.clone(), config);
    let report = GenerationEngine::new_with_monitoring(pipeline, state.monitor)
        .run()
        .await?;

    let timetable = report.output;
    let body = json!({
        "success": true,
        "message": "Timetables generated successfully",
        "sections": timetable.sections.len(),
        "teachers": timetable.faculty_names().len(),
        "unscheduled": timetable.unscheduled.len(),
        "generated_at": timetable.generated_at,
        "elapsed_ms": report.elapsed.as_millis() as u64,
    });
    *state.timetable.write().await = Some(timetable);
    Ok(Json(body))
}

pub async fn outputs(State(state): State<Arc<ClassState>>) -> ApiResult<Json<Value>> {
    let mut files = Vec::new();
    for name in state.outputs.list_files("").await? {
        let size = state.outputs.file_size(&name).await?;
        files.push(json!({ "name": name, "size": format!("{:.2} KB", size as f64 / 1024.0) }));
    }
    Ok(Json(json!({ "files": files })))
}

pub async fn download(
    State(state): State<Arc<ClassState>>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    validation::validate_file_name("filename", &filename)?;
    if !state.outputs.exists(&filename).await {
        return Err(ApiError::NotFound(format!("File not found: {}", filename)));
    }
    Ok(attachment(&filename, state.outputs.read_file(&filename).await?))
}

pub async fn download_all(State(state): State<Arc<ClassState>>) -> ApiResult<Response> {
    let mut files = Vec::new();
    for name in state.outputs.list_files("").await? {
        let data = state.outputs.read_file(&name).await?;
        files.push((name, data));
    }
    let bundle = zip_entries(files.iter().map(|(n, d)| (n.as_str(), d.as_slice())))?;
    Ok(attachment("timetable_outputs.zip", bundle))
}

pub async fn teachers(State(state): State<Arc<ClassState>>) -> ApiResult<Json<Value>> {
    let timetable = state.timetable.read().await;
    let timetable = timetable
        .as_ref()
        .ok_or_else(|| ApiError::NotFound(NO_TEACHERS.to_string()))?;
    Ok(Json(json!({ "teachers": timetable.faculty_names() })))
}

pub async fn download_teacher(
    State(state): State<Arc<ClassState>>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    let timetable = state.timetable.read().await;
    let timetable = timetable
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("Teacher timetables not found".to_string()))?;
    let sheet = timetable
        .faculty_sheet(&name)
        .ok_or_else(|| ApiError::NotFound("Teacher not found".to_string()))?;
    Ok(attachment(&teacher_file_name(&sheet.name), sheet_to_csv(&sheet)?))
}

pub async fn section_page(
    State(state): State<Arc<ClassState>>,
    Path(section): Path<String>,
) -> ApiResult<Html<String>> {
    let timetable = state.timetable.read().await;
    let timetable = timetable
        .as_ref()
        .ok_or_else(|| ApiError::NotFound(NO_TIMETABLE.to_string()))?;
    let grid = timetable
        .section(&section)
        .ok_or_else(|| ApiError::NotFound(format!("Section not found: {}", section)))?;
    state
        .pages
        .grid(&section, Some(&timetable.generated_at), "/", &timetable.section_sheet(grid))
}

pub async fn teacher_page(
    State(state): State<Arc<ClassState>>,
    Path(name): Path<String>,
) -> ApiResult<Html<String>> {
    let timetable = state.timetable.read().await;
    let timetable = timetable
        .as_ref()
        .ok_or_else(|| ApiError::NotFound(NO_TEACHERS.to_string()))?;
    let sheet = timetable
        .faculty_sheet(&name)
        .ok_or_else(|| ApiError::NotFound("Teacher not found".to_string()))?;
    state.pages.grid(&sheet.name, Some("Weekly teaching timetable"), "/", &sheet)
}

pub async fn free_rooms_page(State(state): State<Arc<ClassState>>) -> ApiResult<Html<String>> {
    let timetable = state.timetable.read().await;
    let timetable = timetable
        .as_ref()
        .ok_or_else(|| ApiError::NotFound(NO_TIMETABLE.to_string()))?;
    state
        .pages
        .grid("Free Rooms", Some(&timetable.generated_at), "/", &timetable.free_rooms_sheet())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_fields_map_to_input_names() {
        let targets: Vec<&str> = UPLOAD_FIELDS.iter().map(|(_, f)| *f).collect();
        assert_eq!(targets, vec!["combined.csv", "rooms.csv", "elective.csv"]);
    }
}
