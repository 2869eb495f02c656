use crate::app::pipelines::exam_calendar_pipeline::{self, ExamCalendarPipeline};
use crate::app::pipelines::{SeatingFiles, SeatingPipeline};
use crate::core::exam_calendar::{Allocation, CalendarParams, MAX_CREDITS_PER_DAY, MIN_CREDITS_PER_DAY};
use crate::core::exam_seating::{SeatingParams, CONFIG_FILE, SCHEDULE_FILE, UNSCHEDULED_FILE};
use crate::core::{GenerationEngine, Storage};
use crate::domain::model::{year_label, ExamSlot};
use crate::ingest::calendar_inputs::{normalize_year, CALENDAR_FILES};
use crate::ingest::{split_list, CsvTable};
use crate::utils::export::workbook_to_zip;
use crate::utils::validation::Validate;
use crate::web::auth::{self, AdminUser, CurrentUser, Role};
use crate::web::error::{ApiError, ApiResult};
use crate::web::pages::editable_sheet;
use crate::web::state::ExamState;
use crate::web::{attachment, secure_file_name};
use axum::extract::{Multipart, Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

const YEARS: [u32; 4] = [1, 2, 3, 4];
const SEATING_OUTPUTS: [&str; 3] = [SCHEDULE_FILE, CONFIG_FILE, UNSCHEDULED_FILE];

async fn role_of(state: &ExamState, headers: &HeaderMap) -> Option<Role> {
    match auth::session_token(headers) {
        Some(token) => state.sessions.get(&token).await,
        None => None,
    }
}

// --- Login ---

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login_page(State(state): State<Arc<ExamState>>) -> ApiResult<Html<String>> {
    state.pages.render("login", &json!({ "title": "Login" }))
}

pub async fn login(State(state): State<Arc<ExamState>>, Form(form): Form<LoginForm>) -> ApiResult<Response> {
    let Some(role) = state.credentials.authenticate(&form.username, &form.password) else {
        tracing::warn!("🔒 Failed login for '{}'", form.username);
        let page = state.pages.render(
            "login",
            &json!({ "title": "Login", "error": "Invalid credentials. Please try again." }),
        )?;
        return Ok((StatusCode::UNAUTHORIZED, page).into_response());
    };

    let token = state.sessions.create(role).await;
    tracing::info!("🔑 {} logged in as {:?}", form.username, role);
    let target = match role {
        Role::Admin => "/",
        Role::Viewer => "/view",
    };
    Ok(([(SET_COOKIE, auth::session_cookie(&token))], Redirect::to(target)).into_response())
}

pub async fn logout(State(state): State<Arc<ExamState>>, headers: HeaderMap) -> Response {
    if let Some(token) = auth::session_token(&headers) {
        state.sessions.remove(&token).await;
    }
    ([auth::expired_cookie()], Redirect::to("/public")).into_response()
}

pub async fn public_page(State(state): State<Arc<ExamState>>, headers: HeaderMap) -> ApiResult<Html<String>> {
    let has_calendar = state.workbook.read().await.is_some();
    let logged_in = role_of(&state, &headers).await.is_some();
    state.pages.render(
        "public",
        &json!({ "title": "Exam Timetable", "has_calendar": has_calendar, "logged_in": logged_in }),
    )
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Exam Timetable Generator is running" }))
}

// --- Calendar ---

fn upload_context(error: Option<&str>, form: &HashMap<String, String>) -> Value {
    let years: Vec<Value> = YEARS
        .iter()
        .map(|y| json!({ "year": y, "label": year_label(*y) }))
        .collect();
    let files: Vec<Value> = CALENDAR_FILES
        .iter()
        .map(|(field, file)| json!({ "field": field, "file": file }))
        .collect();
    json!({
        "title": "Exam Calendar Generator",
        "error": error,
        "form": form,
        "years": years,
        "files": files,
    })
}

pub async fn upload_form(_admin: AdminUser, State(state): State<Arc<ExamState>>) -> ApiResult<Html<String>> {
    state.pages.render("exam_upload", &upload_context(None, &HashMap::new()))
}

/// Reads `allocation_<year>_<slot>` fields; years without any field are
/// left out of the allocation.
pub fn parse_allocation_fields(fields: &HashMap<String, String>) -> Result<Allocation, String> {
    let mut allocation = Allocation::new();
    for (name, value) in fields {
        let Some(rest) = name.strip_prefix("allocation_") else {
            continue;
        };
        let (year_text, slot_text) = rest
            .rsplit_once('_')
            .ok_or_else(|| format!("Malformed allocation field '{}'", name))?;
        let year = normalize_year(year_text).ok_or_else(|| format!("Unknown year in '{}'", name))?;
        let slot = ExamSlot::parse(slot_text).ok_or_else(|| format!("Unknown slot in '{}'", name))?;
        let branches = split_list(value, ',').into_iter().map(|b| b.to_uppercase()).collect();
        allocation.entry(year).or_default().insert(slot, branches);
    }
    Ok(allocation)
}

fn calendar_params(state: &ExamState, fields: &HashMap<String, String>) -> Result<CalendarParams, String> {
    let date = |name: &str| {
        fields
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .and_then(|v| NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok())
    };
    let (Some(start_date), Some(end_date)) = (date("start_date"), date("end_date")) else {
        return Err("Please provide both start and end dates".to_string());
    };

    let max_credits_per_day: u32 = fields
        .get("max_credits_per_day")
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| "Invalid maximum credits per day value".to_string())?;
    if !(MIN_CREDITS_PER_DAY..=MAX_CREDITS_PER_DAY).contains(&max_credits_per_day) {
        return Err(format!(
            "Maximum credits per day must be between {} and {}",
            MIN_CREDITS_PER_DAY, MAX_CREDITS_PER_DAY
        ));
    }

    let params = CalendarParams {
        start_date,
        end_date,
        max_credits_per_day,
        allocation: parse_allocation_fields(fields)?,
        holidays: state.holidays.clone(),
        default_seats_per_room: state.seats_per_room,
    };
    params.validate().map_err(|e| e.to_string())?;
    Ok(params)
}

pub async fn generate_calendar(
    _admin: AdminUser,
    State(state): State<Arc<ExamState>>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut fields = HashMap::new();
    let mut uploads = HashMap::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match CALENDAR_FILES.iter().find(|(f, _)| *f == name) {
            Some((_, file)) => {
                let has_file = field.file_name().is_some_and(|n| !n.is_empty());
                let data = field.bytes().await?;
                if has_file && !data.is_empty() {
                    uploads.insert(*file, data);
                }
            }
            None => {
                fields.insert(name, field.text().await?);
            }
        }
    }

    let form_error = |message: String, fields: &HashMap<String, String>| -> ApiResult<Response> {
        let page = state.pages.render("exam_upload", &upload_context(Some(message.as_str()), fields))?;
        Ok((StatusCode::BAD_REQUEST, page).into_response())
    };

    let params = match calendar_params(&state, &fields) {
        Ok(params) => params,
        Err(message) => return form_error(message, &fields),
    };
    if let Some((_, file)) = CALENDAR_FILES.iter().find(|(_, file)| !uploads.contains_key(file)) {
        return form_error(format!("Missing file: {}", file), &fields);
    }

    let _running = state
        .generation
        .try_lock()
        .map_err(|_| ApiError::generation_running())?;

    for (file, data) in &uploads {
        state.calendar.write_file(file, data).await?;
    }

    let pipeline = ExamCalendarPipeline::new(state.calendar.clone(), params);
    match GenerationEngine::new_with_monitoring(pipeline, state.monitor).run().await {
        Ok(report) => {
            *state.workbook.write().await = Some(report.output.workbook);
            Ok(Redirect::to("/view").into_response())
        }
        Err(e) => {
            let message = format!("Error generating timetable: {}", e.user_friendly_message());
            let status = ApiError::from(e).status();
            let page = state.pages.render("exam_upload", &upload_context(Some(message.as_str()), &fields))?;
            Ok((status, page).into_response())
        }
    }
}

pub async fn view(State(state): State<Arc<ExamState>>, headers: HeaderMap) -> ApiResult<Response> {
    let is_admin = role_of(&state, &headers).await == Some(Role::Admin);
    let workbook = state.workbook.read().await;
    let Some(workbook) = workbook.as_ref() else {
        return Ok(Redirect::to("/public").into_response());
    };

    let sheets: Vec<Value> = workbook
        .sheets
        .iter()
        .map(|sheet| editable_sheet(sheet, is_admin))
        .collect();
    let page = state.pages.render(
        "exam_view",
        &json!({ "title": "Exam Timetable", "is_admin": is_admin, "sheets": sheets }),
    )?;
    Ok(page.into_response())
}

pub async fn download(State(state): State<Arc<ExamState>>) -> ApiResult<Response> {
    let workbook = state.workbook.read().await;
    let Some(workbook) = workbook.as_ref() else {
        return Ok(Redirect::to("/public").into_response());
    };
    let bundle = workbook_to_zip(workbook, "exam_schedule.json")?;
    let name = format!("exam_schedule_{}.zip", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    Ok(attachment(&name, bundle))
}

#[derive(Debug, Deserialize)]
pub struct CellUpdate {
    pub sheet: String,
    pub row: usize,
    pub col: usize,
    pub value: Value,
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub async fn update_cell(
    _admin: AdminUser,
    State(state): State<Arc<ExamState>>,
    Json(update): Json<CellUpdate>,
) -> ApiResult<Json<Value>> {
    let mut guard = state.workbook.write().await;
    let workbook = guard
        .as_mut()
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    if !workbook.update_cell(&update.sheet, update.row, update.col, cell_text(&update.value)) {
        return Err(ApiError::BadRequest(format!(
            "No cell at row {}, column {} in '{}'",
            update.row, update.col, update.sheet
        )));
    }
    exam_calendar_pipeline::save_workbook(&state.calendar, workbook).await?;
    tracing::info!("✏️ Updated {} [{}, {}]", update.sheet, update.row, update.col);
    Ok(Json(json!({ "success": true, "message": "Cell updated successfully" })))
}

pub async fn sheet_data(State(state): State<Arc<ExamState>>, Path(sheet): Path<String>) -> ApiResult<Json<Value>> {
    let workbook = state.workbook.read().await;
    let workbook = workbook
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("No timetable found".to_string()))?;
    let sheet = workbook
        .sheet(&sheet)
        .ok_or_else(|| ApiError::NotFound(format!("Sheet not found: {}", sheet)))?;
    Ok(Json(json!({ "success": true, "columns": sheet.columns, "data": sheet.rows })))
}

// --- Seating ---

pub async fn seating_generate(
    _admin: AdminUser,
    State(state): State<Arc<ExamState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let mut rosters = Vec::new();
    let mut rooms = None;
    let mut faculty = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if !matches!(name.as_str(), "courses_file" | "rooms_file" | "faculty_file") {
            fields.insert(name, field.text().await?);
            continue;
        }
        let Some(original) = field.file_name().and_then(secure_file_name) else {
            continue;
        };
        let data = field.bytes().await?;
        match name.as_str() {
            "courses_file" => rosters.push((original, data)),
            "rooms_file" => rooms = Some((original, data)),
            _ => faculty = Some((original, data)),
        }
    }

    let (Some(rooms), Some(faculty)) = (rooms, faculty) else {
        return Err(ApiError::BadRequest("Missing required files".to_string()));
    };
    if rosters.is_empty() {
        return Err(ApiError::BadRequest("Missing required files".to_string()));
    }
    let start_date = fields
        .get("start_date")
        .and_then(|v| NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok())
        .ok_or_else(|| ApiError::BadRequest("Invalid or missing start_date".to_string()))?;
    let courses_per_room: usize = fields
        .get("courses_per_room")
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| ApiError::BadRequest("Invalid courses_per_room".to_string()))?;

    // 先拿到鎖再寫檔，避免覆蓋執行中的輸入
    let _running = state
        .generation
        .try_lock()
        .map_err(|_| ApiError::generation_running())?;

    // 年級由上傳順序決定；前綴讓同名檔案與輸出檔不會互相覆蓋
    let mut files = SeatingFiles::default();
    for (index, (original, data)) in rosters.iter().enumerate() {
        let stored = format!("year{}_{}", index + 1, original);
        state.seating.write_file(&stored, data).await?;
        files.courses.push(stored);
    }
    files.rooms = format!("rooms_{}", rooms.0);
    state.seating.write_file(&files.rooms, &rooms.1).await?;
    files.faculty = format!("faculty_{}", faculty.0);
    state.seating.write_file(&files.faculty, &faculty.1).await?;

    let pipeline = SeatingPipeline::new(
        state.seating.clone(),
        files,
        SeatingParams::new(start_date, courses_per_room),
    );
    let plan = GenerationEngine::new_with_monitoring(pipeline, state.monitor)
        .run()
        .await?
        .output;

    Ok(Json(json!({
        "success": true,
        "message": "Schedule generated successfully",
        "schedule": plan.rows,
        "unscheduled": plan.unscheduled,
        "config": plan.config,
    })))
}

pub async fn seating_view(_user: CurrentUser, State(state): State<Arc<ExamState>>) -> ApiResult<Html<String>> {
    if !state.seating.exists(SCHEDULE_FILE).await {
        return state.pages.render(
            "grid",
            &json!({
                "title": "Exam Seating",
                "heading": "Exam Seating",
                "subtitle": "No schedule available. Please contact the administrator.",
                "back": "/view",
            }),
        );
    }

    let table = CsvTable::parse(SCHEDULE_FILE, &state.seating.read_file(SCHEDULE_FILE).await?)?;
    let unscheduled = if state.seating.exists(UNSCHEDULED_FILE).await {
        CsvTable::parse(UNSCHEDULED_FILE, &state.seating.read_file(UNSCHEDULED_FILE).await?)?.len()
    } else {
        0
    };
    let subtitle = format!("{} seating rows, {} unscheduled courses", table.len(), unscheduled);
    state
        .pages
        .grid("Exam Seating", Some(&subtitle), "/view", &table.to_sheet("Exam Seating"))
}

pub async fn seating_download(
    _user: CurrentUser,
    State(state): State<Arc<ExamState>>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    if !SEATING_OUTPUTS.contains(&filename.as_str()) || !state.seating.exists(&filename).await {
        return Err(ApiError::NotFound(format!("File not found: {}", filename)));
    }
    Ok(attachment(&filename, state.seating.read_file(&filename).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_fields() {
        let fields = HashMap::from([
            ("allocation_1_Morning".to_string(), "cse, ece".to_string()),
            ("allocation_1_Evening".to_string(), "".to_string()),
            ("allocation_2_Evening".to_string(), "DSAI".to_string()),
            ("start_date".to_string(), "2025-10-06".to_string()),
        ]);
        let allocation = parse_allocation_fields(&fields).unwrap();

        assert_eq!(allocation[&1][&ExamSlot::Morning], vec!["CSE", "ECE"]);
        assert!(allocation[&1][&ExamSlot::Evening].is_empty());
        assert_eq!(allocation[&2][&ExamSlot::Evening], vec!["DSAI"]);
        assert!(!allocation[&2].contains_key(&ExamSlot::Morning));
    }

    #[test]
    fn test_allocation_rejects_unknown_slot() {
        let fields = HashMap::from([("allocation_1_Night".to_string(), "CSE".to_string())]);
        assert!(parse_allocation_fields(&fields).is_err());
    }
}
