#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::sync::{Mutex, MutexGuard};

use pocketdesk::config::{AppConfig, CONFIG_FILE};
use pocketdesk::error::CollectionError;
use pocketdesk::salary::PayBreakdown;
use pocketdesk::tools::{self, Age, Quantity, Span, Unit};
use pocketdesk::view::{Section, Theme};
use pocketdesk::{Note, NoteForm, Prompt, SalaryForm, SalaryRecord, WorkLog, WorkLogForm, Workspace};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tauri::{AppHandle, Manager, State};
use tracing_subscriber::{fmt, EnvFilter};

const LOG_ENV: &str = "POCKETDESK_LOG";

struct AppState {
    workspace: Mutex<Workspace>,
}

#[derive(Deserialize)]
struct IdRequest {
    id: String,
}

#[derive(Deserialize)]
struct NotesListRequest {
    #[serde(default)]
    query: String,
}

#[derive(Deserialize)]
struct WorkLogsListRequest {
    #[serde(default)]
    date: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum CollectionName {
    Notes,
    WorkLogs,
    SalaryRecords,
}

#[derive(Deserialize)]
struct DeleteRequestPayload {
    collection: CollectionName,
    id: String,
}

#[derive(Deserialize)]
struct SectionRequest {
    section: Section,
}

#[derive(Deserialize)]
struct AgeRequest {
    dob: String,
}

#[derive(Deserialize)]
struct TimeBetweenRequest {
    start: String,
    end: String,
}

#[derive(Deserialize)]
struct QuantityRequest {
    quantity: Quantity,
}

#[derive(Deserialize)]
struct ConvertRequest {
    quantity: Quantity,
    value: f64,
    from: Unit,
    to: Unit,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FormState<F> {
    fields: F,
    editing_id: Option<String>,
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, Workspace>, String> {
    state
        .workspace
        .lock()
        .map_err(|_| "Workspace is unavailable.".to_string())
}

/// Validation problems are an expected outcome for the form, not a failure.
fn save_response(result: Result<String, CollectionError>) -> Result<serde_json::Value, String> {
    match result {
        Ok(id) => Ok(json!({ "ok": true, "id": id })),
        Err(CollectionError::Validation(err)) => Ok(json!({
            "ok": false,
            "field": err.field,
            "error": err.message,
        })),
        Err(err) => Err(err.to_string()),
    }
}

#[tauri::command]
fn app_version(app: AppHandle) -> String {
    app.package_info().version.to_string()
}

#[tauri::command]
fn notes_list(state: State<'_, AppState>, payload: NotesListRequest) -> Result<Vec<Note>, String> {
    let mut ws = lock(&state)?;
    ws.notes.search(payload.query.as_str());
    Ok(ws.notes.visible())
}

#[tauri::command]
fn notes_save(state: State<'_, AppState>, payload: NoteForm) -> Result<serde_json::Value, String> {
    let mut ws = lock(&state)?;
    save_response(ws.notes.save(payload))
}

#[tauri::command]
fn notes_edit(
    state: State<'_, AppState>,
    payload: IdRequest,
) -> Result<Option<FormState<NoteForm>>, String> {
    let mut ws = lock(&state)?;
    if !ws.edit_note(payload.id.as_str()) {
        return Ok(None);
    }
    Ok(Some(FormState {
        fields: ws.notes.form().fields.clone(),
        editing_id: ws.notes.editing_id().map(str::to_string),
    }))
}

#[tauri::command]
fn notes_get(state: State<'_, AppState>, payload: IdRequest) -> Result<Option<Note>, String> {
    let ws = lock(&state)?;
    Ok(ws.notes.collection().find_by_id(payload.id.as_str()).cloned())
}

#[tauri::command]
fn notes_clear_form(state: State<'_, AppState>) -> Result<NoteForm, String> {
    let mut ws = lock(&state)?;
    ws.notes.clear_form();
    Ok(ws.notes.form().fields.clone())
}

#[tauri::command]
fn work_logs_list(
    state: State<'_, AppState>,
    payload: WorkLogsListRequest,
) -> Result<Vec<WorkLog>, String> {
    let mut ws = lock(&state)?;
    ws.work_logs.filter_date(payload.date.as_str());
    Ok(ws.work_logs.visible())
}

#[tauri::command]
fn work_logs_save(
    state: State<'_, AppState>,
    payload: WorkLogForm,
) -> Result<serde_json::Value, String> {
    let mut ws = lock(&state)?;
    save_response(ws.work_logs.save(payload))
}

#[tauri::command]
fn work_logs_edit(
    state: State<'_, AppState>,
    payload: IdRequest,
) -> Result<Option<FormState<WorkLogForm>>, String> {
    let mut ws = lock(&state)?;
    if !ws.edit_work_log(payload.id.as_str()) {
        return Ok(None);
    }
    Ok(Some(FormState {
        fields: ws.work_logs.form().fields.clone(),
        editing_id: ws.work_logs.editing_id().map(str::to_string),
    }))
}

#[tauri::command]
fn work_logs_clear_form(state: State<'_, AppState>) -> Result<WorkLogForm, String> {
    let mut ws = lock(&state)?;
    ws.work_logs.clear_form();
    Ok(ws.work_logs.form().fields.clone())
}

#[tauri::command]
fn salary_list(state: State<'_, AppState>) -> Result<Vec<SalaryRecord>, String> {
    let ws = lock(&state)?;
    Ok(ws.salary.visible())
}

#[tauri::command]
fn salary_preview(payload: SalaryForm) -> PayBreakdown {
    payload.breakdown()
}

#[tauri::command]
fn salary_save(
    state: State<'_, AppState>,
    payload: SalaryForm,
) -> Result<serde_json::Value, String> {
    let mut ws = lock(&state)?;
    save_response(ws.salary.save(payload))
}

#[tauri::command]
fn salary_get(state: State<'_, AppState>, payload: IdRequest) -> Result<Option<SalaryRecord>, String> {
    let ws = lock(&state)?;
    Ok(ws.salary.collection().find_by_id(payload.id.as_str()).cloned())
}

#[tauri::command]
fn salary_clear_form(state: State<'_, AppState>) -> Result<SalaryForm, String> {
    let mut ws = lock(&state)?;
    ws.salary.clear_form();
    Ok(ws.salary.form().fields.clone())
}

#[tauri::command]
fn delete_request(
    state: State<'_, AppState>,
    payload: DeleteRequestPayload,
) -> Result<Option<Prompt>, String> {
    let mut ws = lock(&state)?;
    let id = payload.id.trim();
    match payload.collection {
        CollectionName::Notes => ws.request_note_delete(id),
        CollectionName::WorkLogs => ws.request_work_log_delete(id),
        CollectionName::SalaryRecords => ws.request_salary_delete(id),
    }
    Ok(ws.pending().cloned())
}

#[tauri::command]
fn delete_pending(state: State<'_, AppState>) -> Result<Option<Prompt>, String> {
    let ws = lock(&state)?;
    Ok(ws.pending().cloned())
}

#[tauri::command]
fn delete_confirm(state: State<'_, AppState>) -> Result<serde_json::Value, String> {
    let mut ws = lock(&state)?;
    match ws.confirm().map_err(|err| err.to_string())? {
        Some(done) => Ok(json!({
            "ok": true,
            "collection": done.collection,
            "id": done.id,
            "removed": done.removed,
        })),
        None => Ok(json!({ "ok": false, "error": "Nothing to confirm." })),
    }
}

#[tauri::command]
fn delete_cancel(state: State<'_, AppState>) -> Result<bool, String> {
    let mut ws = lock(&state)?;
    ws.cancel();
    Ok(true)
}

#[tauri::command]
fn theme_get(state: State<'_, AppState>) -> Result<Theme, String> {
    let ws = lock(&state)?;
    Ok(ws.view.theme())
}

#[tauri::command]
fn theme_toggle(state: State<'_, AppState>) -> Result<Theme, String> {
    let mut ws = lock(&state)?;
    ws.view.toggle_theme().map_err(|err| err.to_string())
}

#[tauri::command]
fn view_switch(state: State<'_, AppState>, payload: SectionRequest) -> Result<Section, String> {
    let mut ws = lock(&state)?;
    ws.view.switch_to(payload.section);
    Ok(ws.view.section())
}

#[tauri::command]
fn tools_age(payload: AgeRequest) -> Result<Age, String> {
    let dob = tools::parse_date(payload.dob.as_str()).map_err(|err| err.to_string())?;
    tools::age_on(dob, tools::today()).map_err(|err| err.to_string())
}

#[tauri::command]
fn tools_time_between(payload: TimeBetweenRequest) -> Result<Span, String> {
    let start = tools::parse_datetime(payload.start.as_str()).map_err(|err| err.to_string())?;
    let end = tools::parse_datetime(payload.end.as_str()).map_err(|err| err.to_string())?;
    tools::time_between(start, end).map_err(|err| err.to_string())
}

#[tauri::command]
fn tools_units(payload: QuantityRequest) -> Vec<Unit> {
    payload.quantity.units().to_vec()
}

#[tauri::command]
fn tools_convert(payload: ConvertRequest) -> Result<String, String> {
    tools::convert(payload.quantity, payload.value, payload.from, payload.to)
        .map(tools::format_converted)
        .map_err(|err| err.to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

fn open_workspace(app: &AppHandle) -> Result<Workspace, Box<dyn std::error::Error>> {
    let data_dir = app.path().app_data_dir()?.join("Pocketdesk");
    let config = AppConfig::load(&data_dir.join(CONFIG_FILE))?.or_root(data_dir);
    Ok(Workspace::open(&config)?)
}

fn main() {
    init_tracing();
    tauri::Builder::default()
        .setup(|app| {
            let workspace = open_workspace(app.handle())?;
            app.manage(AppState {
                workspace: Mutex::new(workspace),
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            app_version,
            notes_list,
            notes_save,
            notes_edit,
            notes_get,
            notes_clear_form,
            work_logs_list,
            work_logs_save,
            work_logs_edit,
            work_logs_clear_form,
            salary_list,
            salary_preview,
            salary_save,
            salary_get,
            salary_clear_form,
            delete_request,
            delete_pending,
            delete_confirm,
            delete_cancel,
            theme_get,
            theme_toggle,
            view_switch,
            tools_age,
            tools_time_between,
            tools_units,
            tools_convert
        ])
        .run(tauri::generate_context!())
        .expect("failed to run Pocketdesk");
}
