// src/api/documents.rs
//
// Server rendition of the course reading surface: document outline, per-page
// text, and first-match search. Everything here is purchase-gated; documents
// are fetched from their stored URL per request, never cached across requests.

use actix_web::{get, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::models::CourseFile;
use crate::viewer::{DocumentIndex, PdfSource};
use crate::{db, AppState};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

enum GateOutcome {
    Allowed(CourseFile),
    Denied(HttpResponse),
}

/// Common preamble: the purchase gate plus the file lookup. The file must
/// belong to the requested course; access control itself stays course-level.
async fn gate_and_lookup(state: &AppState, user_id: i32, course_id: &str, pdf_id: &str) -> GateOutcome {
    match db::has_purchase(&state.pool, user_id, course_id).await {
        Ok(true) => {}
        Ok(false) => {
            return GateOutcome::Denied(HttpResponse::Forbidden().json(json!({
                "error": "course not purchased"
            })));
        }
        Err(e) => {
            log::error!("document gate has_purchase error: {e}");
            return GateOutcome::Denied(HttpResponse::InternalServerError().finish());
        }
    }

    match db::get_course_file(&state.pool, course_id, pdf_id).await {
        Ok(Some(file)) => GateOutcome::Allowed(file),
        Ok(None) => GateOutcome::Denied(
            HttpResponse::NotFound().json(json!({"error": "file not found"})),
        ),
        Err(e) => {
            log::error!("document gate get_course_file error: {e}");
            GateOutcome::Denied(HttpResponse::InternalServerError().finish())
        }
    }
}

/// Fetch the stored document and parse it. `Err` carries the ready-to-send
/// fallback response (direct-download link plus message).
async fn load_document(file: &CourseFile) -> Result<PdfSource, HttpResponse> {
    let fallback = |message: &str| {
        HttpResponse::Ok().json(json!({
            "status": "fallback",
            "download_url": file.url,
            "message": message,
        }))
    };

    let resp = match reqwest::get(&file.url).await {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            log::error!("document fetch failed pdf_id={} status={}", file.pdf_id, r.status());
            return Err(fallback("The PDF could not be loaded. Please download it instead."));
        }
        Err(e) => {
            log::error!("document fetch error pdf_id={}: {e}", file.pdf_id);
            return Err(fallback("The PDF could not be loaded. Please download it instead."));
        }
    };

    let bytes = match resp.bytes().await {
        Ok(b) => b,
        Err(e) => {
            log::error!("document read error pdf_id={}: {e}", file.pdf_id);
            return Err(fallback("The PDF could not be loaded. Please download it instead."));
        }
    };

    match PdfSource::load(&bytes) {
        Ok(source) => Ok(source),
        Err(e) => {
            log::error!("document parse error pdf_id={}: {e}", file.pdf_id);
            Err(fallback("The PDF could not be loaded. Please download it instead."))
        }
    }
}

/// Page count and download link; the client drives its thumbnail rail and lazy
/// pager off this.
#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/documents/{pdf_id}",
    tag = "reader",
    params(
        ("course_id" = String, Path, description = "Course id"),
        ("pdf_id" = String, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Document outline, or fallback if the document cannot be loaded"),
        (status = 403, description = "Course not purchased"),
        (status = 404, description = "File not found in this course")
    ),
    security(("bearer_auth" = []))
)]
#[get("/courses/{course_id}/documents/{pdf_id}")]
pub async fn document_outline(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (course_id, pdf_id) = path.into_inner();

    let file = match gate_and_lookup(&state, *user_id, &course_id, &pdf_id).await {
        GateOutcome::Allowed(f) => f,
        GateOutcome::Denied(resp) => return resp,
    };

    let source = match load_document(&file).await {
        Ok(s) => s,
        Err(fallback) => return fallback,
    };

    let index = DocumentIndex::new(source);

    HttpResponse::Ok().json(json!({
        "status": "ready",
        "page_count": index.page_count(),
        "download_url": file.url,
    }))
}

/// Text content of one page, 1-based in document order. A page whose text
/// cannot be extracted is served blank rather than failing the view.
#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/documents/{pdf_id}/pages/{page}",
    tag = "reader",
    params(
        ("course_id" = String, Path, description = "Course id"),
        ("pdf_id" = String, Path, description = "Document id"),
        ("page" = u32, Path, description = "1-based page number")
    ),
    responses(
        (status = 200, description = "Page text"),
        (status = 403, description = "Course not purchased"),
        (status = 404, description = "File not found or page out of range")
    ),
    security(("bearer_auth" = []))
)]
#[get("/courses/{course_id}/documents/{pdf_id}/pages/{page}")]
pub async fn page_text(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
    path: web::Path<(String, String, u32)>,
) -> impl Responder {
    let (course_id, pdf_id, page) = path.into_inner();

    let file = match gate_and_lookup(&state, *user_id, &course_id, &pdf_id).await {
        GateOutcome::Allowed(f) => f,
        GateOutcome::Denied(resp) => return resp,
    };

    let source = match load_document(&file).await {
        Ok(s) => s,
        Err(fallback) => return fallback,
    };

    let mut index = DocumentIndex::new(source);
    let page_count = index.page_count();

    let text = match index.page_text(page) {
        Ok(t) => t.to_string(),
        Err(e) => return HttpResponse::NotFound().json(json!({"error": e.to_string()})),
    };

    HttpResponse::Ok().json(json!({
        "page": page,
        "page_count": page_count,
        "text": text,
    }))
}

/// Sequential first-match search across pages. Restarts from page 1 on every
/// call; an empty query is reported as skipped without scanning.
#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/documents/{pdf_id}/search",
    tag = "reader",
    params(
        ("course_id" = String, Path, description = "Course id"),
        ("pdf_id" = String, Path, description = "Document id"),
        ("q" = Option<String>, Query, description = "Search query")
    ),
    responses(
        (status = 200, description = "Search outcome", body = crate::viewer::SearchOutcome),
        (status = 403, description = "Course not purchased"),
        (status = 404, description = "File not found in this course")
    ),
    security(("bearer_auth" = []))
)]
#[get("/courses/{course_id}/documents/{pdf_id}/search")]
pub async fn search_document(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
    path: web::Path<(String, String)>,
    params: web::Query<SearchParams>,
) -> impl Responder {
    let (course_id, pdf_id) = path.into_inner();

    let file = match gate_and_lookup(&state, *user_id, &course_id, &pdf_id).await {
        GateOutcome::Allowed(f) => f,
        GateOutcome::Denied(resp) => return resp,
    };

    let query = params.q.as_deref().unwrap_or("");
    if query.is_empty() {
        // Nothing to scan; the document is not even fetched.
        return HttpResponse::Ok().json(crate::viewer::SearchOutcome::Skipped);
    }

    let source = match load_document(&file).await {
        Ok(s) => s,
        Err(fallback) => return fallback,
    };

    let mut index = DocumentIndex::new(source);
    let outcome = index.find_first(query);

    HttpResponse::Ok().json(outcome)
}
