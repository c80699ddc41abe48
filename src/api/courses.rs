// src/api/courses.rs

use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

use crate::{db, viewer, AppState};

#[utoipa::path(
    get,
    path = "/courses",
    tag = "catalog",
    responses((status = 200, description = "Course catalog", body = [crate::models::Course]))
)]
#[get("/courses")]
pub async fn list_courses(state: web::Data<AppState>) -> impl Responder {
    match db::list_courses(&state.pool).await {
        Ok(courses) => HttpResponse::Ok().json(courses),
        Err(e) => {
            log::error!("list_courses db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[utoipa::path(
    get,
    path = "/courses/{course_id}",
    tag = "catalog",
    params(("course_id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course details", body = crate::models::Course),
        (status = 404, description = "Unknown course")
    )
)]
#[get("/courses/{course_id}")]
pub async fn get_course(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let course_id = path.into_inner();

    match db::get_course(&state.pool, &course_id).await {
        Ok(Some(course)) => HttpResponse::Ok().json(course),
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "course not found"})),
        Err(e) => {
            log::error!("get_course db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Purchase-gated file listing, grouped by subfolder for display.
#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/files",
    tag = "content",
    params(("course_id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Files grouped by subfolder"),
        (status = 403, description = "Course not purchased"),
        (status = 404, description = "Unknown course")
    ),
    security(("bearer_auth" = []))
)]
#[get("/courses/{course_id}/files")]
pub async fn list_course_files(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = *user_id;
    let course_id = path.into_inner();

    let course = match db::get_course(&state.pool, &course_id).await {
        Ok(Some(c)) => c,
        Ok(None) => return HttpResponse::NotFound().json(json!({"error": "course not found"})),
        Err(e) => {
            log::error!("list_course_files get_course error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    match db::has_purchase(&state.pool, user_id, &course_id).await {
        Ok(true) => {}
        Ok(false) => {
            return HttpResponse::Forbidden().json(json!({
                "error": format!(
                    "You need to purchase the {} course to access its content.",
                    course.name
                )
            }));
        }
        Err(e) => {
            log::error!("list_course_files has_purchase error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    let files = match db::list_course_files(&state.pool, &course_id).await {
        Ok(f) => f,
        Err(e) => {
            log::error!("list_course_files db error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let groups = viewer::group_by_subfolder(files);

    HttpResponse::Ok().json(json!({
        "course": course,
        "groups": groups,
    }))
}
