use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub struct IdentityHeaderModifier;

impl Modify for IdentityHeaderModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "identity",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-User-Id",
                    "Numeric id of the acting user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::account::user_create_handler,
        crate::web::routes::account::user_list_handler,
        crate::web::routes::account::user_get_handler,
        crate::web::routes::account::user_update_handler,
        crate::web::routes::account::user_delete_handler,
        crate::web::routes::account::user_purge_handler,
        crate::web::routes::courses::course_create_handler,
        crate::web::routes::courses::course_list_handler,
        crate::web::routes::courses::course_get_handler,
        crate::web::routes::courses::course_exams_handler,
        crate::web::routes::courses::course_update_handler,
        crate::web::routes::courses::course_delete_handler,
        crate::web::routes::courses::course_purge_handler,
        crate::web::routes::exams::exam_create_handler,
        crate::web::routes::exams::exam_list_handler,
        crate::web::routes::exams::exam_get_handler,
        crate::web::routes::exams::exam_update_handler,
        crate::web::routes::exams::exam_delete_handler,
        crate::web::routes::exams::exam_purge_handler,
        crate::web::routes::questions::question_create_handler,
        crate::web::routes::questions::question_get_handler,
        crate::web::routes::questions::question_update_handler,
        crate::web::routes::questions::question_delete_handler,
        crate::web::routes::questions::question_purge_handler,
        crate::web::routes::questions::answer_list_handler,
        crate::web::routes::questions::answer_create_handler,
        crate::web::routes::questions::answer_update_handler,
        crate::web::routes::questions::answer_delete_handler,
        crate::web::routes::questions::answer_purge_handler,
        crate::web::routes::rubrics::rubric_create_handler,
        crate::web::routes::rubrics::rubric_list_handler,
        crate::web::routes::rubrics::rubric_get_handler,
        crate::web::routes::rubrics::rubric_update_handler,
        crate::web::routes::rubrics::rubric_delete_handler,
        crate::web::routes::rubrics::rubric_purge_handler,
        crate::web::routes::rubrics::indicator_create_handler,
        crate::web::routes::rubrics::indicator_update_handler,
        crate::web::routes::rubrics::indicator_delete_handler,
        crate::web::routes::rubrics::indicator_purge_handler,
        crate::web::routes::rubrics::level_create_handler,
        crate::web::routes::rubrics::level_update_handler,
        crate::web::routes::rubrics::level_delete_handler,
        crate::web::routes::rubrics::level_purge_handler,
        crate::web::routes::sessions::session_start_handler,
        crate::web::routes::sessions::session_list_handler,
        crate::web::routes::sessions::session_get_handler,
        crate::web::routes::sessions::session_delete_handler,
        crate::web::routes::sessions::session_progress_handler,
        crate::web::routes::sessions::session_advance_handler,
        crate::web::routes::sessions::session_answer_handler,
        crate::web::routes::sessions::session_finish_handler,
        crate::web::routes::sessions::history_list_handler,
        crate::web::routes::sessions::history_for_exam_handler,
        crate::web::routes::sessions::history_count_handler,
        crate::web::routes::sessions::history_delete_handler,
        crate::web::routes::states::state_list_handler,
        crate::web::routes::states::state_get_handler,
    ),
    modifiers(&IdentityHeaderModifier),
)]
pub struct ApiDoc;
