mod common;

use aula::model::entity::User;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    ADMIN_ID, Action, Flow, create_course_action, create_user_action, setup_server, setup_test_db,
};

#[tokio::test]
async fn route_course_crud_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(create_user_action("student", "student@localhost", "student").with_save_as("student"))
        // students may not create courses
        .step(
            Action::new("create_course_denied", "POST", "/api/v1/courses/")
                .with_dyn_user(|ctx| ctx.get_json::<User>("student").id())
                .with_body(json!({ "name": "Forbidden 101" }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(create_course_action("Algebra"))
        .step(
            Action::new("get_course", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/courses/{}", ctx.get("course")["id"].as_str().unwrap())
                })
                .with_user(ADMIN_ID)
                .assert_body(|body| assert!(body.contains("Algebra"))),
        )
        .step(
            Action::new("rename_course", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/courses/{}", ctx.get("course")["id"].as_str().unwrap())
                })
                .with_user(ADMIN_ID)
                .with_body(json!({ "name": "Linear Algebra" }))
                .assert_body(|body| assert!(body.contains("Linear Algebra"))),
        )
        .step(
            Action::new("delete_course", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/courses/{}", ctx.get("course")["id"].as_str().unwrap())
                })
                .with_user(ADMIN_ID),
        )
        // soft-deleted rows disappear from reads
        .step(
            Action::new("get_deleted_course", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/courses/{}", ctx.get("course")["id"].as_str().unwrap())
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_exam_validation_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(create_course_action("Algebra"))
        // an inverted availability window is rejected
        .step(
            Action::new("inverted_window", "POST", "/api/v1/exams/")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "title": "Broken",
                        "kind": "sync",
                        "state_id": 3,
                        "course_id": ctx.get("course")["id"],
                        "starts_at": "2026-09-02T10:00:00Z",
                        "ends_at": "2026-09-01T10:00:00Z",
                    })
                })
                .with_expect(StatusCode::UNPROCESSABLE_ENTITY),
        )
        // an open-ended window is fine
        .step(
            Action::new("open_window", "POST", "/api/v1/exams/")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "title": "Midterm",
                        "kind": "sync",
                        "state_id": 3,
                        "course_id": ctx.get("course")["id"],
                        "starts_at": "2026-09-01T10:00:00Z",
                    })
                })
                .with_save_as("exam"),
        )
        // patch touches only the named fields
        .step(
            Action::new("retitle_exam", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/exams/{}", ctx.get("exam")["id"].as_str().unwrap())
                })
                .with_user(ADMIN_ID)
                .with_body(json!({ "title": "Final" }))
                .assert_body(|body| {
                    let exam: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(exam["title"], "Final");
                    assert_eq!(exam["kind"], "sync");
                    assert!(!exam["starts_at"].is_null());
                }),
        )
        // a null clears a nullable field
        .step(
            Action::new("clear_window", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/exams/{}", ctx.get("exam")["id"].as_str().unwrap())
                })
                .with_user(ADMIN_ID)
                .with_body(json!({ "starts_at": null }))
                .assert_body(|body| {
                    let exam: Value = serde_json::from_str(body).unwrap();
                    assert!(exam["starts_at"].is_null());
                }),
        )
        .step(
            Action::new("course_exams", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/courses/{}/exams",
                        ctx.get("course")["id"].as_str().unwrap()
                    )
                })
                .with_user(ADMIN_ID)
                .assert_body(|body| {
                    let exams: Vec<Value> = serde_json::from_str(body).unwrap();
                    assert_eq!(exams.len(), 1);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_exam_detail_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(create_course_action("Algebra"))
        .step(
            Action::new("create_exam", "POST", "/api/v1/exams/")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "title": "Midterm",
                        "kind": "sync",
                        "state_id": 3,
                        "course_id": ctx.get("course")["id"],
                    })
                })
                .with_save_as("exam"),
        )
        .step(
            Action::new("create_question", "POST", "/api/v1/questions/")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "exam_id": ctx.get("exam")["id"],
                        "prompt": "2 + 2 = ?",
                        "points": 5,
                    })
                })
                .with_save_as("question"),
        )
        .step(
            Action::new("create_answer", "POST", "/api/v1/questions/answers")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "question_id": ctx.get("question")["id"],
                        "text": "4",
                        "is_correct": true,
                    })
                }),
        )
        .step(
            Action::new("exam_detail", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/exams/{}", ctx.get("exam")["id"].as_str().unwrap())
                })
                .with_user(ADMIN_ID)
                .assert_body(|body| {
                    let detail: Value = serde_json::from_str(body).unwrap();
                    let questions = detail["questions"].as_array().unwrap();
                    assert_eq!(questions.len(), 1);
                    let answers = questions[0]["answers"].as_array().unwrap();
                    assert_eq!(answers.len(), 1);
                    assert_eq!(answers[0]["text"], "4");
                }),
        )
        // a negative time limit is rejected
        .step(
            Action::new("negative_duration", "POST", "/api/v1/questions/")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "exam_id": ctx.get("exam")["id"],
                        "prompt": "hurry up",
                        "duration_limit": -1,
                    })
                })
                .with_expect(StatusCode::UNPROCESSABLE_ENTITY),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_rubric_tree_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            Action::new("create_rubric", "POST", "/api/v1/rubrics/")
                .with_user(ADMIN_ID)
                .with_body(json!({ "name": "Essay rubric", "kind": "holistic" }))
                .with_save_as("rubric"),
        )
        .step(
            Action::new("create_indicator", "POST", "/api/v1/rubrics/indicators")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "rubric_id": ctx.get("rubric")["id"],
                        "description": "Clarity of argument",
                        "weight": 40,
                    })
                })
                .with_save_as("indicator"),
        )
        // inverted bounds are rejected
        .step(
            Action::new("bad_level", "POST", "/api/v1/rubrics/levels")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "indicator_id": ctx.get("indicator")["id"],
                        "kind": "porcentaje",
                        "label": "broken",
                        "min_value": 90,
                        "max_value": 10,
                    })
                })
                .with_expect(StatusCode::UNPROCESSABLE_ENTITY),
        )
        .step(
            Action::new("good_level", "POST", "/api/v1/rubrics/levels")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "indicator_id": ctx.get("indicator")["id"],
                        "kind": "porcentaje",
                        "label": "excellent",
                        "min_value": 90,
                        "max_value": 100,
                    })
                }),
        )
        .step(
            Action::new("rubric_tree", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/rubrics/{}", ctx.get("rubric")["id"].as_str().unwrap())
                })
                .with_user(ADMIN_ID)
                .assert_body(|body| {
                    let detail: Value = serde_json::from_str(body).unwrap();
                    let indicators = detail["indicators"].as_array().unwrap();
                    assert_eq!(indicators.len(), 1);
                    let levels = indicators[0]["levels"].as_array().unwrap();
                    assert_eq!(levels.len(), 1);
                    assert_eq!(levels[0]["label"], "excellent");
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_catalog_purge_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(create_user_action("student", "student@localhost", "student").with_save_as("student"))
        .step(create_course_action("Algebra"))
        .step(
            Action::new("create_exam", "POST", "/api/v1/exams/")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "title": "Midterm",
                        "kind": "sync",
                        "state_id": 3,
                        "course_id": ctx.get("course")["id"],
                    })
                })
                .with_save_as("exam"),
        )
        .step(
            Action::new("create_question", "POST", "/api/v1/questions/")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "exam_id": ctx.get("exam")["id"],
                        "prompt": "2 + 2 = ?",
                        "points": 5,
                    })
                })
                .with_save_as("question"),
        )
        .step(
            Action::new("create_answer", "POST", "/api/v1/questions/answers")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "question_id": ctx.get("question")["id"],
                        "text": "4",
                        "is_correct": true,
                    })
                })
                .with_save_as("answer"),
        )
        // purge is an admin-only operation
        .step(
            Action::new("purge_denied", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/questions/answers/{}/purge",
                        ctx.get("answer")["id"].as_str().unwrap()
                    )
                })
                .with_dyn_user(|ctx| ctx.get_json::<User>("student").id())
                .with_expect(StatusCode::FORBIDDEN),
        )
        // children go first, rows still reference their parents
        .step(
            Action::new("purge_answer", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/questions/answers/{}/purge",
                        ctx.get("answer")["id"].as_str().unwrap()
                    )
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("purge_question", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/questions/{}/purge",
                        ctx.get("question")["id"].as_str().unwrap()
                    )
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("purge_exam", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/exams/{}/purge",
                        ctx.get("exam")["id"].as_str().unwrap()
                    )
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("purge_course", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/courses/{}/purge",
                        ctx.get("course")["id"].as_str().unwrap()
                    )
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::OK),
        )
        // the physically removed row is gone for good
        .step(
            Action::new("purge_course_again", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/courses/{}/purge",
                        ctx.get("course")["id"].as_str().unwrap()
                    )
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_rubric_purge_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            Action::new("create_rubric", "POST", "/api/v1/rubrics/")
                .with_user(ADMIN_ID)
                .with_body(json!({ "name": "Essay rubric", "kind": "holistic" }))
                .with_save_as("rubric"),
        )
        .step(
            Action::new("create_indicator", "POST", "/api/v1/rubrics/indicators")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "rubric_id": ctx.get("rubric")["id"],
                        "description": "Clarity of argument",
                        "weight": 40,
                    })
                })
                .with_save_as("indicator"),
        )
        .step(
            Action::new("create_level", "POST", "/api/v1/rubrics/levels")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "indicator_id": ctx.get("indicator")["id"],
                        "kind": "porcentaje",
                        "label": "excellent",
                        "min_value": 90,
                        "max_value": 100,
                    })
                })
                .with_save_as("level"),
        )
        .step(
            Action::new("purge_level", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/rubrics/levels/{}/purge",
                        ctx.get("level")["id"]
                    )
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("purge_indicator", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/rubrics/indicators/{}/purge",
                        ctx.get("indicator")["id"]
                    )
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("purge_rubric", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/rubrics/{}/purge",
                        ctx.get("rubric")["id"].as_str().unwrap()
                    )
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("purge_rubric_again", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/rubrics/{}/purge",
                        ctx.get("rubric")["id"].as_str().unwrap()
                    )
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}
