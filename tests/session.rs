mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    ADMIN_ID, Action, Flow, create_course_action, create_user_action, setup_server, setup_test_db,
};

fn user_id(ctx_val: &Value) -> i32 {
    ctx_val["id"].as_i64().expect("user id missing") as i32
}

/// Seeds a student, a course and a two-question exam with answer options.
/// Stores: `student`, `course`, `exam`, `q1`, `q2`, `a1_right`, `a1_wrong`, `a2_right`.
fn seed_exam(flow: Flow, exam_kind: &'static str) -> Flow {
    flow.step(create_user_action("student", "student@localhost", "student").with_save_as("student"))
        .step(create_course_action("Algebra"))
        .step(
            Action::new("create_exam", "POST", "/api/v1/exams/")
                .with_user(ADMIN_ID)
                .with_dyn_body(move |ctx| {
                    json!({
                        "title": "Midterm",
                        "kind": exam_kind,
                        "state_id": 3,
                        "course_id": ctx.get("course")["id"],
                    })
                })
                .with_save_as("exam"),
        )
        .step(
            Action::new("create_q1", "POST", "/api/v1/questions/")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "exam_id": ctx.get("exam")["id"],
                        "prompt": "2 + 2 = ?",
                        "points": 5,
                        "duration_limit": 1.5,
                    })
                })
                .with_save_as("q1"),
        )
        .step(
            Action::new("create_q2", "POST", "/api/v1/questions/")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "exam_id": ctx.get("exam")["id"],
                        "prompt": "3 * 3 = ?",
                        "points": 3,
                    })
                })
                .with_save_as("q2"),
        )
        .step(
            Action::new("create_a1_right", "POST", "/api/v1/questions/answers")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "question_id": ctx.get("q1")["id"],
                        "text": "4",
                        "is_correct": true,
                    })
                })
                .with_save_as("a1_right"),
        )
        .step(
            Action::new("create_a1_wrong", "POST", "/api/v1/questions/answers")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "question_id": ctx.get("q1")["id"],
                        "text": "5",
                        "is_correct": false,
                    })
                })
                .with_save_as("a1_wrong"),
        )
        .step(
            Action::new("create_a2_right", "POST", "/api/v1/questions/answers")
                .with_user(ADMIN_ID)
                .with_dyn_body(|ctx| {
                    json!({
                        "question_id": ctx.get("q2")["id"],
                        "text": "9",
                        "is_correct": true,
                    })
                })
                .with_save_as("a2_right"),
        )
}

#[tokio::test]
async fn session_round_trip_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let flow = seed_exam(Flow::new(), "sync");

    flow.step(
        Action::new("start_session", "POST", "/api/v1/sessions/")
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "exam_id": ctx.get("exam")["id"] }))
            .assert_body(|body| {
                let session: Value = serde_json::from_str(body).unwrap();
                assert!(session["finished_at"].is_null());
                assert!(session["current_attempt_id"].is_null());
            })
            .with_save_as("session"),
    )
    .step(
        Action::new("advance_q1", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/advance", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "question_id": ctx.get("q1")["id"] }))
            .assert_body(|body| {
                let resp: Value = serde_json::from_str(body).unwrap();
                // pointer now references the freshly created attempt
                assert_eq!(
                    resp["session"]["current_attempt_id"],
                    resp["current_attempt"]["id"]
                );
                assert!(resp["current_attempt"]["answer_id"].is_null());
            })
            .with_save_as("adv1"),
    )
    .step(
        Action::new("answer_q1", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/answer", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| {
                json!({
                    "attempt_id": ctx.get("adv1")["current_attempt"]["id"],
                    "answer_id": ctx.get("a1_right")["id"],
                })
            })
            .assert_body(|body| {
                let attempt: Value = serde_json::from_str(body).unwrap();
                assert!(!attempt["answer_id"].is_null());
                assert!(!attempt["ended_at"].is_null());
            }),
    )
    .step(
        Action::new("advance_q2", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/advance", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "question_id": ctx.get("q2")["id"] })),
    )
    .step(
        Action::new("finish", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/finish", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .assert_body(|body| {
                let session: Value = serde_json::from_str(body).unwrap();
                assert!(!session["finished_at"].is_null());
                assert!(session["current_attempt_id"].is_null());
            }),
    )
    // only q1 was answered (correctly, 5 points)
    .step(
        Action::new("score_recorded", "GET", "dynamic")
            .with_dyn_path(|ctx| {
                format!(
                    "/api/v1/sessions/history/exam/{}",
                    ctx.get("exam")["id"].as_str().unwrap()
                )
            })
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .assert_body(|body| {
                let entry: Value = serde_json::from_str(body).unwrap();
                assert_eq!(entry["score"], 5);
            }),
    )
    .run(&mut server, pool)
    .await;
}

#[tokio::test]
async fn session_duplicate_sync_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let flow = seed_exam(Flow::new(), "sync");

    flow.step(
        Action::new("start_session", "POST", "/api/v1/sessions/")
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "exam_id": ctx.get("exam")["id"] })),
    )
    // a second live session for a sync exam is rejected
    .step(
        Action::new("start_again", "POST", "/api/v1/sessions/")
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "exam_id": ctx.get("exam")["id"] }))
            .with_expect(StatusCode::CONFLICT)
            .assert_body(|body| assert!(body.contains("error"))),
    )
    .run(&mut server, pool)
    .await;
}

#[tokio::test]
async fn session_async_supersede_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let flow = seed_exam(Flow::new(), "async");

    flow.step(
        Action::new("start_first", "POST", "/api/v1/sessions/")
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "exam_id": ctx.get("exam")["id"] }))
            .with_save_as("first"),
    )
    // re-attempting an async exam replaces the earlier session
    .step(
        Action::new("start_second", "POST", "/api/v1/sessions/")
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "exam_id": ctx.get("exam")["id"] }))
            .with_save_as("second"),
    )
    .step(
        Action::new("first_gone", "GET", "dynamic")
            .with_dyn_path(|ctx| {
                format!(
                    "/api/v1/sessions/{}",
                    ctx.get("first")["id"].as_str().unwrap()
                )
            })
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_expect(StatusCode::NOT_FOUND),
    )
    .step(
        Action::new("second_alive", "GET", "dynamic")
            .with_dyn_path(|ctx| {
                format!(
                    "/api/v1/sessions/{}",
                    ctx.get("second")["id"].as_str().unwrap()
                )
            })
            .with_dyn_user(|ctx| user_id(ctx.get("student"))),
    )
    .run(&mut server, pool)
    .await;
}

#[tokio::test]
async fn session_finish_idempotent_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let flow = seed_exam(Flow::new(), "sync");

    flow.step(
        Action::new("start_session", "POST", "/api/v1/sessions/")
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "exam_id": ctx.get("exam")["id"] }))
            .with_save_as("session"),
    )
    .step(
        Action::new("finish", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/finish", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student"))),
    )
    // repeated finish is a no-op, not an error
    .step(
        Action::new("finish_again", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/finish", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .assert_body(|body| {
                let session: Value = serde_json::from_str(body).unwrap();
                assert!(!session["finished_at"].is_null());
            }),
    )
    // and only one score row was written
    .step(
        Action::new("single_history_row", "GET", "/api/v1/sessions/history")
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .assert_body(|body| {
                let rows: Vec<Value> = serde_json::from_str(body).unwrap();
                assert_eq!(rows.len(), 1);
            }),
    )
    // the completed session rejects further transitions
    .step(
        Action::new("advance_after_finish", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/advance", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "question_id": ctx.get("q1")["id"] }))
            .with_expect(StatusCode::CONFLICT),
    )
    .run(&mut server, pool)
    .await;
}

#[tokio::test]
async fn session_withdrawn_question_not_scored_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let flow = seed_exam(Flow::new(), "sync");

    flow.step(
        Action::new("start_session", "POST", "/api/v1/sessions/")
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "exam_id": ctx.get("exam")["id"] }))
            .with_save_as("session"),
    )
    .step(
        Action::new("advance_q1", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/advance", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "question_id": ctx.get("q1")["id"] }))
            .with_save_as("adv1"),
    )
    .step(
        Action::new("answer_q1", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/answer", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| {
                json!({
                    "attempt_id": ctx.get("adv1")["current_attempt"]["id"],
                    "answer_id": ctx.get("a1_right")["id"],
                })
            }),
    )
    .step(
        Action::new("advance_q2", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/advance", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "question_id": ctx.get("q2")["id"] }))
            .with_save_as("adv2"),
    )
    .step(
        Action::new("answer_q2", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/answer", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| {
                json!({
                    "attempt_id": ctx.get("adv2")["current_attempt"]["id"],
                    "answer_id": ctx.get("a2_right")["id"],
                })
            }),
    )
    // q1 is withdrawn mid-session by an instructor
    .step(
        Action::new("withdraw_q1", "DELETE", "dynamic")
            .with_dyn_path(|ctx| {
                format!("/api/v1/questions/{}", ctx.get("q1")["id"].as_str().unwrap())
            })
            .with_user(ADMIN_ID),
    )
    .step(
        Action::new("finish", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/finish", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student"))),
    )
    // only q2's points survive; the withdrawn question no longer counts
    .step(
        Action::new("score_excludes_withdrawn", "GET", "dynamic")
            .with_dyn_path(|ctx| {
                format!(
                    "/api/v1/sessions/history/exam/{}",
                    ctx.get("exam")["id"].as_str().unwrap()
                )
            })
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .assert_body(|body| {
                let entry: Value = serde_json::from_str(body).unwrap();
                assert_eq!(entry["score"], 3);
            }),
    )
    .run(&mut server, pool)
    .await;
}

#[tokio::test]
async fn session_cross_session_answer_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let flow = seed_exam(Flow::new(), "sync").step(
        create_user_action("intruder", "intruder@localhost", "student").with_save_as("intruder"),
    );

    flow.step(
        Action::new("start_victim_session", "POST", "/api/v1/sessions/")
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "exam_id": ctx.get("exam")["id"] }))
            .with_save_as("victim_session"),
    )
    .step(
        Action::new("victim_advances", "POST", "dynamic")
            .with_dyn_path(|ctx| {
                format!(
                    "/api/v1/sessions/{}/advance",
                    ctx.get("victim_session")["id"].as_str().unwrap()
                )
            })
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "question_id": ctx.get("q1")["id"] }))
            .with_save_as("victim_adv"),
    )
    .step(
        Action::new("start_intruder_session", "POST", "/api/v1/sessions/")
            .with_dyn_user(|ctx| user_id(ctx.get("intruder")))
            .with_dyn_body(|ctx| json!({ "exam_id": ctx.get("exam")["id"] }))
            .with_save_as("intruder_session"),
    )
    // answering through the wrong session is reported as a missing attempt
    .step(
        Action::new("cross_session_answer", "POST", "dynamic")
            .with_dyn_path(|ctx| {
                format!(
                    "/api/v1/sessions/{}/answer",
                    ctx.get("intruder_session")["id"].as_str().unwrap()
                )
            })
            .with_dyn_user(|ctx| user_id(ctx.get("intruder")))
            .with_dyn_body(|ctx| {
                json!({
                    "attempt_id": ctx.get("victim_adv")["current_attempt"]["id"],
                    "answer_id": ctx.get("a1_right")["id"],
                })
            })
            .with_expect(StatusCode::NOT_FOUND),
    )
    // nor may a student touch someone else's session at all
    .step(
        Action::new("foreign_session_forbidden", "POST", "dynamic")
            .with_dyn_path(|ctx| {
                format!(
                    "/api/v1/sessions/{}/advance",
                    ctx.get("victim_session")["id"].as_str().unwrap()
                )
            })
            .with_dyn_user(|ctx| user_id(ctx.get("intruder")))
            .with_dyn_body(|ctx| json!({ "question_id": ctx.get("q1")["id"] }))
            .with_expect(StatusCode::FORBIDDEN),
    )
    .run(&mut server, pool)
    .await;
}

#[tokio::test]
async fn session_revisit_preserves_attempt_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    let flow = seed_exam(Flow::new(), "sync");

    flow.step(
        Action::new("start_session", "POST", "/api/v1/sessions/")
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "exam_id": ctx.get("exam")["id"] }))
            .with_save_as("session"),
    )
    .step(
        Action::new("advance_q1", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/advance", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "question_id": ctx.get("q1")["id"] })),
    )
    .step(
        Action::new("advance_q2", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/advance", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "question_id": ctx.get("q2")["id"] })),
    )
    // revisiting q1 reuses the attempt row instead of creating a new one
    .step(
        Action::new("revisit_q1", "POST", "dynamic")
            .with_dyn_path(|ctx| format!("/api/v1/sessions/{}/advance", ctx.get("session")["id"].as_str().unwrap()))
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .with_dyn_body(|ctx| json!({ "question_id": ctx.get("q1")["id"] })),
    )
    .step(
        Action::new("progress_has_two_attempts", "GET", "dynamic")
            .with_dyn_path(|ctx| {
                format!(
                    "/api/v1/sessions/{}/progress",
                    ctx.get("session")["id"].as_str().unwrap()
                )
            })
            .with_dyn_user(|ctx| user_id(ctx.get("student")))
            .assert_body(|body| {
                let progress: Value = serde_json::from_str(body).unwrap();
                let attempts = progress["attempts"].as_array().unwrap();
                assert_eq!(attempts.len(), 2);
            }),
    )
    .run(&mut server, pool)
    .await;
}
