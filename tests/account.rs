mod common;

use aula::model::entity::User;
use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    ADMIN_ID, Action, Flow, create_user_action, setup_server, setup_test_db,
};

#[tokio::test]
async fn route_user_create_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            create_user_action("foobar", "foobar@localhost", "student")
                .assert_body(|body| {
                    let ent: User = serde_json::from_str(body).expect("Invalid body format");
                    assert_eq!(ent.name(), "foobar");
                    assert_eq!(ent.email(), "foobar@localhost");
                })
                .with_expect(StatusCode::OK),
        )
        // the email is taken now
        .step(
            create_user_action("foobar2", "foobar@localhost", "student")
                .with_expect(StatusCode::UNPROCESSABLE_ENTITY)
                .assert_body(|body| assert!(body.contains("error"))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_user_list_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(create_user_action("FOOBAR", "foobar@localhost", "student").with_save_as("foobar"))
        // try to request without admin perms
        .step(
            Action::new("user_list", "GET", "/api/v1/account/page")
                .with_dyn_user(|ctx| ctx.get_json::<User>("foobar").id())
                .with_param("limit", "5")
                .with_param("offset", "0")
                .with_expect(StatusCode::FORBIDDEN)
                .assert_body(|body| assert!(body.contains("error"))),
        )
        .step(
            Action::new("user_list", "GET", "/api/v1/account/page")
                .with_user(ADMIN_ID)
                .with_param("limit", "5")
                .with_param("offset", "0")
                .assert_body(|body| {
                    assert!(body.contains("total"));
                    assert!(body.contains("items"));
                })
                .with_expect(StatusCode::OK),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_user_update_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(create_user_action("FOOBAR", "foobar@localhost", "student").with_save_as("foobar"))
        .step(create_user_action("FOOBAR2", "foobar2@localhost", "student").with_save_as("foobar2"))
        // a student may not touch another account
        .step(
            Action::new("user_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/account/{}", ctx.get_json::<User>("foobar").id())
                })
                .with_dyn_user(|ctx| ctx.get_json::<User>("foobar2").id())
                .with_body(json!({ "name": "should fail" }))
                .with_expect(StatusCode::FORBIDDEN)
                .assert_body(|body| assert!(body.contains("error"))),
        )
        // updating self works; omitted fields keep their value
        .step(
            Action::new("user_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/account/{}", ctx.get_json::<User>("foobar2").id())
                })
                .with_dyn_user(|ctx| ctx.get_json::<User>("foobar2").id())
                .with_expect(StatusCode::OK)
                .with_body(json!({ "name": "FOOBAR3" }))
                .assert_body(|body| {
                    let ent: User = serde_json::from_str(body).expect("Invalid body format");
                    assert_eq!(ent.name(), "FOOBAR3");
                    assert_eq!(ent.email(), "foobar2@localhost");
                }),
        )
        // admin can update anyone
        .step(
            Action::new("user_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/account/{}", ctx.get_json::<User>("foobar").id())
                })
                .with_user(ADMIN_ID)
                .with_body(json!({ "name": "FOOBAR4" }))
                .with_expect(StatusCode::OK)
                .assert_body(|body| assert!(body.contains("FOOBAR4"))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_user_delete_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(create_user_action("FOOBAR", "foobar@localhost", "student").with_save_as("foobar"))
        .step(create_user_action("FOOBAZ", "foobaz@localhost", "student").with_save_as("foobaz"))
        // we can't allow everybody to delete anybody ;D
        .step(
            Action::new("user_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/account/{}", ctx.get_json::<User>("foobar").id())
                })
                .with_dyn_user(|ctx| ctx.get_json::<User>("foobaz").id())
                .with_expect(StatusCode::FORBIDDEN)
                .assert_body(|body| assert!(body.contains("error"))),
        )
        // self deletion is allowed
        .step(
            Action::new("user_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/account/{}", ctx.get_json::<User>("foobaz").id())
                })
                .with_dyn_user(|ctx| ctx.get_json::<User>("foobaz").id())
                .with_expect(StatusCode::OK),
        )
        // even admin cannot delete the user which doesn't exist :)
        .step(
            Action::new("user_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/account/{}", ctx.get_json::<User>("foobaz").id())
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::NOT_FOUND),
        )
        // admin can delete every user he wants
        .step(
            Action::new("user_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/account/{}", ctx.get_json::<User>("foobar").id())
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::OK),
        )
        // and purge the soft-deleted row for good
        .step(
            Action::new("user_purge", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/account/{}/purge", ctx.get_json::<User>("foobar").id())
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("user_purge_again", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    format!("/api/v1/account/{}/purge", ctx.get_json::<User>("foobar").id())
                })
                .with_user(ADMIN_ID)
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_anonymous_request_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        // no X-User-Id header at all
        .step(
            Action::new("anonymous_get", "GET", "/api/v1/account/1")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        // a header pointing at nobody
        .step(
            Action::new("unknown_user", "GET", "/api/v1/account/1")
                .with_user(9999)
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, pool)
        .await;
}
