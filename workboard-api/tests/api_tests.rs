//! HTTP tests for the Workboard API
//!
//! These drive the real router end to end (extractors, bearer middleware,
//! services, error envelope) against the in-memory store.

mod common;

use axum::http::{header, Method, Request, StatusCode};
use common::{error_code, TestContext};
use serde_json::{json, Value};
use tower::ServiceExt;

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new();

    for uri in ["/health", "/api/v1/health"] {
        let (status, body) = ctx.request(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx.request(Method::GET, "/api/v1/user/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(error_code(&body), "UNAUTHORIZED");

    let (status, _) = ctx
        .request(Method::GET, "/api/v1/organizations", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A refresh token is not an access token
    let user = ctx.user("alice@example.com").await;
    let (refresh, _) = ctx
        .config
        .jwt
        .issue(user.id(), workboard_shared::auth::jwt::TokenType::Refresh)
        .unwrap();
    let (status, _) = ctx
        .request(Method::GET, "/api/v1/user/me", Some(&refresh), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_login_refresh_flow() {
    let ctx = TestContext::new();
    let credentials = json!({ "email": "new@example.com", "password": "secret1", "name": "New" });

    let (status, tokens) = ctx
        .request(Method::POST, "/api/v1/auth/signup", None, Some(credentials.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let access = tokens["accessToken"].as_str().unwrap().to_string();
    assert!(tokens["refreshToken"].is_string());

    let (status, body) = ctx
        .request(Method::POST, "/api/v1/auth/signup", None, Some(credentials))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "USER_ALREADY_EXISTS");

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "new@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "INVALID_CREDENTIALS");

    let (status, login) = ctx
        .request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "new@example.com", "password": "secret1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, rotated) = ctx
        .request(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refreshToken": login["refreshToken"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refreshToken"], login["refreshToken"]);

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refreshToken": login["refreshToken"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "INVALID_TOKEN");

    let (status, me) = ctx
        .request(Method::GET, "/api/v1/user/me", Some(&access), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["success"], true);
    assert_eq!(me["data"]["email"], "new@example.com");
    assert!(me["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_request_validation() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({ "email": "not-an-email", "password": "123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);

    let (status, body) = ctx
        .request(Method::POST, "/api/v1/auth/login", None, Some(json!({ "email": 5 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let user = ctx.user("alice@example.com").await;

    let (status, body) = ctx.get("/api/v1/projects/abc", &user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");

    let (status, body) = ctx
        .post("/api/v1/organizations/accept-invite", &user, json!({ "token": "abc" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "token");

    let (status, body) = ctx.get("/api/v1/tasks?projectId=1&status=BLOCKED", &user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_profile_update() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice@example.com").await;
    ctx.user("bob@example.com").await;

    let (status, body) = ctx
        .patch("/api/v1/user/me", &alice, json!({ "name": "Alice" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Alice");

    let (status, body) = ctx
        .patch("/api/v1/user/me", &alice, json!({ "email": "bob@example.com" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "USER_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_organization_and_invitation_flow() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;
    let guest = ctx.user("guest@example.com").await;

    let org = ctx.organization(&owner, "My Org").await;
    assert_eq!(org["slug"], "my-org");
    let again = ctx.organization(&owner, "My Org").await;
    assert_eq!(again["slug"], "my-org-1");

    let (status, listed) = ctx.get("/api/v1/organizations", &owner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let (status, invitation) = ctx
        .post(
            "/api/v1/organizations/my-org/invite",
            &owner,
            json!({ "email": "guest@example.com", "role": "MEMBER" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(invitation["status"], "PENDING");
    assert_eq!(invitation["token"].as_str().unwrap().len(), 64);

    // A member cannot invite
    let (status, body) = ctx
        .post(
            "/api/v1/organizations/my-org/invite",
            &guest,
            json!({ "email": "x@example.com", "role": "MEMBER" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "ACCESS_DENIED");

    let (status, accepted) = ctx
        .post(
            "/api/v1/organizations/accept-invite",
            &guest,
            json!({ "token": invitation["token"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "ACCEPTED");

    let (status, body) = ctx
        .post(
            "/api/v1/organizations/accept-invite",
            &guest,
            json!({ "token": invitation["token"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "INVITATION_ALREADY_USED");

    let (status, body) = ctx
        .post(
            "/api/v1/organizations/my-org/invite",
            &guest,
            json!({ "email": "x@example.com", "role": "MEMBER" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");

    let (status, body) = ctx
        .post(
            "/api/v1/organizations/accept-invite",
            &guest,
            json!({ "token": "f".repeat(64) }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "INVITATION_NOT_FOUND");
}

#[tokio::test]
async fn test_project_crud_and_pagination() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;
    let member = ctx.user("member@example.com").await;
    let outsider = ctx.user("outsider@example.com").await;
    let org = ctx.organization(&owner, "Acme").await;
    let org_id = org["id"].as_i64().unwrap();
    ctx.join(&owner, "acme", &member, "MEMBER").await;

    let (status, created) = ctx
        .post(
            "/api/v1/projects",
            &member,
            json!({
                "name": "Launch",
                "organizationId": org_id,
                "tasks": [{ "title": "Plan" }, { "title": "Ship" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["organizationId"], org_id);
    assert_eq!(created["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(created["tasks"][0]["status"], "TODO");
    let project_id = created["id"].as_i64().unwrap();

    for name in ["Second", "Third"] {
        let (status, _) = ctx
            .post("/api/v1/projects", &owner, json!({ "name": name, "organizationId": org_id }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let list_uri = format!("/api/v1/projects/organization/{}", org_id);
    let (status, page) = ctx.get(&format!("{}?take=2", list_uri), &member).await;
    assert_eq!(status, StatusCode::OK);
    let first_ids = ids(&page["data"]);
    assert_eq!(first_ids.len(), 2);
    assert_eq!(first_ids[0], project_id);
    let cursor = page["nextCursor"].as_i64().unwrap();

    let (_, page) = ctx
        .get(&format!("{}?take=2&cursor={}", list_uri, cursor), &member)
        .await;
    assert_eq!(ids(&page["data"]), vec![cursor]);
    assert!(page["nextCursor"].is_null());

    let (status, _) = ctx.get(&format!("{}?take=0", list_uri), &member).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx.get(&list_uri, &outsider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "ACCESS_DENIED");

    let project_uri = format!("/api/v1/projects/{}", project_id);
    let (status, body) = ctx
        .put(&project_uri, &member, json!({ "name": "Renamed" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");

    let (status, body) = ctx
        .put(&project_uri, &owner, json!({ "name": "Renamed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");

    let (status, body) = ctx.delete(&project_uri, &owner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Project deleted");

    let (status, body) = ctx.get(&project_uri, &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "PROJECT_NOT_FOUND");
}

#[tokio::test]
async fn test_task_lifecycle() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;
    let member = ctx.user("member@example.com").await;
    let outsider = ctx.user("outsider@example.com").await;
    let org = ctx.organization(&owner, "Acme").await;
    ctx.join(&owner, "acme", &member, "MEMBER").await;

    let (_, project) = ctx
        .post("/api/v1/projects", &owner, json!({ "name": "Board", "organizationId": org["id"] }))
        .await;
    let project_id = project["id"].as_i64().unwrap();

    let (status, task) = ctx
        .post(
            "/api/v1/tasks",
            &member,
            json!({ "projectId": project_id, "title": "Write docs" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_uri = format!("/api/v1/tasks/{}", task["id"]);
    let status_uri = format!("{}/status", task_uri);

    let (status, body) = ctx.patch(&status_uri, &member, json!({ "status": "DONE" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_STATUS_TRANSITION");
    assert_eq!(body["error"]["message"], "Invalid status transition from TODO to DONE");

    for next in ["IN_PROGRESS", "DONE", "IN_PROGRESS"] {
        let (status, body) = ctx.patch(&status_uri, &member, json!({ "status": next })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], next);
    }

    let (status, body) = ctx
        .patch(&task_uri, &member, json!({ "assigneeId": outsider.id() }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "INVALID_ASSIGNEE");

    let (status, body) = ctx
        .patch(&task_uri, &member, json!({ "assigneeId": member.id() }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assigneeId"], member.id());

    let (status, listed) = ctx
        .get(
            &format!("/api/v1/tasks?projectId={}&status=IN_PROGRESS&order=asc", project_id),
            &member,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, body) = ctx.get(&task_uri, &outsider).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "ACCESS_DENIED");

    let (status, body) = ctx.delete(&task_uri, &member).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");

    let (status, body) = ctx.delete(&task_uri, &owner).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted");

    let (status, body) = ctx.get(&task_uri, &owner).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "TASK_NOT_FOUND");
}

#[tokio::test]
async fn test_comments_and_tags() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;
    let author = ctx.user("author@example.com").await;
    let other = ctx.user("other@example.com").await;
    let org = ctx.organization(&owner, "Acme").await;
    let org_id = org["id"].as_i64().unwrap();
    ctx.join(&owner, "acme", &author, "MEMBER").await;
    ctx.join(&owner, "acme", &other, "MEMBER").await;

    let (_, project) = ctx
        .post(
            "/api/v1/projects",
            &owner,
            json!({ "name": "Board", "organizationId": org_id, "tasks": [{ "title": "t" }] }),
        )
        .await;
    let task_id = project["tasks"][0]["id"].as_i64().unwrap();

    let (status, comment) = ctx
        .post("/api/v1/comments", &author, json!({ "taskId": task_id, "content": "Looks good" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["authorId"], author.id());
    let comment_uri = format!("/api/v1/comments/{}", comment["id"]);

    let (status, body) = ctx.delete(&comment_uri, &other).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");

    let (status, body) = ctx.delete(&comment_uri, &author).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Comment deleted");

    let (status, tag) = ctx
        .post("/api/v1/tags", &author, json!({ "organizationId": org_id, "name": "bug" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, tags) = ctx
        .get(&format!("/api/v1/tags?organizationId={}", org_id), &other)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags[0]["name"], "bug");

    let link = json!({ "taskId": task_id, "tagId": tag["id"] });

    let (status, attached) = ctx.post("/api/v1/tags/attach", &author, link.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(attached["taskId"], task_id);

    let (status, body) = ctx.post("/api/v1/tags/attach", &author, link.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "CONFLICT");

    let (status, body) = ctx.post("/api/v1/tags/detach", &author, link.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tag detached");

    let (status, body) = ctx.post("/api/v1/tags/detach", &author, link).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "TAG_NOT_ATTACHED");
}

#[tokio::test]
async fn test_audit_listing() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner@example.com").await;
    let outsider = ctx.user("outsider@example.com").await;
    let org = ctx.organization(&owner, "Acme").await;
    let org_id = org["id"].as_i64().unwrap();

    ctx.post("/api/v1/projects", &owner, json!({ "name": "Audited", "organizationId": org_id }))
        .await;

    let (status, logs) = ctx
        .get(&format!("/api/v1/audit?organizationId={}", org_id), &owner)
        .await;
    assert_eq!(status, StatusCode::OK);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["entityType"], "PROJECT");
    assert_eq!(logs[0]["action"], "CREATED");
    assert_eq!(logs[1]["entityType"], "ORGANIZATION");

    let (status, filtered) = ctx
        .get(
            &format!("/api/v1/audit?organizationId={}&entityType=ORGANIZATION", org_id),
            &owner,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered.as_array().unwrap().len(), 1);

    let (status, body) = ctx
        .get(&format!("/api/v1/audit?organizationId={}", org_id), &outsider)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "ACCESS_DENIED");

    // Only the outsider's own signup row, nothing from Acme
    let (status, own) = ctx.get("/api/v1/audit", &outsider).await;
    assert_eq!(status, StatusCode::OK);
    let own = own.as_array().unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["entityType"], "USER");
    assert_eq!(own[0]["action"], "CREATED");
    assert_eq!(own[0]["userId"], outsider.id());
    assert!(own[0]["organizationId"].is_null());
}

#[tokio::test]
async fn test_unknown_route_and_headers() {
    let ctx = TestContext::new();

    let (status, body) = ctx.request(Method::GET, "/api/v1/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
}
