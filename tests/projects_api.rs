#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::json;

use projexia::models::{ChatMessage, Comment};
use projexia::store::Store;

fn ids(list: &serde_json::Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|p| p["_id"].as_str().unwrap().to_string())
        .collect()
}

#[actix_web::test]
async fn create_project_validates_input() {
    let state = common::memory_state();
    let app = test_app!(state);

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/api/projects")
            .set_json(json!({"name": "Launch", "description": "Q1", "color": "#fff"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "creatorId is required");

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/api/projects")
            .set_json(json!({"name": "Launch", "color": "#fff", "creatorId": "u1"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "name, description, and color are required");
}

#[actix_web::test]
async fn create_project_persists_members_and_links_them() {
    let state = common::memory_state();
    let app = test_app!(state);

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri("/api/projects?userId=u1")
            .set_json(json!({
                "name": "Launch",
                "description": "Q1 launch",
                "color": "#6366f1",
                "members": [
                    {"name": "Bo", "email": "bo@example.com", "role": "admin"},
                    {"name": "Cy", "email": "cy@example.com"}
                ]
            }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["creatorId"], "u1");
    assert_eq!(body["tasks"], json!([]));
    let member_ids: Vec<String> = body["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|id| id.as_str().unwrap().to_string())
        .collect();
    assert_eq!(member_ids.len(), 2);

    let (status, project) = call!(
        app,
        test::TestRequest::get().uri(&format!("/api/projects/{}", body["_id"].as_str().unwrap()))
    );
    assert_eq!(status, StatusCode::OK);
    let members = project["members"].as_array().unwrap();
    assert_eq!(members[0]["email"], "bo@example.com");
    assert_eq!(members[0]["role"], "admin");
    assert_eq!(members[1]["role"], "member");
    assert_eq!(members[1]["projectId"], body["_id"]);
    assert!(members[1]["avatarUrl"].as_str().unwrap().contains("dicebear"));
    assert_eq!(ids(&project["members"]), member_ids);
}

#[actix_web::test]
async fn unknown_project_is_not_found() {
    let state = common::memory_state();
    let app = test_app!(state);
    for uri in ["/api/projects/ffffffffffffffffffffffff", "/api/projects/not-an-id"] {
        let (status, body) = call!(app, test::TestRequest::get().uri(uri));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Project not found");
    }
}

#[actix_web::test]
async fn list_projects_by_creator_or_membership() {
    let state = common::memory_state();
    let app = test_app!(state);
    let mine = common::seed_project(&state, "Mine", "u1").await;
    let mut shared = common::seed_project(&state, "Shared", "u2").await;
    common::seed_member(&state, &mut shared, "Ada", "ada@example.com").await;
    let other = common::seed_project(&state, "Other", "u3").await;

    let (_, all) = call!(app, test::TestRequest::get().uri("/api/projects"));
    assert_eq!(ids(&all), vec![mine.id.clone(), shared.id.clone(), other.id.clone()]);

    let (_, by_creator) = call!(app, test::TestRequest::get().uri("/api/projects?userId=u1"));
    assert_eq!(ids(&by_creator), vec![mine.id.clone()]);

    let (_, both) = call!(
        app,
        test::TestRequest::get().uri("/api/projects?userId=u1&email=ada%40example.com")
    );
    assert_eq!(ids(&both), vec![mine.id.clone(), shared.id.clone()]);
    assert_eq!(both[1]["members"][0]["name"], "Ada");

    let (status, nothing) = call!(
        app,
        test::TestRequest::get().uri("/api/projects?email=nobody%40example.com")
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(nothing, json!([]));
}

#[actix_web::test]
async fn populated_project_follows_id_order_and_skips_dangling_ids() {
    let state = common::memory_state();
    let app = test_app!(state);
    let project = common::seed_project(&state, "P", "u1").await;

    let first = common::sample_task(&project.id, "first", "u1");
    let second = common::sample_task(&project.id, "second", "u1");
    state.store.insert_task(&first).await.unwrap();
    state.store.insert_task(&second).await.unwrap();
    let now = chrono::Utc::now();
    for id in [second.id.as_str(), "ffffffffffffffffffffffff", first.id.as_str()] {
        state.store.push_project_task(&project.id, id, now).await.unwrap();
    }

    let (_, body) = call!(app, test::TestRequest::get().uri(&format!("/api/projects/{}", project.id)));
    let titles: Vec<&str> = body["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["second", "first"]);
}

#[actix_web::test]
async fn update_project_is_partial_and_refreshes_timestamp() {
    let state = common::memory_state();
    let app = test_app!(state);
    let project = common::seed_project(&state, "Launch", "u1").await;

    let (status, body) = call!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/projects/{}", project.id))
            .set_json(json!({"name": "Relaunch", "description": ""}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Relaunch");
    assert_eq!(body["description"], "Launch description");

    let stored = state.store.find_project(&project.id).await.unwrap().unwrap();
    assert!(stored.updated_at > project.updated_at);

    let (status, _) = call!(
        app,
        test::TestRequest::put()
            .uri("/api/projects/ffffffffffffffffffffffff")
            .set_json(json!({"name": "x"}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn only_the_creator_may_delete() {
    let state = common::memory_state();
    let app = test_app!(state);
    let project = common::seed_project(&state, "Launch", "u1").await;

    for uri in [
        format!("/api/projects/{}?userId=u2", project.id),
        format!("/api/projects/{}", project.id),
    ] {
        let (status, body) = call!(app, test::TestRequest::delete().uri(&uri));
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Only the admin can delete this project.");
    }
    assert!(state.store.find_project(&project.id).await.unwrap().is_some());

    let (status, _) = call!(
        app,
        test::TestRequest::delete().uri("/api/projects/ffffffffffffffffffffffff?userId=u1")
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn deleting_a_project_cascades() {
    let state = common::memory_state();
    let app = test_app!(state);
    let mut project = common::seed_project(&state, "Launch", "u1").await;
    let member = common::seed_member(&state, &mut project, "Ada", "ada@example.com").await;
    let keep = common::seed_project(&state, "Keep", "u1").await;

    let mut task = common::sample_task(&project.id, "t", "u1");
    let comment = Comment::new(&task.id, "hello".into(), "u1".into());
    task.comments.push(comment.id.clone());
    state.store.insert_task(&task).await.unwrap();
    state.store.insert_comment(&comment).await.unwrap();
    let kept_task = common::sample_task(&keep.id, "kept", "u1");
    state.store.insert_task(&kept_task).await.unwrap();
    state
        .store
        .insert_chat_message(&ChatMessage::new(&project.id, "u1".into(), "Ada".into(), "hi".into()))
        .await
        .unwrap();

    let (status, body) = call!(
        app,
        test::TestRequest::delete().uri(&format!("/api/projects/{}?userId=u1", project.id))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Project deleted successfully"}));

    let (_, tasks) = call!(app, test::TestRequest::get().uri(&format!("/api/tasks/project/{}", project.id)));
    assert_eq!(tasks, json!([]));
    assert!(state.store.find_project(&project.id).await.unwrap().is_none());
    assert!(state.store.find_member(&member.id).await.unwrap().is_none());
    assert!(state.store.find_comment(&comment.id).await.unwrap().is_none());
    // Chat history is append-only and survives the project.
    assert_eq!(state.store.list_chat_messages(&project.id).await.unwrap().len(), 1);
    assert!(state.store.find_task(&kept_task.id).await.unwrap().is_some());
}

#[actix_web::test]
async fn inviting_the_same_email_twice_is_rejected() {
    let state = common::memory_state();
    let app = test_app!(state);
    let project = common::seed_project(&state, "Launch", "u1").await;
    common::seed_user(&state, "Ada Lovelace", "ada@example.com").await;
    let uri = format!("/api/projects/{}/invite", project.id);

    let (status, member) = call!(
        app,
        test::TestRequest::post().uri(&uri).set_json(json!({"email": "ada@example.com"}))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["name"], "Ada Lovelace");
    assert_eq!(member["role"], "member");
    assert_eq!(member["projectId"], project.id.as_str());

    let (status, body) = call!(
        app,
        test::TestRequest::post().uri(&uri).set_json(json!({"email": "ada@example.com"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Member already invited to this project");

    let stored = state.store.find_project(&project.id).await.unwrap().unwrap();
    assert_eq!(stored.members, vec![member["_id"].as_str().unwrap().to_string()]);
}

#[actix_web::test]
async fn invite_without_account_uses_email_as_name() {
    let state = common::memory_state();
    let app = test_app!(state);
    let project = common::seed_project(&state, "Launch", "u1").await;

    let (status, member) = call!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/projects/{}/invite", project.id))
            .set_json(json!({"email": "new@example.com"}))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["name"], "new@example.com");
    assert!(member["avatarUrl"].as_str().unwrap().contains("seed=new%40example.com"));

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri(&format!("/api/projects/{}/invite", project.id))
            .set_json(json!({}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email is required");

    let (status, _) = call!(
        app,
        test::TestRequest::post()
            .uri("/api/projects/ffffffffffffffffffffffff/invite")
            .set_json(json!({"email": "new@example.com"}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn removing_a_member_unlinks_and_deletes_it() {
    let state = common::memory_state();
    let app = test_app!(state);
    let mut project = common::seed_project(&state, "Launch", "u1").await;
    let member = common::seed_member(&state, &mut project, "Ada", "ada@example.com").await;

    let (status, body) = call!(
        app,
        test::TestRequest::delete().uri(&format!("/api/projects/{}/members/{}", project.id, member.id))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Member removed from project");
    assert!(state.store.find_project(&project.id).await.unwrap().unwrap().members.is_empty());
    assert!(state.store.find_member(&member.id).await.unwrap().is_none());
}

#[actix_web::test]
async fn member_role_update_is_scoped_to_the_project() {
    let state = common::memory_state();
    let app = test_app!(state);
    let mut project = common::seed_project(&state, "Launch", "u1").await;
    let other = common::seed_project(&state, "Other", "u1").await;
    let member = common::seed_member(&state, &mut project, "Ada", "ada@example.com").await;

    let (status, body) = call!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/projects/{}/members/{}", project.id, member.id))
            .set_json(json!({"role": "viewer"}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "viewer");

    let (status, body) = call!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/projects/{}/members/{}", other.id, member.id))
            .set_json(json!({"role": "admin"}))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Member not found");

    let (status, body) = call!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/projects/{}/members/{}", project.id, member.id))
            .set_json(json!({}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Role is required");
}

#[actix_web::test]
async fn chat_messages_come_back_in_posting_order() {
    let state = common::memory_state();
    let app = test_app!(state);
    let project = common::seed_project(&state, "Launch", "u1").await;
    let uri = format!("/api/projects/{}/chat", project.id);

    for text in ["first", "second", "third"] {
        let (status, message) = call!(
            app,
            test::TestRequest::post()
                .uri(&uri)
                .set_json(json!({"userId": "u1", "userName": "Ada", "content": text}))
        );
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(message["content"], text);
    }

    let (status, messages) = call!(app, test::TestRequest::get().uri(&uri));
    assert_eq!(status, StatusCode::OK);
    let contents: Vec<&str> = messages
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["first", "second", "third"]);

    let (status, body) = call!(
        app,
        test::TestRequest::post()
            .uri(&uri)
            .set_json(json!({"userId": "u1", "content": "no name"}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "userId, userName, and content are required");
}
