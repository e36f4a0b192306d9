//! HTTP-level tests for GitLabClient against a local mock server

use gitlab_client::{
    Auth, DeleteProjectOptions, GitLabClient, GitLabClientTrait, GitLabError, ProjectOptions,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, auth: Auth) -> GitLabClient {
    GitLabClient::new(&server.uri(), auth, false).unwrap()
}

#[tokio::test]
async fn test_private_token_header_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/7"))
        .and(header("PRIVATE-TOKEN", "glpat-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "name": "platform",
            "path": "platform",
            "full_path": "platform"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let group = client(&server, Auth::PrivateToken("glpat-test".to_string()))
        .get_group(7)
        .await
        .unwrap();
    assert_eq!(group.id, 7);
    assert_eq!(group.full_path.as_deref(), Some("platform"));
}

#[tokio::test]
async fn test_404_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/99"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "404 Project Not Found"})),
        )
        .mount(&server)
        .await;

    let err = client(&server, Auth::PrivateToken("t".to_string()))
        .get_project(99)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("404 Project Not Found"));
}

#[tokio::test]
async fn test_error_status_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/runners/3"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Retry later"))
        .mount(&server)
        .await;

    let err = client(&server, Auth::PrivateToken("t".to_string()))
        .get_runner(3)
        .await
        .unwrap_err();
    match err {
        GitLabError::Api { status, message } => {
            assert_eq!(status, 429);
            assert!(message.contains("Retry later"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_update_sends_only_set_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v4/projects/5"))
        .and(body_json(json!({"description": "new", "wiki_enabled": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "name": "web",
            "description": "new",
            "wiki_enabled": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = ProjectOptions {
        description: Some("new".to_string()),
        wiki_enabled: Some(false),
        ..Default::default()
    };
    let project = client(&server, Auth::PrivateToken("t".to_string()))
        .update_project(5, &options)
        .await
        .unwrap();
    assert_eq!(project.description.as_deref(), Some("new"));
}

#[tokio::test]
async fn test_permanent_project_delete_query() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v4/projects/5"))
        .and(query_param("permanently_remove", "true"))
        .and(query_param("full_path", "acme/web"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"message": "202 Accepted"})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server, Auth::PrivateToken("t".to_string()))
        .delete_project(5, &DeleteProjectOptions::permanent("acme/web"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_variable_lookup_filters_by_scope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/5/variables/DB_URL"))
        .and(query_param("filter[environment_scope]", "production"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "key": "DB_URL",
            "value": "postgres://prod",
            "environment_scope": "production"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let variable = client(&server, Auth::JobToken("t".to_string()))
        .get_project_variable(5, "DB_URL", Some("production"))
        .await
        .unwrap();
    assert_eq!(variable.value, "postgres://prod");
}

#[tokio::test]
async fn test_file_path_is_encoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/5/repository/files/ci%2Fapp.yaml"))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file_name": "app.yaml",
            "file_path": "ci/app.yaml",
            "encoding": "base64",
            "content": "a2luZDogdGVzdAo=",
            "ref": "main"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = client(&server, Auth::PrivateToken("t".to_string()))
        .get_file(5, "ci/app.yaml", "main")
        .await
        .unwrap();
    assert_eq!(file.file_path, "ci/app.yaml");
}

#[tokio::test]
async fn test_basic_auth_uses_password_grant_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "oauth-abc",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/user"))
        .and(header("Authorization", "Bearer oauth-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "username": "admin"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(
        &server,
        Auth::Basic {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
        },
    );
    assert_eq!(client.current_user().await.unwrap().username, "admin");
    assert_eq!(client.current_user().await.unwrap().id, 1);
}

#[tokio::test]
async fn test_failed_password_grant_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let err = client(
        &server,
        Auth::Basic {
            username: "admin".to_string(),
            password: "wrong".to_string(),
        },
    )
    .current_user()
    .await
    .unwrap_err();
    assert!(matches!(err, GitLabError::Authentication(_)));
}
