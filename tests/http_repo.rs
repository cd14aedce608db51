use bbs_client::{
    models::{NewComment, NewPost, NewReply, UpdatePost},
    repo::{http::HttpRepo, CommentRepo, PostRepo, ReplyRepo, RepoError},
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn list_posts_sends_limit_and_offset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(query_param("limit", "5"))
        .and(query_param("offset", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [{"id": 11, "title": "t", "content": "c", "author": "user"}],
            "total": 11
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repo = HttpRepo::new(&server.uri());
    let page = repo.list_posts(5, 10).await.unwrap();
    assert_eq!(page.total, 11);
    assert_eq!(page.posts[0].id, 11);
}

#[tokio::test]
async fn bare_array_listing_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "a", "content": "b", "author": "admin"}
        ])))
        .mount(&server)
        .await;

    let page = HttpRepo::new(&server.uri()).list_posts(5, 0).await.unwrap();
    assert_eq!(page.posts.len(), 1);
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn create_post_sends_author() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(body_json(json!({"title": "Hi", "content": "Body", "author": "user"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "title": "Hi", "content": "Body", "author": "user"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repo = HttpRepo::new(&server.uri());
    let post = repo
        .create_post(NewPost { title: "Hi".into(), content: "Body".into(), author: "user".into() })
        .await
        .unwrap();
    assert_eq!(post.id, 7);
}

#[tokio::test]
async fn update_post_omits_author() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/posts/3"))
        .and(body_json(json!({"title": "New", "content": "Text"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let repo = HttpRepo::new(&server.uri());
    repo.update_post(3, UpdatePost { title: "New".into(), content: "Text".into() }).await.unwrap();
}

#[tokio::test]
async fn comment_and_reply_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/2/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "content": "first", "author": "user",
             "replies": [{"id": 1, "text": "legacy field", "author": "admin"}]},
            {"id": 2, "content": "second", "author": "admin"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/posts/2/comments"))
        .and(body_json(json!({"content": "hello", "author": "user"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/posts/2/comments/1/replies"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/posts/2/comments/1/replies/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let repo = HttpRepo::new(&server.uri());
    let comments = repo.list_comments(2).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].replies[0].content, "legacy field");
    assert!(comments[1].replies.is_empty());

    repo.create_comment(2, NewComment { content: "hello".into(), author: "user".into() }).await.unwrap();
    repo.create_reply(2, 1, NewReply { content: "re".into(), author: "user".into() }).await.unwrap();
    repo.delete_reply(2, 1, 1).await.unwrap();
}

#[tokio::test]
async fn not_found_and_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/posts/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Post not found"})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/posts/1/comments/5"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"detail": "bad comment id"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let repo = HttpRepo::new(&server.uri());
    assert!(matches!(repo.delete_post(99).await, Err(RepoError::NotFound)));
    match repo.delete_comment(1, 5).await {
        Err(RepoError::Server { status, detail }) => {
            assert_eq!(status, 422);
            assert_eq!(detail, "bad comment id");
        }
        other => panic!("expected server error, got {other:?}"),
    }
    match repo.list_posts(5, 0).await {
        Err(RepoError::Server { status: 500, detail }) => assert_eq!(detail, "Internal Server Error"),
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/1/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let err = HttpRepo::new(&server.uri()).list_comments(1).await.unwrap_err();
    assert!(matches!(err, RepoError::Decode(_)));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    // nothing listens on port 9 locally
    let err = HttpRepo::new("http://127.0.0.1:9").list_posts(5, 0).await.unwrap_err();
    assert!(matches!(err, RepoError::Network(_)));
}
