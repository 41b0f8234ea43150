//! In-process JSONPlaceholder stand-in for tests.
//!
//! Serves the same shapes and counts as the public service: 10 users,
//! 100 posts (10 per user), 5 comments per post, 20 todos and 10 albums per
//! user, 50 photos per album. Writes are echoed, never stored.

#![allow(clippy::expect_used)]

use super::models::{Address, Album, Comment, Company, Geo, NewPost, Photo, Post, PostPatch, Todo, User};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct Filter {
    #[serde(rename = "userId")]
    user_id: Option<u64>,
    #[serde(rename = "postId")]
    post_id: Option<u64>,
}

fn post(id: u64) -> Post {
    Post {
        user_id: (id - 1) / 10 + 1,
        id,
        title: format!("post {id}"),
        body: format!("body of post {id}"),
    }
}

fn comments(post_id: u64) -> Vec<Comment> {
    (1..=5)
        .map(|n| Comment {
            post_id,
            id: (post_id - 1) * 5 + n,
            name: format!("comment {n}"),
            email: format!("reader{n}@example.test"),
            body: "nice post".to_string(),
        })
        .collect()
}

fn user(id: u64) -> User {
    let (name, username) = if id == 1 {
        ("Leanne Graham".to_string(), "Bret".to_string())
    } else {
        (format!("User {id}"), format!("user{id}"))
    };
    User {
        id,
        name,
        username,
        email: format!("user{id}@example.test"),
        address: Address {
            street: "Kulas Light".into(),
            suite: "Apt. 556".into(),
            city: "Gwenborough".into(),
            zipcode: "92998-3874".into(),
            geo: Geo {
                lat: "-37.3159".into(),
                lng: "81.1496".into(),
            },
        },
        phone: "1-770-736-8031".into(),
        website: "hildegard.org".into(),
        company: Company {
            name: "Romaguera-Crona".into(),
            catch_phrase: "Multi-layered client-server neural-net".into(),
            bs: "harness real-time e-markets".into(),
        },
    }
}

fn todo(id: u64) -> Todo {
    Todo {
        user_id: (id - 1) / 20 + 1,
        id,
        title: format!("todo {id}"),
        completed: id % 2 == 0,
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({}))).into_response()
}

async fn list_posts(Query(filter): Query<Filter>) -> Json<Vec<Post>> {
    Json(
        (1..=100)
            .map(post)
            .filter(|p| filter.user_id.map_or(true, |u| p.user_id == u))
            .collect(),
    )
}

async fn get_post(Path(id): Path<u64>) -> Response {
    if (1..=100).contains(&id) {
        Json(post(id)).into_response()
    } else {
        not_found()
    }
}

async fn create_post(Json(new): Json<NewPost>) -> (StatusCode, Json<Post>) {
    (
        StatusCode::CREATED,
        Json(Post {
            user_id: new.user_id,
            id: 101,
            title: new.title,
            body: new.body,
        }),
    )
}

async fn put_post(Path(id): Path<u64>, Json(mut updated): Json<Post>) -> Json<Post> {
    updated.id = id;
    Json(updated)
}

async fn patch_post(Path(id): Path<u64>, Json(patch): Json<PostPatch>) -> Json<Post> {
    let mut current = post(id.clamp(1, 100));
    if let Some(title) = patch.title {
        current.title = title;
    }
    if let Some(body) = patch.body {
        current.body = body;
    }
    Json(current)
}

async fn delete_post(Path(_id): Path<u64>) -> Json<serde_json::Value> {
    Json(json!({}))
}

async fn post_comments(Path(id): Path<u64>) -> Json<Vec<Comment>> {
    Json(comments(id))
}

async fn list_comments(Query(filter): Query<Filter>) -> Json<Vec<Comment>> {
    Json(filter.post_id.map(comments).unwrap_or_default())
}

async fn list_users() -> Json<Vec<User>> {
    Json((1..=10).map(user).collect())
}

async fn get_user(Path(id): Path<u64>) -> Response {
    if (1..=10).contains(&id) {
        Json(user(id)).into_response()
    } else {
        not_found()
    }
}

async fn list_todos(Query(filter): Query<Filter>) -> Json<Vec<Todo>> {
    Json(
        (1..=200)
            .map(todo)
            .filter(|t| filter.user_id.map_or(true, |u| t.user_id == u))
            .collect(),
    )
}

async fn get_todo(Path(id): Path<u64>) -> Response {
    if (1..=200).contains(&id) {
        Json(todo(id)).into_response()
    } else {
        not_found()
    }
}

async fn list_albums(Query(filter): Query<Filter>) -> Json<Vec<Album>> {
    Json(
        (1..=100)
            .map(|id| Album {
                user_id: (id - 1) / 10 + 1,
                id,
                title: format!("album {id}"),
            })
            .filter(|a| filter.user_id.map_or(true, |u| a.user_id == u))
            .collect(),
    )
}

async fn album_photos(Path(album_id): Path<u64>) -> Json<Vec<Photo>> {
    Json(
        (1..=50)
            .map(|n| Photo {
                album_id,
                id: (album_id - 1) * 50 + n,
                title: format!("photo {n}"),
                url: format!("https://via.placeholder.com/600/{n:06x}"),
                thumbnail_url: format!("https://via.placeholder.com/150/{n:06x}"),
            })
            .collect(),
    )
}

fn router() -> Router {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).put(put_post).patch(patch_post).delete(delete_post),
        )
        .route("/posts/{id}/comments", get(post_comments))
        .route("/comments", get(list_comments))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/todos", get(list_todos))
        .route("/todos/{id}", get(get_todo))
        .route("/albums", get(list_albums))
        .route("/albums/{id}/photos", get(album_photos))
}

/// Start the stub on an ephemeral port and return its base URL.
///
/// The server thread lives until the test process exits.
pub(crate) fn spawn() -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("stub runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind stub");
            tx.send(listener.local_addr().expect("stub addr"))
                .expect("report stub addr");
            axum::serve(listener, router()).await.expect("serve stub");
        });
    });
    let addr = rx.recv().expect("stub address");
    format!("http://{addr}")
}
