//! JSONPlaceholder scenarios.

use crate::api::{ApiClient, ApiResponse, Comment, NewPost, Photo, Post, PostPatch, Todo, User};
use crate::config::EnvironmentConfig;
use crate::result::{VigiaError, VigiaResult};
use crate::scenario::{ensure, ensure_eq, Feature, Scenario, World};

/// One HTTP client and the last response it received
#[derive(Debug)]
pub struct ApiWorld {
    client: ApiClient,
    response: Option<ApiResponse>,
}

impl ApiWorld {
    /// Client for this scenario
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Remember `response` for the following steps
    pub fn record(&mut self, response: ApiResponse) {
        self.response = Some(response);
    }

    /// Last response
    ///
    /// # Errors
    ///
    /// Assertion error when no request has been made yet.
    pub fn response(&self) -> VigiaResult<&ApiResponse> {
        self.response
            .as_ref()
            .ok_or_else(|| VigiaError::assertion("no request has been made yet"))
    }
}

impl World for ApiWorld {
    fn setup(config: &EnvironmentConfig) -> VigiaResult<Self> {
        Ok(Self {
            client: ApiClient::from_config(config)?,
            response: None,
        })
    }
}

fn expect_status(w: &ApiWorld, status: u16) -> VigiaResult<()> {
    w.response()?.ensure_status(status).map(|_| ())
}

fn ok(w: &mut ApiWorld) -> VigiaResult<()> {
    expect_status(w, 200)
}

/// The JSONPlaceholder feature
#[must_use]
pub fn feature() -> Feature<ApiWorld> {
    Feature::new("JSONPlaceholder REST API")
        .scenario(
            Scenario::new("List all posts")
                .tag("api")
                .tag("smoke")
                .when("I request all posts", |w: &mut ApiWorld| {
                    let r = w.client().list_posts()?;
                    w.record(r);
                    Ok(())
                })
                .then("the status is 200", ok)
                .and("100 posts are returned", |w| {
                    let posts: Vec<Post> = w.response()?.json()?;
                    ensure_eq(&posts.len(), &100, "post count")
                })
                .and("the body is JSON", |w| {
                    let content_type = w.response()?.header("content-type").unwrap_or_default();
                    ensure(
                        content_type.contains("application/json"),
                        format!("content-type was {content_type:?}"),
                    )
                }),
        )
        .scenario(
            Scenario::new("Get a single post")
                .tag("api")
                .tag("smoke")
                .when("I request post 1", |w: &mut ApiWorld| {
                    let r = w.client().get_post(1)?;
                    w.record(r);
                    Ok(())
                })
                .then("the status is 200", ok)
                .and("it is post 1 by user 1", |w| {
                    let post: Post = w.response()?.json()?;
                    ensure_eq(&post.id, &1, "post id")?;
                    ensure_eq(&post.user_id, &1, "author")?;
                    ensure(!post.title.is_empty(), "post title is empty")
                }),
        )
        .scenario(
            Scenario::new("Create a post")
                .tag("api")
                .tag("crud")
                .when("I create a post", |w: &mut ApiWorld| {
                    let r = w
                        .client()
                        .create_post(&NewPost::new("vigia", "created by vigia", 1))?;
                    w.record(r);
                    Ok(())
                })
                .then("the status is 201", |w| expect_status(w, 201))
                .and("the post is echoed with id 101", |w| {
                    let post: Post = w.response()?.json()?;
                    ensure_eq(&post.id, &101, "new post id")?;
                    ensure_eq(post.title.as_str(), "vigia", "title")?;
                    ensure_eq(post.body.as_str(), "created by vigia", "body")?;
                    ensure_eq(&post.user_id, &1, "author")
                }),
        )
        .scenario(
            Scenario::new("Replace a post")
                .tag("api")
                .tag("crud")
                .when("I PUT post 1", |w: &mut ApiWorld| {
                    let replacement = Post {
                        user_id: 1,
                        id: 1,
                        title: "replaced".into(),
                        body: "replaced body".into(),
                    };
                    let r = w.client().update_post(1, &replacement)?;
                    w.record(r);
                    Ok(())
                })
                .then("the status is 200", ok)
                .and("the replacement is returned", |w| {
                    let post: Post = w.response()?.json()?;
                    ensure_eq(post.title.as_str(), "replaced", "title")?;
                    ensure_eq(&post.id, &1, "post id")
                }),
        )
        .scenario(
            Scenario::new("Patch a post title")
                .tag("api")
                .tag("crud")
                .when("I PATCH the title of post 1", |w: &mut ApiWorld| {
                    let r = w.client().patch_post(1, &PostPatch::title("patched"))?;
                    w.record(r);
                    Ok(())
                })
                .then("the status is 200", ok)
                .and("only the title changed", |w| {
                    let post: Post = w.response()?.json()?;
                    ensure_eq(post.title.as_str(), "patched", "title")?;
                    ensure(!post.body.is_empty(), "body was dropped by the patch")
                }),
        )
        .scenario(
            Scenario::new("Delete a post")
                .tag("api")
                .tag("crud")
                .when("I delete post 1", |w: &mut ApiWorld| {
                    let r = w.client().delete_post(1)?;
                    w.record(r);
                    Ok(())
                })
                .then("the status is 200", ok),
        )
        .scenario(
            Scenario::new("Comments belong to their post")
                .tag("api")
                .when("I request the comments of post 1", |w: &mut ApiWorld| {
                    let r = w.client().comments_for_post(1)?;
                    w.record(r);
                    Ok(())
                })
                .then("the status is 200", ok)
                .and("5 comments all reference post 1", |w| {
                    let comments: Vec<Comment> = w.response()?.json()?;
                    ensure_eq(&comments.len(), &5, "comment count")?;
                    ensure(
                        comments.iter().all(|c| c.post_id == 1),
                        "a comment references another post",
                    )
                })
                .but("the query form returns the same comments", |w| {
                    let by_query: Vec<Comment> = w.client().comments_by_post_query(1)?.json()?;
                    let nested: Vec<Comment> = w.response()?.json()?;
                    ensure_eq(&by_query, &nested, "comments by query")
                }),
        )
        .scenario(
            Scenario::new("Fetch a user")
                .tag("api")
                .when("I request user 1", |w: &mut ApiWorld| {
                    let r = w.client().get_user(1)?;
                    w.record(r);
                    Ok(())
                })
                .then("the status is 200", ok)
                .and("it is Leanne Graham (Bret)", |w| {
                    let user: User = w.response()?.json()?;
                    ensure_eq(user.name.as_str(), "Leanne Graham", "name")?;
                    ensure_eq(user.username.as_str(), "Bret", "username")
                }),
        )
        .scenario(
            Scenario::new("Todos of a user")
                .tag("api")
                .when("I request the todos of user 1", |w: &mut ApiWorld| {
                    let r = w.client().todos_by_user(1)?;
                    w.record(r);
                    Ok(())
                })
                .then("the status is 200", ok)
                .and("20 todos belong to user 1", |w| {
                    let todos: Vec<Todo> = w.response()?.json()?;
                    ensure_eq(&todos.len(), &20, "todo count")?;
                    ensure(todos.iter().all(|t| t.user_id == 1), "foreign todo")
                }),
        )
        .scenario(
            Scenario::new("Unknown post")
                .tag("api")
                .tag("negative")
                .when("I request post 9999", |w: &mut ApiWorld| {
                    let r = w.client().get_post(9999)?;
                    w.record(r);
                    Ok(())
                })
                .then("the status is 404", |w| expect_status(w, 404))
                .and("the body is an empty object", |w| {
                    let body: serde_json::Value = w.response()?.json()?;
                    ensure_eq(&body, &serde_json::json!({}), "body")
                }),
        )
        .scenario(
            Scenario::new("Photos of an album")
                .tag("api")
                .when("I request the photos of album 1", |w: &mut ApiWorld| {
                    let r = w.client().photos_by_album(1)?;
                    w.record(r);
                    Ok(())
                })
                .then("the status is 200", ok)
                .and("50 photos belong to album 1", |w| {
                    let photos: Vec<Photo> = w.response()?.json()?;
                    ensure_eq(&photos.len(), &50, "photo count")?;
                    ensure(photos.iter().all(|p| p.album_id == 1), "foreign photo")
                }),
        )
}
