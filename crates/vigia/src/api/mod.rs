//! Blocking HTTP client for the JSONPlaceholder API.
//!
//! Every call returns the raw [`ApiResponse`] so scenarios can assert on
//! status and headers before decoding the body with [`ApiResponse::json`].

mod models;
#[cfg(test)]
pub(crate) mod stub;

pub use models::{Address, Album, Comment, Company, Geo, NewPost, Photo, Post, PostPatch, Todo, User};

use crate::config::EnvironmentConfig;
use crate::result::{VigiaError, VigiaResult};
use reqwest::blocking::Client;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Request method
    pub method: String,
    /// Request URL
    pub url: String,
    /// Status code
    pub status: u16,
    /// Response headers, lower-cased names
    pub headers: HashMap<String, String>,
    /// Raw body
    pub body: String,
    /// Time to last byte
    pub elapsed: Duration,
}

impl ApiResponse {
    /// 2xx status
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Header value by case-insensitive name
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Decode the body
    ///
    /// # Errors
    ///
    /// [`VigiaError::Json`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> VigiaResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Fail unless the status is `expected`
    ///
    /// # Errors
    ///
    /// [`VigiaError::UnexpectedStatus`] naming both codes and the URL.
    pub fn ensure_status(&self, expected: u16) -> VigiaResult<&Self> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(VigiaError::UnexpectedStatus {
                status: self.status,
                expected,
                url: self.url.clone(),
            })
        }
    }
}

/// JSONPlaceholder client
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request timeout
    ///
    /// # Errors
    ///
    /// [`VigiaError::Http`] if the TLS backend cannot be initialised.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> VigiaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vigia/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Client for the configured API
    pub fn from_config(config: &EnvironmentConfig) -> VigiaResult<Self> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.api_timeout_secs),
        )
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request with an optional JSON body and query string
    pub fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> VigiaResult<ApiResponse> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut request = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let start = Instant::now();
        let response = request.send()?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text()?;
        let elapsed = start.elapsed();

        debug!(
            method = %method,
            url = %final_url,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "api call"
        );

        Ok(ApiResponse {
            method: method.to_string(),
            url: final_url,
            status,
            headers,
            body,
            elapsed,
        })
    }

    fn get(&self, path: &str) -> VigiaResult<ApiResponse> {
        self.send::<()>(Method::GET, path, &[], None)
    }

    fn get_query(&self, path: &str, key: &str, value: u64) -> VigiaResult<ApiResponse> {
        self.send::<()>(Method::GET, path, &[(key, value.to_string())], None)
    }

    // ========================================================================
    // Posts
    // ========================================================================

    /// `GET /posts`
    pub fn list_posts(&self) -> VigiaResult<ApiResponse> {
        self.get("posts")
    }

    /// `GET /posts?userId=`
    pub fn posts_by_user(&self, user_id: u64) -> VigiaResult<ApiResponse> {
        self.get_query("posts", "userId", user_id)
    }

    /// `GET /posts/{id}`
    pub fn get_post(&self, id: u64) -> VigiaResult<ApiResponse> {
        self.get(&format!("posts/{id}"))
    }

    /// `POST /posts`
    pub fn create_post(&self, post: &NewPost) -> VigiaResult<ApiResponse> {
        self.send(Method::POST, "posts", &[], Some(post))
    }

    /// `PUT /posts/{id}`
    pub fn update_post(&self, id: u64, post: &Post) -> VigiaResult<ApiResponse> {
        self.send(Method::PUT, &format!("posts/{id}"), &[], Some(post))
    }

    /// `PATCH /posts/{id}`
    pub fn patch_post(&self, id: u64, patch: &PostPatch) -> VigiaResult<ApiResponse> {
        self.send(Method::PATCH, &format!("posts/{id}"), &[], Some(patch))
    }

    /// `DELETE /posts/{id}`
    pub fn delete_post(&self, id: u64) -> VigiaResult<ApiResponse> {
        self.send::<()>(Method::DELETE, &format!("posts/{id}"), &[], None)
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// `GET /posts/{id}/comments`
    pub fn comments_for_post(&self, post_id: u64) -> VigiaResult<ApiResponse> {
        self.get(&format!("posts/{post_id}/comments"))
    }

    /// `GET /comments?postId=`
    pub fn comments_by_post_query(&self, post_id: u64) -> VigiaResult<ApiResponse> {
        self.get_query("comments", "postId", post_id)
    }

    // ========================================================================
    // Users, todos, albums
    // ========================================================================

    /// `GET /users`
    pub fn list_users(&self) -> VigiaResult<ApiResponse> {
        self.get("users")
    }

    /// `GET /users/{id}`
    pub fn get_user(&self, id: u64) -> VigiaResult<ApiResponse> {
        self.get(&format!("users/{id}"))
    }

    /// `GET /todos?userId=`
    pub fn todos_by_user(&self, user_id: u64) -> VigiaResult<ApiResponse> {
        self.get_query("todos", "userId", user_id)
    }

    /// `GET /todos/{id}`
    pub fn get_todo(&self, id: u64) -> VigiaResult<ApiResponse> {
        self.get(&format!("todos/{id}"))
    }

    /// `GET /albums?userId=`
    pub fn albums_by_user(&self, user_id: u64) -> VigiaResult<ApiResponse> {
        self.get_query("albums", "userId", user_id)
    }

    /// `GET /albums/{id}/photos`
    pub fn photos_by_album(&self, album_id: u64) -> VigiaResult<ApiResponse> {
        self.get(&format!("albums/{album_id}/photos"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(stub::spawn(), Duration::from_secs(5)).unwrap()
    }

    mod response_tests {
        use super::*;

        fn response(status: u16) -> ApiResponse {
            ApiResponse {
                method: "GET".into(),
                url: "http://stub/posts/1".into(),
                status,
                headers: HashMap::from([("content-type".to_string(), "application/json".to_string())]),
                body: r#"{"userId":1,"id":1,"title":"t","body":"b"}"#.into(),
                elapsed: Duration::from_millis(3),
            }
        }

        #[test]
        fn test_header_case_insensitive() {
            assert_eq!(response(200).header("Content-Type"), Some("application/json"));
            assert_eq!(response(200).header("x-missing"), None);
        }

        #[test]
        fn test_ensure_status() {
            assert!(response(200).ensure_status(200).is_ok());
            let err = response(404).ensure_status(200).unwrap_err();
            assert!(matches!(
                err,
                VigiaError::UnexpectedStatus {
                    status: 404,
                    expected: 200,
                    ..
                }
            ));
        }

        #[test]
        fn test_is_success() {
            assert!(response(201).is_success());
            assert!(!response(404).is_success());
        }

        #[test]
        fn test_json_mismatch_is_error() {
            let mut r = response(200);
            r.body = "not json".into();
            assert!(matches!(r.json::<Post>().unwrap_err(), VigiaError::Json(_)));
        }
    }

    mod client_tests {
        use super::*;

        #[test]
        fn test_base_url_trimmed() {
            let c = ApiClient::new("http://x.test/", Duration::from_secs(1)).unwrap();
            assert_eq!(c.base_url(), "http://x.test");
        }

        #[test]
        fn test_list_and_get_posts() {
            let c = client();
            let all: Vec<Post> = c.list_posts().unwrap().ensure_status(200).unwrap().json().unwrap();
            assert_eq!(all.len(), 100);
            let one: Post = c.get_post(1).unwrap().json().unwrap();
            assert_eq!(one.id, 1);
            assert_eq!(one.user_id, 1);
        }

        #[test]
        fn test_posts_by_user_sends_query() {
            let posts: Vec<Post> = client().posts_by_user(2).unwrap().json().unwrap();
            assert_eq!(posts.len(), 10);
            assert!(posts.iter().all(|p| p.user_id == 2));
        }

        #[test]
        fn test_create_echoes_payload() {
            let r = client().create_post(&NewPost::new("foo", "bar", 1)).unwrap();
            assert_eq!(r.status, 201);
            let created: Post = r.json().unwrap();
            assert_eq!(created.id, 101);
            assert_eq!(created.title, "foo");
            assert!(r.header("content-type").unwrap().contains("json"));
        }

        #[test]
        fn test_put_patch_delete() {
            let c = client();
            let updated = Post {
                user_id: 1,
                id: 1,
                title: "updated".into(),
                body: "new body".into(),
            };
            let put: Post = c.update_post(1, &updated).unwrap().json().unwrap();
            assert_eq!(put, updated);

            let patched: Post = c.patch_post(1, &PostPatch::title("patched")).unwrap().json().unwrap();
            assert_eq!(patched.title, "patched");
            assert!(!patched.body.is_empty());

            assert_eq!(c.delete_post(1).unwrap().status, 200);
        }

        #[test]
        fn test_comments_both_routes() {
            let c = client();
            let nested: Vec<Comment> = c.comments_for_post(1).unwrap().json().unwrap();
            let queried: Vec<Comment> = c.comments_by_post_query(1).unwrap().json().unwrap();
            assert_eq!(nested.len(), 5);
            assert_eq!(nested, queried);
        }

        #[test]
        fn test_users_todos_albums_photos() {
            let c = client();
            let user: User = c.get_user(1).unwrap().json().unwrap();
            assert_eq!(user.username, "Bret");
            let users: Vec<User> = c.list_users().unwrap().json().unwrap();
            assert_eq!(users.len(), 10);
            let todos: Vec<Todo> = c.todos_by_user(1).unwrap().json().unwrap();
            assert_eq!(todos.len(), 20);
            let todo: Todo = c.get_todo(1).unwrap().json().unwrap();
            assert_eq!(todo.user_id, 1);
            let albums: Vec<Album> = c.albums_by_user(1).unwrap().json().unwrap();
            assert_eq!(albums.len(), 10);
            let photos: Vec<Photo> = c.photos_by_album(1).unwrap().json().unwrap();
            assert_eq!(photos.len(), 50);
        }

        #[test]
        fn test_unknown_post_is_404_not_error() {
            let r = client().get_post(9999).unwrap();
            assert_eq!(r.status, 404);
            assert_eq!(r.body.trim(), "{}");
        }

        #[test]
        fn test_connection_refused_is_http_error() {
            let c = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
            assert!(matches!(c.list_posts().unwrap_err(), VigiaError::Http(_)));
        }
    }
}
