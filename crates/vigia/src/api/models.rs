//! JSONPlaceholder resources.

use serde::{Deserialize, Serialize};

/// Blog post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Author
    pub user_id: u64,
    /// Post id
    pub id: u64,
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
}

/// Payload for creating a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    /// Title
    pub title: String,
    /// Body text
    pub body: String,
    /// Author
    pub user_id: u64,
}

impl NewPost {
    /// Create a payload
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>, user_id: u64) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            user_id,
        }
    }
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    /// New title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl PostPatch {
    /// Patch only the title
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: None,
        }
    }
}

/// Comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Parent post
    pub post_id: u64,
    /// Comment id
    pub id: u64,
    /// Subject line
    pub name: String,
    /// Author email
    pub email: String,
    /// Body text
    pub body: String,
}

/// Coordinates, as strings on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geo {
    /// Latitude
    pub lat: String,
    /// Longitude
    pub lng: String,
}

/// Postal address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street
    pub street: String,
    /// Suite
    pub suite: String,
    /// City
    pub city: String,
    /// Zip code
    pub zipcode: String,
    /// Coordinates
    pub geo: Geo,
}

/// Employer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Company name
    pub name: String,
    /// Slogan
    pub catch_phrase: String,
    /// Business line
    pub bs: String,
}

/// User account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: u64,
    /// Full name
    pub name: String,
    /// Login
    pub username: String,
    /// Email
    pub email: String,
    /// Address
    pub address: Address,
    /// Phone
    pub phone: String,
    /// Website
    pub website: String,
    /// Employer
    pub company: Company,
}

/// Todo item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Owner
    pub user_id: u64,
    /// Todo id
    pub id: u64,
    /// Title
    pub title: String,
    /// Done
    pub completed: bool,
}

/// Photo album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    /// Owner
    pub user_id: u64,
    /// Album id
    pub id: u64,
    /// Title
    pub title: String,
}

/// Photo in an album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Parent album
    pub album_id: u64,
    /// Photo id
    pub id: u64,
    /// Title
    pub title: String,
    /// Full-size URL
    pub url: String,
    /// Thumbnail URL
    pub thumbnail_url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_post_uses_camel_case() {
        let post: Post = serde_json::from_str(
            r#"{"userId": 1, "id": 1, "title": "sunt aut facere", "body": "quia et suscipit"}"#,
        )
        .unwrap();
        assert_eq!(post.user_id, 1);
        let json = serde_json::to_string(&NewPost::new("t", "b", 7)).unwrap();
        assert!(json.contains("\"userId\":7"));
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let json = serde_json::to_string(&PostPatch::title("patched")).unwrap();
        assert_eq!(json, r#"{"title":"patched"}"#);
    }

    #[test]
    fn test_user_nested() {
        let user: User = serde_json::from_str(
            r#"{
              "id": 1, "name": "Leanne Graham", "username": "Bret",
              "email": "Sincere@april.biz",
              "address": {"street": "Kulas Light", "suite": "Apt. 556", "city": "Gwenborough",
                          "zipcode": "92998-3874", "geo": {"lat": "-37.3159", "lng": "81.1496"}},
              "phone": "1-770-736-8031 x56442", "website": "hildegard.org",
              "company": {"name": "Romaguera-Crona",
                          "catchPhrase": "Multi-layered client-server neural-net",
                          "bs": "harness real-time e-markets"}
            }"#,
        )
        .unwrap();
        assert_eq!(user.username, "Bret");
        assert_eq!(user.address.geo.lat, "-37.3159");
        assert_eq!(user.company.catch_phrase, "Multi-layered client-server neural-net");
    }

    #[test]
    fn test_photo_thumbnail_field() {
        let photo: Photo = serde_json::from_str(
            r#"{"albumId": 1, "id": 1, "title": "accusamus", "url": "https://via.placeholder.com/600/92c952",
                "thumbnailUrl": "https://via.placeholder.com/150/92c952"}"#,
        )
        .unwrap();
        assert!(photo.thumbnail_url.contains("150"));
    }
}
