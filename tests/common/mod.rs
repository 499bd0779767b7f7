#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use serde_json::{Value, json};
use showyourself::{AppState, app, config::Config, db, profiles::NewProfile};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x02\0\0\0";

/// A private in-memory database. One connection, kept forever, because
/// every new connection to `sqlite::memory:` would be a fresh database.
pub async fn memory_pool() -> SqlitePool {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init_schema(&db_pool).await.unwrap();
    db_pool
}

pub fn new_profile(name: &str, email: &str) -> NewProfile {
    NewProfile {
        name: name.to_owned(),
        email: email.to_owned(),
        profession: "Engineer".to_owned(),
        ..Default::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub db_pool: SqlitePool,
    pub upload_dir: TempDir,
}

pub async fn test_app() -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();
    let config = Config {
        upload_dir: upload_dir.path().to_path_buf(),
        max_upload_bytes: 64 * 1024,
        public_base_url: "https://profiles.example".to_owned(),
        admin_username: ADMIN_USERNAME.to_owned(),
        admin_password: Some(ADMIN_PASSWORD.to_owned()),
        ..Default::default()
    };

    let db_pool = memory_pool().await;
    let state = AppState::new(db_pool.clone(), config);

    TestApp {
        router: app(state),
        db_pool,
        upload_dir,
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
        Reply { status, headers, body }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Reply {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Reply {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn send_multipart(
        &self,
        method: &str,
        uri: &str,
        fields: &[(&str, &str)],
        photo: Option<(&str, &str, &[u8])>,
        cookie: Option<&str>,
    ) -> Reply {
        let (content_type, body) = multipart_body(fields, photo);
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::from(body)).unwrap()).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Reply {
        let mut request = Request::delete(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    /// Logs in and returns the `Cookie` header value for the session.
    pub async fn admin_cookie(&self) -> String {
        let reply = self
            .send_json(
                "POST",
                "/api/admin/login",
                json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
                None,
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);

        let set_cookie = reply
            .headers
            .get(header::SET_COOKIE)
            .expect("login sets a session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_owned()
    }

    /// Submits a profile through the public form and returns its JSON.
    pub async fn submit(&self, name: &str, email: &str) -> Value {
        let reply = self
            .send_multipart(
                "POST",
                "/api/profiles",
                &[("name", name), ("email", email), ("profession", "Engineer")],
                None,
                None,
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text());
        reply.json()
    }
}

pub fn multipart_body(fields: &[(&str, &str)], photo: Option<(&str, &str, &[u8])>) -> (String, Vec<u8>) {
    let boundary = "----showyourself-test-boundary";
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }

    if let Some((file_name, content_type, bytes)) = photo {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"profilePhoto\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
