use reqwest::{header, Client, Method, RequestBuilder};

use crate::error::ConsumerError;

/// Base URL plus session credentials shared by the HTTP collaborators
#[derive(Clone)]
pub struct ApiConnection {
    http: Client,
    base_url: String,
    cookie: Option<String>,
}

impl ApiConnection {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConsumerError> {
        let http = Client::builder().build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            cookie: None,
        })
    }

    /// Send the session cookie with every request
    pub fn with_session(mut self, cookie_name: &str, token: &str) -> Self {
        self.cookie = Some(format!("{}={}", cookie_name, token));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }
}
