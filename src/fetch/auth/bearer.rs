use super::TokenSource;
use crate::fetch::client::HttpClient;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};

/// An [`HttpClient`] wrapper that sets `Authorization: Bearer <token>` on
/// every request, asking `tokens` for the token each time.
pub struct BearerAuth<C, T> {
    pub inner: C,
    pub tokens: T,
}

impl<C, T> BearerAuth<C, T> {
    pub fn new(inner: C, tokens: T) -> Self {
        Self { inner, tokens }
    }
}

#[async_trait]
impl<C: HttpClient, T: TokenSource> HttpClient for BearerAuth<C, T> {
    async fn execute(&self, mut req: reqwest::Request) -> Result<reqwest::Response> {
        let token = self.tokens.access_token().await?;
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);

        req.headers_mut().insert(AUTHORIZATION, value);
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedToken;

    #[async_trait]
    impl TokenSource for FixedToken {
        async fn access_token(&self) -> Result<String> {
            Ok("abc123".to_string())
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Option<String>>,
    }

    #[async_trait]
    impl HttpClient for Recorder {
        async fn execute(&self, req: reqwest::Request) -> Result<reqwest::Response> {
            let header = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            *self.seen.lock().unwrap() = header;
            Ok(reqwest::Response::from(http::Response::new("{}")))
        }
    }

    #[tokio::test]
    async fn test_bearer_header_is_attached() {
        let client = BearerAuth::new(Recorder::default(), FixedToken);
        let req = reqwest::Request::new(
            reqwest::Method::GET,
            "https://example.com/x".parse().unwrap(),
        );

        client.execute(req).await.unwrap();

        let seen = client.inner.seen.lock().unwrap().clone();
        assert_eq!(seen.as_deref(), Some("Bearer abc123"));
    }
}
