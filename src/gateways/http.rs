//! HTTP gateway implementation using `reqwest`.
//!
//! This module provides [`HttpGateway`], a [`Gateway`] implementation that
//! talks JSON to the cinema backend's REST API. Both `http://` and `https://`
//! base URLs are supported; TLS is handled by `rustls`.
//!
//! # Feature gate
//!
//! This module is only available when the `gateway-http` feature is enabled
//! (it is enabled by default).
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), cinema_booking_client::BookingError> {
//! use cinema_booking_client::{ClientConfig, Gateway, HttpGateway};
//!
//! let gateway = HttpGateway::new(&ClientConfig::new("http://localhost:4000/api"))?;
//! let showtimes = gateway.list_showtimes(Some("42")).await?;
//! println!("{} showtimes", showtimes.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::error::BookingError;
use crate::gateway::Gateway;
use crate::models::{
    CreateReservationRequest, Credentials, FoodCategory, FoodItem, FoodOrder, FoodOrderRequest,
    LoginResponse, Movie, MovieDetails, PaymentRequest, Registration, Reservation, Seat, Showtime,
    Theater, User,
};

/// A [`Gateway`] backed by `reqwest`.
///
/// The bearer token returned by [`login`](Gateway::login) or
/// [`register`](Gateway::register) is kept in memory and sent as an
/// `Authorization` header on every later request until
/// [`logout`](Gateway::logout).
#[derive(Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl HttpGateway {
    /// Build a gateway from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Config`] if the base URL does not parse or the
    /// HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, BookingError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| BookingError::Config(format!("cannot build HTTP client: {e}")))?;
        Self::with_client(client, &config.base_url)
    }

    /// Build a gateway around an existing `reqwest::Client`.
    ///
    /// Useful for custom TLS roots, proxies, or default headers that
    /// [`new`](Self::new) does not expose.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Config`] if `base_url` does not parse.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, BookingError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| BookingError::Config(format!("invalid base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BookingError::Config(format!(
                "base URL {base_url} cannot carry a path"
            )));
        }
        Ok(Self {
            client,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Returns `true` if a bearer token is currently attached.
    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BookingError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BookingError::Config(format!("base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn builder(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match self.token.read().await.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, BookingError> {
        let response = request
            .send()
            .await
            .map_err(|e| BookingError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BookingError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(status, &body);
            tracing::debug!(status = status.as_u16(), %message, "backend rejected request");
            return Err(BookingError::Http {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body.to_vec())
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BookingError> {
        let body = self.send(request).await?;
        serde_json::from_slice(&body).map_err(|e| BookingError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, BookingError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        let request = self.builder(Method::GET, url).await.query(query);
        self.fetch(request).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, BookingError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "POST");
        let request = self.builder(Method::POST, url).await.json(body);
        self.fetch(request).await
    }

    async fn post_empty(&self, segments: &[&str]) -> Result<(), BookingError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "POST");
        let request = self.builder(Method::POST, url).await;
        self.send(request).await.map(|_| ())
    }

    async fn remember_token(&self, response: &LoginResponse) {
        if let Some(token) = &response.token {
            *self.token.write().await = Some(token.clone());
        }
    }
}

/// Extract a readable message from an error response body.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        text
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_movies(&self) -> Result<Vec<Movie>, BookingError> {
        self.get(&["movies"], &[]).await
    }

    async fn get_movie(&self, id: &str) -> Result<Movie, BookingError> {
        self.get(&["movies", id], &[]).await
    }

    async fn get_movie_details(&self, id: &str) -> Result<MovieDetails, BookingError> {
        self.get(&["movies", id, "details"], &[]).await
    }

    async fn list_theaters(&self) -> Result<Vec<Theater>, BookingError> {
        self.get(&["theaters"], &[]).await
    }

    async fn get_theater(&self, id: &str) -> Result<Theater, BookingError> {
        self.get(&["theaters", id], &[]).await
    }

    async fn list_showtimes(&self, movie_id: Option<&str>) -> Result<Vec<Showtime>, BookingError> {
        match movie_id {
            Some(movie_id) => self.get(&["showtimes"], &[("movieId", movie_id)]).await,
            None => self.get(&["showtimes"], &[]).await,
        }
    }

    async fn get_showtime(&self, id: &str) -> Result<Showtime, BookingError> {
        self.get(&["showtimes", id], &[]).await
    }

    async fn list_seats(&self, showtime_id: &str) -> Result<Vec<Seat>, BookingError> {
        self.get(&["showtimes", showtime_id, "seats"], &[]).await
    }

    async fn create_reservation(
        &self,
        request: &CreateReservationRequest,
    ) -> Result<Reservation, BookingError> {
        self.post(&["reservations"], request).await
    }

    async fn get_reservation(&self, id: &str) -> Result<Reservation, BookingError> {
        self.get(&["reservations", id], &[]).await
    }

    async fn pay_reservation(
        &self,
        id: &str,
        payment: &PaymentRequest,
    ) -> Result<Reservation, BookingError> {
        self.post(&["reservations", id, "pay"], payment).await
    }

    async fn cancel_reservation(&self, id: &str) -> Result<(), BookingError> {
        self.post_empty(&["reservations", id, "cancel"]).await
    }

    async fn list_user_reservations(
        &self,
        user_id: &str,
    ) -> Result<Vec<Reservation>, BookingError> {
        self.get(&["reservations", "user", user_id], &[]).await
    }

    async fn list_food_categories(&self) -> Result<Vec<FoodCategory>, BookingError> {
        self.get(&["concessions", "categories"], &[]).await
    }

    async fn list_food_items(
        &self,
        category_id: Option<&str>,
    ) -> Result<Vec<FoodItem>, BookingError> {
        match category_id {
            Some(category_id) => {
                self.get(&["concessions", "items"], &[("categoryId", category_id)])
                    .await
            }
            None => self.get(&["concessions", "items"], &[]).await,
        }
    }

    async fn create_food_order(
        &self,
        request: &FoodOrderRequest,
    ) -> Result<FoodOrder, BookingError> {
        self.post(&["concessions", "orders"], request).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, BookingError> {
        let response: LoginResponse = self.post(&["auth", "login"], credentials).await?;
        self.remember_token(&response).await;
        tracing::info!(user_id = %response.user.id, "signed in");
        Ok(response)
    }

    async fn logout(&self) -> Result<(), BookingError> {
        let result = self.post_empty(&["auth", "logout"]).await;
        // The local credential is dropped even if the backend call fails.
        *self.token.write().await = None;
        result
    }

    async fn me(&self) -> Result<User, BookingError> {
        self.get(&["auth", "me"], &[]).await
    }

    async fn register(&self, registration: &Registration) -> Result<LoginResponse, BookingError> {
        let response: LoginResponse = self.post(&["auth", "register"], registration).await?;
        self.remember_token(&response).await;
        Ok(response)
    }

    async fn set_credential(&self, token: Option<String>) {
        *self.token.write().await = token;
    }
}
