//! Typed HTTP client for the ShopMate API.
//!
//! Session cookies are kept in the client's cookie store, GET responses are
//! cached per path for a configurable stale time, and failed requests are
//! retried with exponential backoff when the failure looks transient.

use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::Date;
use tracing::debug;
use uuid::Uuid;

use crate::auth::dto::{
    AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest, UpdatePasswordRequest,
};
use crate::auth::failures::AuthFailure;
use crate::meal_plan::dto::{
    AssignmentResponse, AssignmentView, CreateAssignmentRequest, WeekPlan, WeekPlanResponse,
};
use crate::recipes::dto::{RecipeDetails, RecipeInput, RecipeListResponse, RecipeResponse, RecipeSort};
use crate::shopping_lists::dto::{
    CreateShoppingListRequest, PreviewRequest, PreviewResponse, ShoppingListPreview,
    ShoppingListResponse, ShoppingListView, ShoppingListsResponse, UpdateItemRequest,
};
use crate::validation::ValidationErrors;

pub mod cache;
pub mod retry;

pub use cache::RequestCache;
pub use retry::RetryPolicy;

const AUTH: &str = "/api/auth";
const RECIPES: &str = "/api/recipes";
const MEAL_PLAN: &str = "/api/meal-plan";
const SHOPPING_LISTS: &str = "/api/shopping-lists";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        details: Option<ValidationErrors>,
    },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Transport failures and 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(e) => !e.is_decode() && !e.is_builder(),
            ClientError::Api { status, .. } => *status >= 500,
            ClientError::Decode(_) => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            ClientError::Decode(_) => None,
        }
    }

    pub fn auth_failure(&self) -> Option<AuthFailure> {
        match self {
            ClientError::Api { code: Some(code), .. } => AuthFailure::from_code(code),
            _ => None,
        }
    }

    /// Per-field messages of a 400 validation response.
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ClientError::Api { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: String,
    code: Option<String>,
    details: Option<ValidationErrors>,
}

/// Options for [`ShopMateClient::list_recipes`].
#[derive(Debug, Clone, Default)]
pub struct RecipeQuery {
    pub search: Option<String>,
    pub sort: RecipeSort,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl RecipeQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("sort", self.sort.as_ref().to_string())];
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

fn cache_key(path: &str, query: &[(&str, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let qs: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{path}?{}", qs.join("&"))
}

pub struct ShopMateClient {
    http: reqwest::Client,
    base_url: String,
    cache: RequestCache,
    reads: RetryPolicy,
    mutations: RetryPolicy,
}

impl ShopMateClient {
    /// `base_url` is the server root, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: RequestCache::default(),
            reads: RetryPolicy::reads(),
            mutations: RetryPolicy::mutations(),
        })
    }

    pub fn with_cache(mut self, cache: RequestCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_retry(mut self, reads: RetryPolicy, mutations: RetryPolicy) -> Self {
        self.reads = reads;
        self.mutations = mutations;
        self
    }

    pub fn cache(&self) -> &RequestCache {
        &self.cache
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut req = self.http.request(method, format!("{}{}", self.base_url, path));
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await?;
        if res.status().is_success() {
            return Ok(res);
        }

        let status = res.status().as_u16();
        let payload = res.json::<ErrorPayload>().await.unwrap_or(ErrorPayload {
            error: format!("HTTP {status}"),
            code: None,
            details: None,
        });
        Err(ClientError::Api {
            status,
            message: payload.error,
            code: payload.code,
            details: payload.details,
        })
    }

    async fn fetch_json(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        policy: RetryPolicy,
    ) -> Result<Value, ClientError> {
        let what = format!("{method} {path}");
        policy
            .run(&what, move || {
                let method = method.clone();
                async move {
                    let res = self.execute(method, path, query, body).await?;
                    Ok(res.json::<Value>().await?)
                }
            })
            .await
    }

    async fn read<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let key = cache_key(path, query);
        if let Some(hit) = self.cache.get(&key).await {
            debug!(key = %key, "cache hit");
            return Ok(serde_json::from_value(hit)?);
        }
        let value = self
            .fetch_json(Method::GET, path, query, None, self.reads)
            .await?;
        self.cache.put(key, value.clone()).await;
        Ok(serde_json::from_value(value)?)
    }

    async fn write<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        invalidate: &[&str],
    ) -> Result<T, ClientError> {
        let body = body.map(serde_json::to_value).transpose()?;
        let value = self
            .fetch_json(method, path, &[], body.as_ref(), self.mutations)
            .await?;
        self.cache.invalidate(invalidate).await;
        Ok(serde_json::from_value(value)?)
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        let what = format!("GET {path}");
        self.reads
            .run(&what, move || async move {
                let res = self.execute(Method::GET, path, &[], None).await?;
                Ok(res.bytes().await?.to_vec())
            })
            .await
    }

    // auth

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<PublicUser, ClientError> {
        let body = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        };
        let res: AuthResponse = self
            .write(Method::POST, &format!("{AUTH}/register"), Some(&body), &[])
            .await?;
        self.cache.clear().await;
        Ok(res.user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let res: AuthResponse = self
            .write(Method::POST, &format!("{AUTH}/login"), Some(&body), &[])
            .await?;
        self.cache.clear().await;
        Ok(res.user)
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let _: MessageResponse = self
            .write(Method::POST, &format!("{AUTH}/logout"), None::<&Value>, &[])
            .await?;
        self.cache.clear().await;
        Ok(())
    }

    pub async fn refresh(&self) -> Result<PublicUser, ClientError> {
        let res: AuthResponse = self
            .write(Method::POST, &format!("{AUTH}/refresh"), None::<&Value>, &[])
            .await?;
        Ok(res.user)
    }

    pub async fn update_password(
        &self,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), ClientError> {
        let body = UpdatePasswordRequest {
            new_password: new_password.to_string(),
            confirm_password: confirm_password.to_string(),
        };
        let _: MessageResponse = self
            .write(Method::POST, &format!("{AUTH}/update-password"), Some(&body), &[])
            .await?;
        Ok(())
    }

    pub async fn me(&self) -> Result<PublicUser, ClientError> {
        let value = self
            .fetch_json(Method::GET, &format!("{AUTH}/me"), &[], None, self.reads)
            .await?;
        let res: AuthResponse = serde_json::from_value(value)?;
        Ok(res.user)
    }

    // recipes

    pub async fn list_recipes(&self, query: &RecipeQuery) -> Result<RecipeListResponse, ClientError> {
        self.read(RECIPES, &query.pairs()).await
    }

    pub async fn get_recipe(&self, id: Uuid) -> Result<RecipeDetails, ClientError> {
        let res: RecipeResponse = self.read(&format!("{RECIPES}/{id}"), &[]).await?;
        Ok(res.data)
    }

    pub async fn create_recipe(&self, input: &RecipeInput) -> Result<RecipeDetails, ClientError> {
        let res: RecipeResponse = self
            .write(Method::POST, RECIPES, Some(input), &[RECIPES])
            .await?;
        Ok(res.data)
    }

    pub async fn update_recipe(
        &self,
        id: Uuid,
        input: &RecipeInput,
    ) -> Result<RecipeDetails, ClientError> {
        let res: RecipeResponse = self
            .write(
                Method::PUT,
                &format!("{RECIPES}/{id}"),
                Some(input),
                &[RECIPES, MEAL_PLAN],
            )
            .await?;
        Ok(res.data)
    }

    pub async fn delete_recipe(&self, id: Uuid) -> Result<(), ClientError> {
        let _: MessageResponse = self
            .write(
                Method::DELETE,
                &format!("{RECIPES}/{id}"),
                None::<&Value>,
                &[RECIPES, MEAL_PLAN],
            )
            .await?;
        Ok(())
    }

    // meal plan

    pub async fn get_week(&self, week_start_date: Date) -> Result<WeekPlan, ClientError> {
        let res: WeekPlanResponse = self
            .read(MEAL_PLAN, &[("week_start_date", week_start_date.to_string())])
            .await?;
        Ok(res.data)
    }

    pub async fn assign_meal(
        &self,
        request: &CreateAssignmentRequest,
    ) -> Result<AssignmentView, ClientError> {
        let res: AssignmentResponse = self
            .write(Method::POST, MEAL_PLAN, Some(request), &[MEAL_PLAN, RECIPES])
            .await?;
        Ok(res.data)
    }

    pub async fn remove_meal(&self, id: Uuid) -> Result<(), ClientError> {
        let _: MessageResponse = self
            .write(
                Method::DELETE,
                &format!("{MEAL_PLAN}/{id}"),
                None::<&Value>,
                &[MEAL_PLAN, RECIPES],
            )
            .await?;
        Ok(())
    }

    // shopping lists

    /// Read-only, so it uses the read retry policy and is never cached.
    pub async fn preview(&self, request: &PreviewRequest) -> Result<ShoppingListPreview, ClientError> {
        let body = serde_json::to_value(request)?;
        let value = self
            .fetch_json(
                Method::POST,
                &format!("{SHOPPING_LISTS}/preview"),
                &[],
                Some(&body),
                self.reads,
            )
            .await?;
        let res: PreviewResponse = serde_json::from_value(value)?;
        Ok(res.data)
    }

    pub async fn save_shopping_list(
        &self,
        request: &CreateShoppingListRequest,
    ) -> Result<ShoppingListView, ClientError> {
        let res: ShoppingListResponse = self
            .write(Method::POST, SHOPPING_LISTS, Some(request), &[SHOPPING_LISTS])
            .await?;
        Ok(res.data)
    }

    pub async fn list_shopping_lists(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<ShoppingListsResponse, ClientError> {
        let mut query = Vec::new();
        if let Some(page) = page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        self.read(SHOPPING_LISTS, &query).await
    }

    pub async fn get_shopping_list(&self, id: Uuid) -> Result<ShoppingListView, ClientError> {
        let res: ShoppingListResponse = self.read(&format!("{SHOPPING_LISTS}/{id}"), &[]).await?;
        Ok(res.data)
    }

    pub async fn set_item_checked(
        &self,
        id: Uuid,
        index: usize,
        is_checked: bool,
    ) -> Result<ShoppingListView, ClientError> {
        let body = UpdateItemRequest {
            is_checked: Some(is_checked),
        };
        let res: ShoppingListResponse = self
            .write(
                Method::PATCH,
                &format!("{SHOPPING_LISTS}/{id}/items/{index}"),
                Some(&body),
                &[SHOPPING_LISTS],
            )
            .await?;
        Ok(res.data)
    }

    pub async fn delete_shopping_list(&self, id: Uuid) -> Result<(), ClientError> {
        let _: MessageResponse = self
            .write(
                Method::DELETE,
                &format!("{SHOPPING_LISTS}/{id}"),
                None::<&Value>,
                &[SHOPPING_LISTS],
            )
            .await?;
        Ok(())
    }

    pub async fn export_pdf(&self, id: Uuid) -> Result<Vec<u8>, ClientError> {
        self.download(&format!("{SHOPPING_LISTS}/{id}/export/pdf")).await
    }

    pub async fn export_text(&self, id: Uuid) -> Result<String, ClientError> {
        let bytes = self
            .download(&format!("{SHOPPING_LISTS}/{id}/export/text"))
            .await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
