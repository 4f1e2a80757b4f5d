use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{GitHubSettings, Scope};
use crate::discovery::{RepositoryDescriptor, RepositoryLister};
use crate::error::ListingError;

const USER_AGENT: &str = concat!("repovault/", env!("CARGO_PKG_VERSION"));

/// Largest `per_page` the API honors; bigger requests are silently capped
pub const MAX_PAGE_SIZE: u32 = 100;

/// Paginated repository listing against the GitHub REST API
pub struct GitHubLister {
    client: Client,
    api_url: String,
    page_size: u32,
}

/// The part of `GET /users/{name}` needed to pick the listing endpoint
#[derive(Debug, Deserialize)]
struct AccountInfo {
    #[serde(rename = "type")]
    kind: String,
}

impl GitHubLister {
    /// Create a lister with per-request timeouts from the settings
    pub fn new(settings: &GitHubSettings) -> Result<Self, ListingError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            page_size: settings.page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }

    /// Resolve the listing endpoint path for a scope
    async fn listing_path(&self, scope: &Scope, secret: Option<&str>) -> Result<String, ListingError> {
        match scope {
            Scope::AuthenticatedUser => Ok("/user/repos".to_string()),
            Scope::Account(name) => {
                let url = format!("{}/users/{}", self.api_url, name);
                let account: AccountInfo = self.get_json(&url, &[], scope, secret).await?;

                if account.kind == "Organization" {
                    debug!("{} is an organization", name);
                    Ok(format!("/orgs/{}/repos", name))
                } else {
                    Ok(format!("/users/{}/repos", name))
                }
            }
        }
    }

    /// Attach the credential matching the scope, if any
    fn authorize(&self, request: RequestBuilder, scope: &Scope, secret: Option<&str>) -> RequestBuilder {
        match (secret, scope) {
            (Some(secret), Scope::Account(name)) => request.basic_auth(name, Some(secret)),
            (Some(secret), Scope::AuthenticatedUser) => request.bearer_auth(secret),
            (None, _) => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        scope: &Scope,
        secret: Option<&str>,
    ) -> Result<T, ListingError> {
        let request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .query(query);

        let response = self.authorize(request, scope, secret).send().await?;
        let response = check_status(url, response).await?;
        let body = response.bytes().await?;

        serde_json::from_slice(&body).map_err(|source| ListingError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RepositoryLister for GitHubLister {
    async fn list(
        &self,
        scope: &Scope,
        secret: Option<String>,
    ) -> Result<Vec<RepositoryDescriptor>, ListingError> {
        let secret = secret.as_deref();
        let path = self.listing_path(scope, secret).await?;
        let url = format!("{}{}", self.api_url, path);

        debug!("Listing repositories from {}", url);

        let mut repositories = Vec::new();
        let mut page = 1u32;

        loop {
            let query = [
                ("per_page", self.page_size.to_string()),
                ("page", page.to_string()),
            ];

            let items: Vec<RepositoryDescriptor> = self
                .get_json(&url, &query, scope, secret)
                .await
                .map_err(|e| {
                    warn!("Failed to fetch repositories page {}: {}", page, e);
                    e
                })?;

            let count = items.len();
            repositories.extend(items);

            if count < self.page_size as usize {
                break;
            }
            page += 1;
        }

        info!("Found {} repositories across {} pages", repositories.len(), page);
        Ok(repositories)
    }
}

/// Map non-success responses onto the listing error taxonomy
async fn check_status(url: &str, response: Response) -> Result<Response, ListingError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let headers = response.headers();
    let remaining = header_value(headers, "x-ratelimit-remaining");
    let reset = header_value(headers, "x-ratelimit-reset").and_then(|v| v.parse().ok());
    let exhausted = remaining.as_deref() == Some("0");

    if status == StatusCode::TOO_MANY_REQUESTS || (status == StatusCode::FORBIDDEN && exhausted) {
        return Err(ListingError::RateLimit { reset });
    }

    let message = response
        .text()
        .await
        .unwrap_or_default()
        .trim()
        .to_string();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ListingError::Auth {
            status: status.as_u16(),
            message,
        }),
        _ => Err(ListingError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            message,
        }),
    }
}

fn header_value(headers: &header::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
