//! Clerk Backend API client
//!
//! Authenticates with the instance secret key as a bearer token. Non-2xx
//! responses become errors carrying the status and response body.

use super::models::{ClerkUser, IdentityAccount, Invitation};
use super::traits::IdentityProvider;
use crate::users::Role;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

/// Production Backend API base URL
pub const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com/v1";

pub struct ClerkClient {
    api_url: String,
    secret_key: String,
    http_client: reqwest::Client,
}

impl ClerkClient {
    /// Create a client; `api_url` defaults to [`DEFAULT_CLERK_API_URL`]
    pub fn new(secret_key: impl Into<String>, api_url: Option<String>) -> Self {
        let api_url = api_url
            .unwrap_or_else(|| DEFAULT_CLERK_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self {
            api_url,
            secret_key: secret_key.into(),
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

async fn ensure_success(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "no body".to_string());
        bail!("Clerk {} failed ({}): {}", action, status, body);
    }
    Ok(response)
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn set_role(&self, external_id: &str, role: Role) -> Result<()> {
        let response = self
            .http_client
            .patch(self.url(&format!("/users/{}/metadata", external_id)))
            .bearer_auth(&self.secret_key)
            .json(&json!({ "public_metadata": { "role": role.as_str() } }))
            .send()
            .await
            .context("Failed to reach Clerk")?;
        ensure_success(response, "metadata update").await?;
        tracing::debug!("Set Clerk role of {} to {}", external_id, role);
        Ok(())
    }

    async fn get_user(&self, external_id: &str) -> Result<Option<IdentityAccount>> {
        let response = self
            .http_client
            .get(self.url(&format!("/users/{}", external_id)))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .context("Failed to reach Clerk")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let user: ClerkUser = ensure_success(response, "user fetch")
            .await?
            .json()
            .await
            .context("Failed to parse Clerk user")?;
        Ok(Some(user.into()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<IdentityAccount>> {
        let response = self
            .http_client
            .get(self.url("/users"))
            .bearer_auth(&self.secret_key)
            .query(&[("email_address", email)])
            .send()
            .await
            .context("Failed to reach Clerk")?;
        let users: Vec<ClerkUser> = ensure_success(response, "user lookup")
            .await?
            .json()
            .await
            .context("Failed to parse Clerk user list")?;
        Ok(users.into_iter().next().map(IdentityAccount::from))
    }

    async fn create_invitation(
        &self,
        email: &str,
        role: Role,
        redirect_url: Option<&str>,
    ) -> Result<Invitation> {
        let mut body = json!({
            "email_address": email,
            "public_metadata": { "role": role.as_str() },
        });
        if let Some(url) = redirect_url {
            body["redirect_url"] = json!(url);
        }
        let response = self
            .http_client
            .post(self.url("/invitations"))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach Clerk")?;
        let invitation: Invitation = ensure_success(response, "invitation")
            .await?
            .json()
            .await
            .context("Failed to parse Clerk invitation")?;
        tracing::info!("Invited {} as {}", email, role);
        Ok(invitation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SECRET: &str = "sk_test_123";

    fn client(server: &MockServer) -> ClerkClient {
        ClerkClient::new(SECRET, Some(format!("{}/", server.uri())))
    }

    fn clerk_user(id: &str, email: &str, role: &str) -> serde_json::Value {
        json!({
            "id": id,
            "email_addresses": [{"id": "idn_1", "email_address": email}],
            "primary_email_address_id": "idn_1",
            "first_name": "Grace",
            "last_name": "Hopper",
            "image_url": "",
            "public_metadata": {"role": role}
        })
    }

    #[tokio::test]
    async fn test_set_role_patches_public_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/users/user_1/metadata"))
            .and(header("authorization", format!("Bearer {}", SECRET).as_str()))
            .and(body_json(json!({"public_metadata": {"role": "editor"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(clerk_user("user_1", "g@studio.test", "editor")))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).set_role("user_1", Role::Editor).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_role_failure_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/users/user_1/metadata"))
            .respond_with(ResponseTemplate::new(422).set_body_string("unprocessable"))
            .mount(&server)
            .await;

        let err = client(&server)
            .set_role("user_1", Role::Admin)
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("422"), "{}", err);
        assert!(err.contains("unprocessable"), "{}", err);
    }

    #[tokio::test]
    async fn test_get_user_maps_account_and_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/user_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(clerk_user("user_1", "g@studio.test", "admin")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/user_missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
            .mount(&server)
            .await;

        let client = client(&server);
        let account = client.get_user("user_1").await.unwrap().unwrap();
        assert_eq!(account.email, "g@studio.test");
        assert_eq!(account.name, "Grace Hopper");
        assert_eq!(account.role, Some(Role::Admin));
        assert_eq!(account.image_url, None);

        assert!(client.get_user("user_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_user_by_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("email_address", "g@studio.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([clerk_user("user_1", "g@studio.test", "viewer")])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(query_param("email_address", "nobody@studio.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client(&server);
        let found = client.find_user_by_email("g@studio.test").await.unwrap().unwrap();
        assert_eq!(found.external_id, "user_1");
        assert!(client.find_user_by_email("nobody@studio.test").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_invitation_sends_role_claim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/invitations"))
            .and(body_json(json!({
                "email_address": "new@studio.test",
                "public_metadata": {"role": "editor"},
                "redirect_url": "https://studio.test/admin"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "inv_1",
                "email_address": "new@studio.test",
                "status": "pending"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let invitation = client(&server)
            .create_invitation("new@studio.test", Role::Editor, Some("https://studio.test/admin"))
            .await
            .unwrap();
        assert_eq!(invitation.id, "inv_1");
        assert_eq!(invitation.status, "pending");
    }
}
