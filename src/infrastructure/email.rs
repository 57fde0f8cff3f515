use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::{
    application::services::mailer::ActivationMailer,
    domain::{
        errors::DomainError,
        models::Account,
        value_objects::{ActivationToken, SiteContext},
    },
};

/// Posts activation emails to an HTTP mail gateway.
pub struct HttpActivationMailer {
    http: Client,
    gateway_url: String,
}

impl HttpActivationMailer {
    pub fn new(gateway_url: String) -> Arc<dyn ActivationMailer> {
        Arc::new(Self {
            http: Client::builder()
                .user_agent("accounts-service/mailer")
                .build()
                .expect("failed to build mail client"),
            gateway_url,
        }) as Arc<dyn ActivationMailer>
    }
}

#[derive(Serialize)]
struct ActivationMessage<'a> {
    to: &'a str,
    subject: String,
    body: String,
}

#[async_trait]
impl ActivationMailer for HttpActivationMailer {
    async fn send_activation_email(
        &self,
        account: &Account,
        token: &ActivationToken,
        site: &SiteContext,
    ) -> Result<(), DomainError> {
        let message = ActivationMessage {
            to: &account.email,
            subject: format!("Activate your {} account", site.name),
            body: format!(
                "Hi {},\n\nFollow this link to activate your account:\n{}\n",
                account.first_name,
                site.activation_url(token)
            ),
        };

        let response = self
            .http
            .post(&self.gateway_url)
            .json(&message)
            .send()
            .await
            .map_err(|err| DomainError::Email(err.to_string()))?;

        if !response.status().is_success() {
            return Err(DomainError::Email(format!(
                "mail gateway returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Logs the activation link instead of sending it; for local runs without a
/// mail gateway.
pub struct NoopActivationMailer;

impl NoopActivationMailer {
    pub fn new() -> Arc<dyn ActivationMailer> {
        Arc::new(Self) as Arc<dyn ActivationMailer>
    }
}

#[async_trait]
impl ActivationMailer for NoopActivationMailer {
    async fn send_activation_email(
        &self,
        account: &Account,
        token: &ActivationToken,
        site: &SiteContext,
    ) -> Result<(), DomainError> {
        tracing::info!(
            email = %account.email,
            url = %site.activation_url(token),
            "skipping activation email delivery"
        );
        Ok(())
    }
}
