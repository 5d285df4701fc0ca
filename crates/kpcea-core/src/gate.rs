//! Promotion check entry point: credential, client, policy, loop.

use argocd_api::{ApiError, ArgoCdClient, ClientOptions};
use tracing::info;

use crate::auth::{Credential, CredentialProvider};
use crate::config::Config;
use crate::error::GateError;
use crate::policy::VerificationPolicy;
use crate::reconcile::{Outcome, PollSettings, ReconciliationLoop};
use crate::source::{SessionTransport, StatusSource};

/// Run a promotion check against the Argo CD server named in `config`.
pub async fn run_promotion_check(config: &Config) -> Result<Outcome, GateError> {
    let options = ClientOptions::new(&config.server)
        .insecure(config.insecure)
        .with_request_timeout(config.request_timeout);
    let client = ArgoCdClient::new(&options).map_err(GateError::ClientInit)?;
    info!(server = %client.base_url(), app = %config.app_name, "starting promotion check");

    run_with(config, &client, |credential| {
        Ok(client.clone().with_auth_token(credential.expose()))
    })
    .await
}

/// Run a promotion check with explicit collaborators.
///
/// `connect` builds the status source once a credential is available. An
/// auth failure returns before `connect` is called, so nothing is polled.
pub async fn run_with<S, F>(
    config: &Config,
    transport: &dyn SessionTransport,
    connect: F,
) -> Result<Outcome, GateError>
where
    S: StatusSource,
    F: FnOnce(&Credential) -> Result<S, ApiError>,
{
    let credential = CredentialProvider::new(transport).resolve(config).await?;
    let source = connect(&credential).map_err(GateError::ClientInit)?;

    let policy = VerificationPolicy::from_config(config);
    let outcome = ReconciliationLoop::new(
        &source,
        &policy,
        &config.app_name,
        PollSettings::from_config(config),
    )
    .run()
    .await?;

    Ok(outcome)
}
