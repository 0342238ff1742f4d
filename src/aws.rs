//! AWS session settings
//!
//! Credentials are resolved from an explicit [`AwsSettings`] value that is
//! passed to [`load_sdk_config`]. Nothing here is process-global.

use std::fmt;
use std::time::Duration;

use aws_config::retry::RetryConfig;
use aws_config::sts::AssumeRoleProvider;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_bedrockruntime::config::{Credentials, Region};
use tracing::info;

/// STS session name used when assuming a role
pub const ASSUME_ROLE_SESSION_NAME: &str = "AssumeRoleSession";

const PROVIDER_NAME: &str = "meteo-agent";

/// Cloud credential parameters supplied at startup
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AwsSettings {
    /// Role ARN to assume through STS
    pub assume_role: Option<String>,
    pub region: Option<String>,
    pub profile_name: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSettings")
            .field("assume_role", &self.assume_role)
            .field("region", &self.region)
            .field("profile_name", &self.profile_name)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct StaticKeys {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for StaticKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticKeys")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

impl StaticKeys {
    fn credentials(&self) -> Credentials {
        Credentials::new(
            &self.access_key_id,
            &self.secret_access_key,
            None,
            None,
            PROVIDER_NAME,
        )
    }
}

/// Where the session gets its credentials from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Assume a role; `base` signs the STS call, or the default chain when absent
    AssumeRole {
        role_arn: String,
        base: Option<StaticKeys>,
    },
    Profile(String),
    StaticKeys(StaticKeys),
    DefaultChain,
}

impl AwsSettings {
    fn static_keys(&self) -> Option<StaticKeys> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Some(StaticKeys {
                access_key_id: id.clone(),
                secret_access_key: secret.clone(),
            }),
            _ => None,
        }
    }

    /// Resolve the credential source: assumed role, then profile, then static
    /// keys, then the default provider chain.
    pub fn credential_source(&self) -> CredentialSource {
        if let Some(role_arn) = &self.assume_role {
            return CredentialSource::AssumeRole {
                role_arn: role_arn.clone(),
                base: self.static_keys(),
            };
        }
        if let Some(profile) = &self.profile_name {
            return CredentialSource::Profile(profile.clone());
        }
        match self.static_keys() {
            Some(keys) => CredentialSource::StaticKeys(keys),
            None => CredentialSource::DefaultChain,
        }
    }
}

/// Timeouts and retries for the model client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTuning {
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    /// Total attempts including the first call
    pub max_attempts: u32,
}

impl Default for ClientTuning {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(60),
            max_attempts: 5,
        }
    }
}

impl ClientTuning {
    fn timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig::builder()
            .read_timeout(self.read_timeout)
            .connect_timeout(self.connect_timeout)
            .build()
    }

    fn retry_config(&self) -> RetryConfig {
        RetryConfig::standard().with_max_attempts(self.max_attempts)
    }
}

/// Build the shared SDK configuration for the model client
pub async fn load_sdk_config(settings: &AwsSettings, tuning: &ClientTuning) -> SdkConfig {
    let region = settings.region.clone().map(Region::new);

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .timeout_config(tuning.timeout_config())
        .retry_config(tuning.retry_config());
    if let Some(region) = &region {
        loader = loader.region(region.clone());
    }

    let source = settings.credential_source();
    match source {
        CredentialSource::AssumeRole { role_arn, base } => {
            info!(role = %role_arn, "Assuming AWS role");
            let mut builder =
                AssumeRoleProvider::builder(role_arn).session_name(ASSUME_ROLE_SESSION_NAME);
            if let Some(region) = region {
                builder = builder.region(region);
            }
            let provider = match base {
                Some(keys) => builder.build_from_provider(keys.credentials()).await,
                None => builder.build().await,
            };
            loader = loader.credentials_provider(provider);
        }
        CredentialSource::Profile(profile) => {
            info!(profile = %profile, "Using AWS profile");
            loader = loader.profile_name(profile);
        }
        CredentialSource::StaticKeys(keys) => {
            info!("Using static AWS credentials");
            loader = loader.credentials_provider(keys.credentials());
        }
        CredentialSource::DefaultChain => {
            info!("Using default AWS credential chain");
        }
    }

    loader.load().await
}
