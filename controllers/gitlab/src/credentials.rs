//! Provider configuration resolution.
//!
//! Turns `spec.providerConfigRef` into a per-tick [`Session`] and records a
//! ProviderConfigUsage so the ProviderConfig is not removed while referenced.

use crate::error::ControllerError;
use crate::store::ClusterStore;
use crds::{
    AuthMethod, CredentialsSource, ManagedResource, PROVIDER_CONFIG_LABEL, ProviderConfigReference,
    ProviderConfigUsage, ProviderConfigUsageSpec, TypedReference,
};
use gitlab_client::{Auth, GitLabClient, GitLabClientTrait};
use kube::ResourceExt;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Authenticated connection settings for one tick; never stored
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// GitLab base URL from the ProviderConfig
    pub base_url: String,
    /// Token and how to present it
    pub auth: Auth,
    /// Accept invalid TLS certificates
    pub insecure_skip_verify: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .finish()
    }
}

/// Payload of a BasicAuth credentials secret
#[derive(Deserialize)]
struct BasicCredentials {
    username: String,
    password: String,
}

/// Name of the ProviderConfigUsage recording that `obj` uses its ProviderConfig
pub fn usage_name<K: ManagedResource>(obj: &K) -> String {
    let kind = K::kind(&()).to_lowercase();
    match obj.meta().uid.as_deref() {
        Some(uid) if !uid.is_empty() => format!("{}-{}", kind, uid),
        _ => format!(
            "{}-{}-{}",
            kind,
            obj.namespace().unwrap_or_default(),
            obj.name_any()
        ),
    }
}

/// Build the usage record linking `obj` to `provider_config`
pub fn usage_for<K: ManagedResource>(obj: &K, provider_config: &str) -> ProviderConfigUsage {
    let mut usage = ProviderConfigUsage::new(
        &usage_name(obj),
        ProviderConfigUsageSpec {
            provider_config_ref: ProviderConfigReference {
                name: provider_config.to_string(),
            },
            resource_ref: TypedReference {
                api_version: K::api_version(&()).to_string(),
                kind: K::kind(&()).to_string(),
                name: obj.name_any(),
                namespace: obj.namespace().unwrap_or_default(),
                uid: obj.meta().uid.clone(),
            },
        },
    );
    usage
        .labels_mut()
        .insert(PROVIDER_CONFIG_LABEL.to_string(), provider_config.to_string());
    usage
}

/// Resolve the session for `obj`, recording usage when `record_usage` is set
pub async fn resolve_session<K: ManagedResource>(
    cluster: &dyn ClusterStore,
    obj: &K,
    record_usage: bool,
) -> Result<Session, ControllerError> {
    let config_name = obj
        .resource_spec()
        .provider_config_ref
        .as_ref()
        .map(|r| r.name.clone())
        .filter(|n| !n.is_empty())
        .ok_or(ControllerError::ConfigMissing)?;

    let config = cluster
        .provider_config(&config_name)
        .await?
        .ok_or_else(|| ControllerError::ConfigNotFound(config_name.clone()))?;

    if record_usage {
        cluster
            .apply_usage(&usage_for(obj, &config_name))
            .await
            .map_err(ControllerError::KubeUpdateFailed)?;
    }

    let credentials = &config.spec.credentials;
    if credentials.source != CredentialsSource::Secret {
        return Err(ControllerError::UnsupportedCredentialSource(format!(
            "{:?}",
            credentials.source
        )));
    }
    let selector = credentials.secret_ref.as_ref().ok_or_else(|| {
        ControllerError::Credentials(format!(
            "provider config {} has no credentials.secretRef",
            config_name
        ))
    })?;

    let data = cluster
        .secret_data(&selector.namespace, &selector.name)
        .await?
        .ok_or_else(|| {
            ControllerError::Credentials(format!(
                "secret {}/{} not found",
                selector.namespace, selector.name
            ))
        })?;
    let payload = data.get(&selector.key).ok_or_else(|| {
        ControllerError::Credentials(format!(
            "secret {}/{} has no key {}",
            selector.namespace, selector.name, selector.key
        ))
    })?;

    let auth = auth_from_payload(config.spec.auth_method, payload)?;
    debug!(
        "Resolved provider config {} ({:?}) for {}",
        config_name,
        config.spec.auth_method,
        obj.name_any()
    );

    Ok(Session {
        base_url: config.spec.base_url.clone(),
        auth,
        insecure_skip_verify: config.spec.insecure_skip_verify.unwrap_or(false),
    })
}

fn auth_from_payload(method: AuthMethod, payload: &[u8]) -> Result<Auth, ControllerError> {
    if method == AuthMethod::BasicAuth {
        let basic: BasicCredentials = serde_json::from_slice(payload).map_err(|e| {
            ControllerError::Credentials(format!(
                "BasicAuth credentials must be JSON {{\"username\", \"password\"}}: {}",
                e
            ))
        })?;
        return Ok(Auth::Basic {
            username: basic.username,
            password: basic.password,
        });
    }

    let token = std::str::from_utf8(payload)
        .map_err(|_| ControllerError::Credentials("token is not valid UTF-8".to_string()))?
        .trim()
        .to_string();
    if token.is_empty() {
        return Err(ControllerError::Credentials("token is empty".to_string()));
    }
    Ok(match method {
        AuthMethod::JobToken => Auth::JobToken(token),
        AuthMethod::OAuthToken => Auth::OAuth(token),
        AuthMethod::PersonalAccessToken | AuthMethod::BasicAuth => Auth::PrivateToken(token),
    })
}

/// Builds GitLab clients from sessions
pub trait ClientFactory: Send + Sync {
    /// Client authenticated as `session`
    fn client(&self, session: &Session) -> Result<Arc<dyn GitLabClientTrait>, ControllerError>;
}

/// Builds HTTP clients
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpClientFactory;

impl HttpClientFactory {
    /// HTTP client for `session`, accepting invalid certificates only when the session asks for it
    pub fn http_client(session: &Session) -> Result<GitLabClient, ControllerError> {
        GitLabClient::new(
            &session.base_url,
            session.auth.clone(),
            session.insecure_skip_verify,
        )
        .map_err(|e| ControllerError::Credentials(format!("cannot build GitLab client: {}", e)))
    }
}

impl ClientFactory for HttpClientFactory {
    fn client(&self, session: &Session) -> Result<Arc<dyn GitLabClientTrait>, ControllerError> {
        Ok(Arc::new(Self::http_client(session)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryCluster, group, provider_config};
    use crds::CredentialsSource;

    #[tokio::test]
    async fn test_personal_access_token_session() {
        let cluster = MemoryCluster::default();
        cluster.add_provider_config(provider_config("default", AuthMethod::PersonalAccessToken));
        cluster.add_secret("crossplane", "gitlab", &[("token", "glpat-abc\n")]);

        let obj = group("team", "default");
        let session = resolve_session(&cluster, &obj, true).await.unwrap();

        assert_eq!(session.auth, Auth::PrivateToken("glpat-abc".to_string()));
        assert_eq!(session.base_url, "https://gitlab.example.com/");
        assert!(!session.insecure_skip_verify);
        assert!(!format!("{:?}", session).contains("glpat-abc"));

        let usages = cluster.usages();
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].spec.provider_config_ref.name, "default");
        assert_eq!(usages[0].spec.resource_ref.kind, "Group");
        assert_eq!(
            usages[0].labels().get(PROVIDER_CONFIG_LABEL).map(String::as_str),
            Some("default")
        );
    }

    #[tokio::test]
    async fn test_insecure_skip_verify_reaches_client() {
        for (requested, expected) in [(Some(true), true), (Some(false), false), (None, false)] {
            let cluster = MemoryCluster::default();
            let mut config = provider_config("default", AuthMethod::PersonalAccessToken);
            config.spec.insecure_skip_verify = requested;
            cluster.add_provider_config(config);
            cluster.add_secret("crossplane", "gitlab", &[("token", "t")]);

            let session = resolve_session(&cluster, &group("team", "default"), false)
                .await
                .unwrap();
            assert_eq!(session.insecure_skip_verify, expected);

            let client = HttpClientFactory::http_client(&session).unwrap();
            assert_eq!(client.insecure_skip_verify(), expected);
            assert_eq!(GitLabClientTrait::base_url(&client), session.base_url);
        }
    }

    #[tokio::test]
    async fn test_usage_is_idempotent() {
        let cluster = MemoryCluster::default();
        cluster.add_provider_config(provider_config("default", AuthMethod::PersonalAccessToken));
        cluster.add_secret("crossplane", "gitlab", &[("token", "t")]);

        let obj = group("team", "default");
        resolve_session(&cluster, &obj, true).await.unwrap();
        resolve_session(&cluster, &obj, true).await.unwrap();
        assert_eq!(cluster.usages().len(), 1);
    }

    #[tokio::test]
    async fn test_basic_auth_reads_json() {
        let cluster = MemoryCluster::default();
        cluster.add_provider_config(provider_config("default", AuthMethod::BasicAuth));
        cluster.add_secret(
            "crossplane",
            "gitlab",
            &[("token", r#"{"username":"root","password":"hunter2"}"#)],
        );

        let session = resolve_session(&cluster, &group("team", "default"), false)
            .await
            .unwrap();
        assert_eq!(
            session.auth,
            Auth::Basic {
                username: "root".to_string(),
                password: "hunter2".to_string()
            }
        );
        assert!(cluster.usages().is_empty());
    }

    #[tokio::test]
    async fn test_basic_auth_rejects_raw_token() {
        let cluster = MemoryCluster::default();
        cluster.add_provider_config(provider_config("default", AuthMethod::BasicAuth));
        cluster.add_secret("crossplane", "gitlab", &[("token", "glpat-abc")]);

        let err = resolve_session(&cluster, &group("team", "default"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Credentials(_)));
    }

    #[tokio::test]
    async fn test_job_and_oauth_tokens() {
        for (method, expected) in [
            (AuthMethod::JobToken, Auth::JobToken("t".to_string())),
            (AuthMethod::OAuthToken, Auth::OAuth("t".to_string())),
        ] {
            let cluster = MemoryCluster::default();
            cluster.add_provider_config(provider_config("default", method));
            cluster.add_secret("crossplane", "gitlab", &[("token", "t")]);
            let session = resolve_session(&cluster, &group("team", "default"), false)
                .await
                .unwrap();
            assert_eq!(session.auth, expected);
        }
    }

    #[tokio::test]
    async fn test_missing_and_dangling_config() {
        let cluster = MemoryCluster::default();

        let mut obj = group("team", "default");
        obj.spec.resource_spec.provider_config_ref = None;
        let err = resolve_session(&cluster, &obj, true).await.unwrap_err();
        assert!(matches!(err, ControllerError::ConfigMissing));

        let err = resolve_session(&cluster, &group("team", "nope"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::ConfigNotFound(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_only_secret_source_is_supported() {
        let cluster = MemoryCluster::default();
        let mut config = provider_config("default", AuthMethod::PersonalAccessToken);
        config.spec.credentials.source = CredentialsSource::Environment;
        cluster.add_provider_config(config);

        let err = resolve_session(&cluster, &group("team", "default"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::UnsupportedCredentialSource(_)));
        assert_eq!(err.reason(), "UnsupportedCredentialSource");
    }

    #[tokio::test]
    async fn test_missing_secret_key() {
        let cluster = MemoryCluster::default();
        cluster.add_provider_config(provider_config("default", AuthMethod::PersonalAccessToken));
        cluster.add_secret("crossplane", "gitlab", &[("other", "t")]);

        let err = resolve_session(&cluster, &group("team", "default"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::Credentials(msg) if msg.contains("no key token")));
    }

    #[test]
    fn test_usage_name_prefers_uid() {
        let mut obj = group("team", "default");
        assert_eq!(usage_name(&obj), "group-default-team");
        obj.metadata.uid = Some("0b1c".to_string());
        assert_eq!(usage_name(&obj), "group-0b1c");
    }
}
