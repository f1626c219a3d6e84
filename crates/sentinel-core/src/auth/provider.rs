use url::Url;

/// Identity provider settings shared by both token exchangers.
///
/// Required fields are constructor parameters; optional ones are set by
/// chaining. Immutable once built and shared behind an `Arc`.
///
/// ```rust,ignore
/// let provider = ProviderConfig::new(authority, "database-sentinel", "database-sentinel-ui")
///     .with_redirect_uri("http://localhost:46421".parse()?);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    authority: Url,
    realm: String,
    client_id: String,
    redirect_uri: Option<Url>,
    scopes: Vec<String>,
    audience: Option<String>,
}

impl ProviderConfig {
    /// Create provider settings with the default scopes (`openid profile`).
    #[must_use]
    pub fn new(authority: Url, realm: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            authority,
            realm: realm.into(),
            client_id: client_id.into(),
            redirect_uri: None,
            scopes: vec!["openid".into(), "profile".into()],
            audience: None,
        }
    }

    /// Loopback redirect URI used by the interactive flow.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: Url) -> Self {
        self.redirect_uri = Some(uri);
        self
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn authority(&self) -> &Url {
        &self.authority
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> Option<&Url> {
        self.redirect_uri.as_ref()
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    /// Realm issuer, `{authority}/realms/{realm}`.
    pub fn issuer(&self) -> Url {
        self.realm_url(&[])
    }

    /// Password-grant token endpoint.
    pub fn token_endpoint(&self) -> Url {
        self.realm_url(&["protocol", "openid-connect", "token"])
    }

    /// OIDC discovery document for the realm.
    pub fn discovery_url(&self) -> Url {
        self.realm_url(&[".well-known", "openid-configuration"])
    }

    fn realm_url(&self, tail: &[&str]) -> Url {
        let mut url = self.authority.clone();
        url.set_query(None);
        url.set_fragment(None);
        // Only cannot-be-a-base URLs refuse segment edits; those are left as-is.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["realms", self.realm.as_str()])
                .extend(tail);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(authority: &str) -> ProviderConfig {
        ProviderConfig::new(authority.parse().unwrap(), "database-sentinel", "ui")
    }

    #[test]
    fn test_endpoints_from_bare_authority() {
        let provider = provider("https://localhost:8443");

        assert_eq!(
            provider.issuer().as_str(),
            "https://localhost:8443/realms/database-sentinel"
        );
        assert_eq!(
            provider.token_endpoint().as_str(),
            "https://localhost:8443/realms/database-sentinel/protocol/openid-connect/token"
        );
        assert_eq!(
            provider.discovery_url().as_str(),
            "https://localhost:8443/realms/database-sentinel/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_endpoints_keep_authority_path_prefix() {
        let provider = provider("https://sso.example.com/auth/");

        assert_eq!(
            provider.token_endpoint().as_str(),
            "https://sso.example.com/auth/realms/database-sentinel/protocol/openid-connect/token"
        );
    }

    #[test]
    fn test_defaults_and_overrides() {
        let provider = provider("https://localhost:8443");
        assert_eq!(provider.scopes(), &["openid", "profile"]);
        assert!(provider.redirect_uri().is_none());
        assert!(provider.audience().is_none());

        let provider = provider
            .with_scopes(vec!["openid".into()])
            .with_audience("api")
            .with_redirect_uri("http://localhost:46421".parse().unwrap());
        assert_eq!(provider.scopes(), &["openid"]);
        assert_eq!(provider.audience(), Some("api"));
        assert_eq!(
            provider.redirect_uri().map(Url::as_str),
            Some("http://localhost:46421/")
        );
    }
}
