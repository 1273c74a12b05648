//! Provider catalog
//!
//! Identifiers and display labels of the authentication providers the
//! service knows about.

pub const GITHUB: &str = "github";
pub const GITLAB: &str = "gitlab";
pub const GOOGLE: &str = "google";
pub const GENERIC_OAUTH: &str = "generic_oauth";
pub const GRAFANA_COM: &str = "grafana_com";
pub const AZURE_AD: &str = "azuread";
pub const OKTA: &str = "okta";
pub const SAML: &str = "saml";
pub const LDAP: &str = "ldap";

/// OAuth providers in their canonical listing order.
pub const OAUTH_PROVIDERS: [&str; 7] = [
    GITHUB,
    GITLAB,
    GOOGLE,
    GENERIC_OAUTH,
    GRAFANA_COM,
    AZURE_AD,
    OKTA,
];

/// OAuth providers whose settings may be written by an administrator.
pub const CONFIGURABLE_OAUTH_PROVIDERS: [&str; 6] =
    [GITHUB, GITLAB, GOOGLE, GENERIC_OAUTH, AZURE_AD, OKTA];

/// Human-readable label for a provider identifier.
///
/// Unknown identifiers are returned unchanged.
pub fn label(provider: &str) -> String {
    match provider {
        GITHUB => "GitHub",
        GITLAB => "GitLab",
        GOOGLE => "Google",
        GENERIC_OAUTH => "Generic OAuth",
        GRAFANA_COM => "Grafana.com",
        AZURE_AD => "Azure AD",
        OKTA => "Okta",
        SAML => "SAML",
        LDAP => "LDAP",
        other => other,
    }
    .to_string()
}

/// Whether the identifier belongs to the OAuth family.
pub fn is_oauth(provider: &str) -> bool {
    OAUTH_PROVIDERS.contains(&provider)
}

/// Path segment used by the documentation site, e.g. `generic-oauth`.
pub fn docs_slug(provider: &str) -> String {
    provider.replace('_', "-")
}

/// Default provider universe for the given licensing and feature state.
pub fn default_universe(saml_enabled: bool, ldap_enabled: bool) -> Vec<String> {
    let mut providers: Vec<String> = OAUTH_PROVIDERS.iter().map(|p| p.to_string()).collect();
    if saml_enabled {
        providers.push(SAML.to_string());
    }
    if ldap_enabled {
        providers.push(LDAP.to_string());
    }
    providers
}
