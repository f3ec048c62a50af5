use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the authentication service (login, tokens, sessions).
    pub auth_base_url: Url,
    /// Base URL of the document service (upload, ask-question).
    pub docs_base_url: Url,
    /// Overall request timeout in seconds, refresh and retry included.
    /// Set via LEXIA_TIMEOUT_SECS. Default: 60.
    pub timeout_secs: u64,
    /// Connect timeout in seconds. Set via LEXIA_CONNECT_TIMEOUT_SECS.
    /// Default: 5.
    pub connect_timeout_secs: u64,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let auth_base_url = std::env::var("LEXIA_AUTH_URL")
        .unwrap_or_else(|_| "http://localhost:8000".into())
        .parse::<Url>()
        .map_err(|e| anyhow::anyhow!("LEXIA_AUTH_URL is not a valid URL: {}", e))?;
    let docs_base_url = std::env::var("LEXIA_DOCS_URL")
        .unwrap_or_else(|_| "http://localhost:8001".into())
        .parse::<Url>()
        .map_err(|e| anyhow::anyhow!("LEXIA_DOCS_URL is not a valid URL: {}", e))?;

    if auth_base_url.cannot_be_a_base() || docs_base_url.cannot_be_a_base() {
        anyhow::bail!("service base URLs must be absolute http(s) URLs");
    }

    Ok(Config {
        auth_base_url,
        docs_base_url,
        timeout_secs: std::env::var("LEXIA_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60),
        connect_timeout_secs: std::env::var("LEXIA_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5),
    })
}

impl Config {
    /// Config pointing both bases at explicit URLs. Used by tests and
    /// embedders that don't read the environment.
    pub fn with_bases(auth_base_url: Url, docs_base_url: Url) -> Self {
        Config {
            auth_base_url,
            docs_base_url,
            timeout_secs: 60,
            connect_timeout_secs: 5,
        }
    }
}
