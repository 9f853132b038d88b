use thiserror::Error;
use url::Url;

/// Errors for a configured backend base URL.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BaseUrlError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("Base URL has no host")]
    MissingHost,
    #[error("Base URL must not carry a query string or fragment")]
    HasQuery,
}

/// Parse a backend base URL and normalise it so endpoint paths join beneath it.
///
/// The returned URL always ends with `/`, so `https://shop.example/admin`
/// becomes `https://shop.example/admin/` and `join("api/...")` keeps the
/// `/admin` prefix.
///
/// ```
/// use catalog_admin::util::parse_base_url;
///
/// let url = parse_base_url("https://shop.example/admin").unwrap();
/// assert_eq!(url.as_str(), "https://shop.example/admin/");
/// assert!(parse_base_url("ftp://shop.example").is_err());
/// ```
pub fn parse_base_url(raw: &str) -> Result<Url, BaseUrlError> {
    let mut url = Url::parse(raw.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(BaseUrlError::UnsupportedScheme(scheme.to_owned())),
    }

    let host = url.host_str().ok_or(BaseUrlError::MissingHost)?.to_owned();

    if url.query().is_some() || url.fragment().is_some() {
        return Err(BaseUrlError::HasQuery);
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    if url.scheme() == "http" && !is_loopback(&host) {
        tracing::warn!(base_url = %url, "Using plain HTTP for a non-local backend");
    }

    Ok(url)
}

fn is_loopback(host: &str) -> bool {
    host == "localhost"
        || host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
}
