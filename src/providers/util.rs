use anyhow::{Result, anyhow};
use reqwest::{Client, Response, Url};
use std::time::Duration;

pub const USER_AGENT: &str = "coinpayroll/1.0";

/// Builds a client whose every request is bounded by `timeout_secs`.
pub fn http_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Joins `base_url` and `path` and appends the query parameters.
pub fn endpoint(base_url: &str, path: &str, params: &[(&str, String)]) -> Result<Url> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    Url::parse_with_params(&raw, params).map_err(|e| anyhow!("Invalid URL {}: {}", raw, e))
}

/// Turns non-2xx responses into errors carrying the status.
pub fn ensure_success(response: Response, context: &str) -> Result<Response> {
    if !response.status().is_success() {
        return Err(anyhow!("HTTP error: {} for {}", response.status(), context));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_and_encodes() {
        let url = endpoint(
            "http://localhost:8080/",
            "/api/v3/simple/price",
            &[("ids", "bitcoin,ethereum".to_string()), ("vs_currencies", "usd".to_string())],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/v3/simple/price?ids=bitcoin%2Cethereum&vs_currencies=usd"
        );
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        assert!(endpoint("not a url", "/x", &[]).is_err());
    }
}
