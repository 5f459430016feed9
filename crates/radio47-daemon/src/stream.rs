//! Stream endpoint resolution. The daemon never consumes the audio itself;
//! it only answers "which URL should a player use right now", trying the
//! primary endpoint and then one shot at the fallback.

use anyhow::Context;
use radio47_core::config::StreamConfig;
use std::time::Duration;
use tracing::warn;

pub fn http_client(probe_timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("radio47d/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(probe_timeout_secs))
        .timeout(Duration::from_secs(probe_timeout_secs))
        .build()
        .context("failed to build http client")
}

/// Pick the stream endpoint a player should consume. `None` means neither
/// endpoint answered; the caller degrades silently (log, error status, no
/// dialog).
pub async fn resolve_stream_url(
    client: &reqwest::Client,
    stream: &StreamConfig,
) -> Option<String> {
    match probe(client, &stream.url).await {
        Ok(()) => return Some(stream.url.clone()),
        Err(e) => warn!("primary stream {} unavailable: {e:#}", stream.url),
    }
    match probe(client, &stream.fallback_url).await {
        Ok(()) => Some(stream.fallback_url.clone()),
        Err(e) => {
            warn!("fallback stream {} unavailable: {e:#}", stream.fallback_url);
            None
        }
    }
}

/// A live stream answers with headers long before the body ends; dropping
/// the response right after the status line is the whole check.
async fn probe(client: &reqwest::Client, url: &str) -> anyhow::Result<()> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("status {}", response.status());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_builds() {
        assert!(http_client(5).is_ok());
    }

    #[tokio::test]
    #[ignore = "network diagnostic; run explicitly with --ignored --nocapture"]
    async fn probe_configured_endpoints() {
        let stream = StreamConfig::default();
        let client = http_client(stream.probe_timeout_secs).unwrap();
        let resolved = resolve_stream_url(&client, &stream).await;
        println!("resolved stream endpoint: {:?}", resolved);
    }
}
