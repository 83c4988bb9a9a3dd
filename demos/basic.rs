//! Basic usage example with the mock backend.

use vault_aws_credential_protocol::backends::mock::MockBackend;
use vault_aws_credential_protocol::{Config, CredentialCache, CredentialProvider, Freshness};

#[tokio::main]
async fn main() -> vault_aws_credential_protocol::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = Config::new("aws", "deploy").with_session_name("demo");
    config.validate()?;

    let cache = CredentialCache::new(dir.path());
    let provider = CredentialProvider::new(MockBackend::new()).with_cache(cache.clone());

    println!("Fetching credentials for {}...", config.role_path());
    let first = provider.fetch(&config).await?;
    println!("Issued: {}", first.to_json()?);
    println!("Cache entry: {}", cache.entry_path(config.cache_key()).display());

    let second = provider.fetch(&config).await?;
    assert_eq!(first, second);
    println!("Second fetch served from cache ({} backend call)", provider.backend().call_count());

    let freshness = second.freshness_at(chrono::Utc::now())?;
    assert_eq!(freshness, Freshness::Fresh);
    println!("Freshness: {:?}", freshness);

    cache.clear().await?;
    provider.fetch(&config).await?;
    println!("After clear: {} backend calls", provider.backend().call_count());

    Ok(())
}
