//! Profiles command implementation.

use crate::cli::{ProfilesAction, ProfilesArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use docweave_catalog::ProfileMetadata;
use docweave_domain::{DocweaveError, ExtractionProfile, ProfileResolver};
use docweave_sdk::{ClientMode, DocweaveClient, SdkConfig};
use std::collections::BTreeMap;

/// Execute the profiles command.
pub async fn execute_profiles(
    args: ProfilesArgs,
    client: &DocweaveClient,
    formatter: &Formatter,
) -> Result<()> {
    let text = match args.action {
        ProfilesAction::List {
            include_versions: true,
            prefix,
        } => {
            let versions = client.list_profiles_with_versions(prefix.as_deref()).await?;
            formatter.format_versions(&versions)?
        }
        ProfilesAction::List { prefix, .. } => {
            let mut names = client.list_profiles().await?;
            if let Some(prefix) = prefix.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
                names.retain(|name| name.starts_with(prefix));
            }
            formatter.format_profiles(&names)?
        }
        ProfilesAction::Show { name } => {
            if client.mode() == ClientMode::Remote {
                eprintln!("{}", formatter.warning("Showing the profile from the local store"));
            }
            let (profile, metadata) = show_profile(client.config(), name).await?;
            formatter.format_profile(&profile, metadata.as_ref())?
        }
        ProfilesAction::Versions { base } => {
            let versions = profile_versions(client, &base).await?;
            formatter.format_versions(&versions)?
        }
    };
    println!("{}", text);
    Ok(())
}

/// Resolve one profile through the configured store and the built-ins,
/// with fresh store metadata when the profile is a stored one.
///
/// Always reads the local store, also in remote mode: the service has no
/// single-profile endpoint.
async fn show_profile(
    config: &SdkConfig,
    name: String,
) -> Result<(ExtractionProfile, Option<ProfileMetadata>)> {
    let resolver = config.resolver();
    tokio::task::spawn_blocking(move || {
        let profile = resolver.load(&name)?;
        let metadata = resolver
            .store()
            .and_then(|store| store.profile_metadata(&name).ok());
        Ok::<_, DocweaveError>((profile, metadata))
    })
    .await
    .map_err(|e| CliError::InvalidInput(format!("Profile lookup failed: {}", e)))?
    .map_err(CliError::from)
}

/// Versions of exactly one stored base.
async fn profile_versions(
    client: &DocweaveClient,
    base: &str,
) -> Result<BTreeMap<String, Vec<String>>> {
    let base = base.trim().trim_matches('/');
    let mut listing = client.list_profiles_with_versions(Some(base)).await?;
    listing.retain(|name, _| name == base);
    if listing.is_empty() {
        return Err(DocweaveError::Profile(format!(
            "No versions found for profile path '{}'",
            base
        ))
        .into());
    }
    Ok(listing)
}
