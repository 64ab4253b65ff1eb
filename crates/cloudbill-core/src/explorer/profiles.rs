//! Credential profile discovery
//!
//! Each profile of the shared credentials file is one account. Parsing is
//! left to the aws-config profile loader, so the names found here are exactly
//! the names `profile_name()` resolves later. Credentials-file sections are
//! read literally: `[profile prod]` is not the same account as `[prod]`.

use std::path::Path;

use aws_config::profile::ProfileSet;
use aws_runtime::env_config::file::{EnvConfigFileKind, EnvConfigFiles};
use aws_types::os_shim_internal::{Env, Fs};
use cloudbill_common::{CloudBillError, Result};
use tracing::info;

/// Profile file set made of the given credentials file only
pub fn credentials_file(path: &Path) -> EnvConfigFiles {
    EnvConfigFiles::builder()
        .include_default_config_file(false)
        .include_default_credentials_file(false)
        .with_file(EnvConfigFileKind::Credentials, path)
        .build()
}

/// Profile names in sorted order
pub fn profile_names(profiles: &ProfileSet) -> Vec<String> {
    let mut names: Vec<String> = profiles.profiles().map(str::to_string).collect();
    names.sort();
    names
}

/// Load a credentials file and list its profiles. An empty list is an error.
pub async fn load_profiles(path: &Path) -> Result<Vec<String>> {
    discover(&Fs::real(), &Env::real(), path).await
}

async fn load_profile_set(fs: &Fs, env: &Env, path: &Path) -> Result<ProfileSet> {
    aws_config::profile::load(fs, env, &credentials_file(path), None)
        .await
        .map_err(|e| {
            CloudBillError::Config(format!(
                "cannot load credentials file {}: {e}",
                path.display()
            ))
        })
}

async fn discover(fs: &Fs, env: &Env, path: &Path) -> Result<Vec<String>> {
    let profiles = profile_names(&load_profile_set(fs, env, path).await?);
    if profiles.is_empty() {
        return Err(CloudBillError::Config(format!(
            "no profiles found in {}",
            path.display()
        )));
    }

    for profile in &profiles {
        info!(account = %profile, "Discovered account profile");
    }
    Ok(profiles)
}
