use tanklog_core::config::ApiConfig;
use tanklog_core::util::{is_http_url, normalize_text_option};

use crate::cli::ConfigCommands;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            api_base_url,
            no_activate,
        } => {
            let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name =
                config.resolve_profile_name(profile.as_deref().or(global_profile));

            let api_base_url = match normalize_text_option(api_base_url) {
                Some(url) => Some(normalize_api_base_url(url)?),
                None => None,
            };

            let entry = config.profile_mut_or_default(&profile_name);
            if api_base_url.is_some() {
                entry.api_base_url = api_base_url;
            }
            if !no_activate {
                config.active_profile = Some(profile_name.clone());
            }

            let path = config.save().map_err(CliError::Config)?;
            println!(
                "Profile '{}' saved to {}",
                profile_name,
                path.display()
            );
            Ok(())
        }
        ConfigCommands::Show { profile } => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name =
                config.resolve_profile_name(profile.as_deref().or(global_profile));
            let stored_url = config
                .profile(&profile_name)
                .and_then(|entry| entry.api_base_url());
            let resolved = ApiConfig::resolve(stored_url)?;

            println!("Profile:       {profile_name}");
            println!("API base URL:  {}", resolved.base_url());
            println!("Auth group:    {}", resolved.auth_url());
            println!("Records group: {}", resolved.records_url());
            Ok(())
        }
    }
}

pub fn normalize_api_base_url(url: String) -> Result<String, CliError> {
    let url = url.trim().trim_end_matches('/').to_string();
    if is_http_url(&url) {
        Ok(url)
    } else {
        Err(CliError::Config(format!(
            "API base URL must include http:// or https:// (got '{url}')"
        )))
    }
}
