use std::env;

use preptrack_core::config::SyncMode;
use preptrack_core::util::is_http_url;

use crate::cli::{ConfigCommands, SyncModeArg};
use crate::config_profiles::{
    normalize_text_option, remote_config_from_env, CliProfile, CliProfilesConfig,
};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            table,
            user_id,
            sync_mode,
            no_activate,
        } => run_config_init(
            global_profile,
            ProfileInput {
                supabase_url,
                supabase_anon_key,
                table,
                user_id,
                sync_mode,
            },
            no_activate,
        ),
        ConfigCommands::Show => run_config_show(global_profile),
    }
}

/// Values passed to `config init`; unset fields keep what is stored.
#[derive(Debug, Default)]
pub struct ProfileInput {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub table: Option<String>,
    pub user_id: Option<String>,
    pub sync_mode: Option<SyncModeArg>,
}

pub fn run_config_init(
    profile_name: Option<&str>,
    input: ProfileInput,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    let profile = config.profile_mut_or_default(&profile_name);
    apply_profile_input(
        profile,
        input,
        normalize_text_option(env::var("SUPABASE_URL").ok()),
        normalize_text_option(env::var("SUPABASE_ANON_KEY").ok()),
    );
    validate_profile(profile)?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = config
        .profiles
        .get(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let missing_fields = missing_profile_fields(profile);
    if missing_fields.is_empty() {
        println!("Sync profile '{profile_name}' is ready. Run `prep sync`.");
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

/// Explicit values first, then the environment, then what is stored.
pub fn apply_profile_input(
    profile: &mut CliProfile,
    input: ProfileInput,
    env_supabase_url: Option<String>,
    env_supabase_anon_key: Option<String>,
) {
    if let Some(value) = normalize_text_option(input.supabase_url).or(env_supabase_url) {
        profile.supabase_url = Some(value);
    }
    if let Some(value) = normalize_text_option(input.supabase_anon_key).or(env_supabase_anon_key) {
        profile.supabase_anon_key = Some(value);
    }
    if let Some(value) = normalize_text_option(input.table) {
        profile.table = Some(value);
    }
    if let Some(value) = normalize_text_option(input.user_id) {
        profile.user_id = Some(value);
    }
    if let Some(mode) = input.sync_mode {
        profile.sync_mode = mode.into();
    }
}

pub fn validate_profile(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = &profile.supabase_url {
        if !is_http_url(url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}

pub fn missing_profile_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing_fields = Vec::new();
    if profile.supabase_url.is_none() {
        missing_fields.push("supabase_url");
    }
    if profile.supabase_anon_key.is_none() {
        missing_fields.push("supabase_anon_key");
    }
    missing_fields
}

pub fn run_config_show(profile_name: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let name = config.resolve_profile_name(profile_name);
    let stored = config.profile(&name).cloned().unwrap_or_default();
    let resolved = remote_config_from_env(stored.sync_mode).or(stored.remote_config());

    println!("Profile        {name}");
    println!(
        "Supabase URL   {}",
        resolved.supabase_url.as_deref().unwrap_or("-")
    );
    println!(
        "Anon key       {}",
        if resolved.supabase_anon_key.is_some() {
            "set"
        } else {
            "-"
        }
    );
    println!("Table          {}", resolved.table_name());
    println!(
        "User id        {}",
        resolved
            .configured_user_id()
            .as_deref()
            .unwrap_or("generated per database")
    );
    println!(
        "Sync mode      {}",
        match resolved.sync_mode {
            SyncMode::Merge => "merge",
            SyncMode::LastModified => "last-modified",
        }
    );
    Ok(())
}
