use preptrack_core::models::SettingsPatch;
use preptrack_core::services::TrackerService;

use crate::cli::SettingsCommands;
use crate::commands::common::parse_setting_value;
use crate::error::CliError;

pub async fn run_settings(
    command: SettingsCommands,
    service: &TrackerService,
) -> Result<(), CliError> {
    match command {
        SettingsCommands::Show { json } => {
            let settings = service.load_settings().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                for (key, value) in settings.iter() {
                    println!("{key:<20}  {value}");
                }
            }
        }
        SettingsCommands::Set { key, value } => {
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::InvalidArgument(
                    "setting key cannot be empty".to_string(),
                ));
            }
            let mut patch = SettingsPatch::new();
            patch.insert(key.to_string(), parse_setting_value(&value));
            let settings = service.update_settings(patch).await?;
            if let Some(stored) = settings.get(key) {
                println!("{key} = {stored}");
            }
        }
    }

    Ok(())
}
