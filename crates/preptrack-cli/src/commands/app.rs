use preptrack_core::models::{Application, ApplicationPatch, ApplicationStatus};
use preptrack_core::services::TrackerService;
use preptrack_core::util;
use serde::Serialize;

use crate::cli::AppCommands;
use crate::commands::common::{format_application_lines, resolve_record, short_id};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ApplicationListing<'a> {
    active: &'a [Application],
    stale: &'a [Application],
}

pub async fn run_app(command: AppCommands, service: &TrackerService) -> Result<(), CliError> {
    let today = util::today();

    match command {
        AppCommands::Add {
            company,
            title,
            link,
            date,
            status,
            notes,
        } => {
            let mut draft = Application::new(company.trim(), title.trim(), date.unwrap_or(today));
            draft.link = link.unwrap_or_default();
            draft.notes = notes.unwrap_or_default();
            if let Some(status) = status {
                draft.status = ApplicationStatus::from(status);
            }

            let application = service.add_application(draft).await?;
            println!(
                "Tracking {} at {} ({})",
                display_title(&application),
                application.company,
                short_id(&application.id)
            );
        }
        AppCommands::List { json } => {
            let partition = service.list_applications(today).await?;
            if json {
                let listing = ApplicationListing {
                    active: &partition.active,
                    stale: &partition.stale,
                };
                println!("{}", serde_json::to_string_pretty(&listing)?);
                return Ok(());
            }
            if partition.active.is_empty() && partition.stale.is_empty() {
                println!("No applications tracked yet.");
                return Ok(());
            }
            for line in format_application_lines(&partition.active, today) {
                println!("{line}");
            }
            if !partition.stale.is_empty() {
                println!();
                println!("Stale (no update in 2+ weeks)");
                for line in format_application_lines(&partition.stale, today) {
                    println!("{line}");
                }
            }
        }
        AppCommands::Update {
            id,
            company,
            title,
            link,
            date,
            status,
            notes,
        } => {
            let application =
                resolve_record(&id, &service.list_all_applications().await?, "application")?;
            let patch = ApplicationPatch {
                company,
                title,
                link,
                date_applied: date,
                status: status.map(ApplicationStatus::from),
                notes,
            };
            if patch == ApplicationPatch::default() {
                return Err(CliError::InvalidArgument(
                    "nothing to change; pass at least one field".to_string(),
                ));
            }

            let updated = service
                .update_application(&application.id, patch)
                .await?
                .ok_or_else(|| CliError::NotFound {
                    kind: "application",
                    query: id.clone(),
                })?;
            println!(
                "{} at {} is now {}",
                display_title(&updated),
                updated.company,
                updated.status
            );
        }
        AppCommands::Delete { id } => {
            let application =
                resolve_record(&id, &service.list_all_applications().await?, "application")?;
            service.delete_application(&application.id).await?;
            println!("Deleted application {}", short_id(&application.id));
        }
        AppCommands::Sweep => {
            let swept = service.sweep_stale_applications(today).await?;
            println!("Marked {} application(s) as stale", swept.len());
        }
    }

    Ok(())
}

fn display_title(application: &Application) -> &str {
    if application.title.is_empty() {
        "application"
    } else {
        &application.title
    }
}
