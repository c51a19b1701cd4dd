use std::path::Path;

use preptrack_core::export::render_export;
use preptrack_core::services::TrackerService;

use crate::cli::ExportFormat;
use crate::error::CliError;

pub async fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    service: &TrackerService,
) -> Result<(), CliError> {
    let snapshot = service.snapshot().await?;
    let rendered = render_export(&snapshot, format.into())?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}
