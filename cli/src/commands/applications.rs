//! Application commands

use colored::Colorize;
use recruit_forms::domain::ApplicationId;
use recruit_forms::{RecruitmentApi, Route};
use tabled::Tabled;

use super::Context;
use crate::output::OutputFormat;
use crate::ApplicationCommands;

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(action: ApplicationCommands, ctx: &Context) -> Result<(), String> {
    match action {
        ApplicationCommands::Get { id } => {
            let id = ApplicationId(id);
            let detail = ctx.api()?.application(id).await.map_err(|e| e.to_string())?;
            if ctx.format != OutputFormat::Table {
                ctx.format.print(&detail);
                return Ok(());
            }

            let reference = detail.custom_application_id.clone().unwrap_or_else(|| id.to_string());
            println!("{} {}  [{}]", "Application".bold(), reference, detail.status);
            println!("{}", Route::ApplicationDetail { id }.path().dimmed());
            println!("{} <{}> {}", detail.full_name, detail.email, detail.phone);
            if let Some(created) = detail.created_at {
                println!("Submitted {}", created.format("%d/%m/%Y %H:%M"));
            }

            let rows: Vec<EntryRow> = detail
                .form_data_entries()
                .into_iter()
                .map(|(field, value)| EntryRow { field, value })
                .collect();
            if !rows.is_empty() {
                println!("{}", tabled::Table::new(rows));
            }
            for doc in &detail.documents {
                println!("{}: {}", doc.document_type, doc.file);
            }
        }
    }
    Ok(())
}
