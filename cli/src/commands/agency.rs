//! Agency commands

use colored::Colorize;
use recruit_forms::RecruitmentApi;

use super::Context;
use crate::output::OutputFormat;
use crate::AgencyCommands;

pub async fn handle(action: AgencyCommands, ctx: &Context) -> Result<(), String> {
    match action {
        AgencyCommands::Show => {
            let agency = ctx.api()?.agency(ctx.agency()?).await.map_err(|e| e.to_string())?;
            if ctx.format != OutputFormat::Table {
                ctx.format.print(&agency);
                return Ok(());
            }

            println!("{} ({})", agency.name.bold(), agency.code);
            if !agency.is_active {
                println!("{}", "Not accepting applications".yellow());
            }
            if !agency.description.is_empty() {
                println!("\n{}", agency.description);
            }
            if !agency.instructions.is_empty() {
                println!("\n{}\n{}", "Instructions".bold(), agency.instructions);
            }
            let default_form = agency.default_schema().map_err(|e| e.to_string())?;
            if let Some(schema) = default_form {
                println!("\nDefault form: {} fields", schema.fields().len());
            }
        }
    }
    Ok(())
}
