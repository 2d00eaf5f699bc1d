//! Job post commands

use recruit_forms::RecruitmentApi;
use tabled::Tabled;

use super::Context;
use crate::JobCommands;

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Description")]
    description: String,
}

pub async fn handle(action: JobCommands, ctx: &Context) -> Result<(), String> {
    match action {
        JobCommands::List => {
            let posts = ctx.api()?.job_posts(ctx.agency()?).await.map_err(|e| e.to_string())?;
            if posts.is_empty() {
                println!("No job posts found for this agency.");
                return Ok(());
            }
            let rows = posts
                .iter()
                .map(|p| JobRow { id: p.id.0, title: p.title.clone(), description: p.description.clone() })
                .collect();
            ctx.format.print_rows(&posts, rows);
        }
    }
    Ok(())
}
