//! Form commands

use std::path::Path;

use colored::Colorize;
use recruit_forms::application::{Block, FieldView, FormView, PageView, Widget};
use recruit_forms::{FormSession, HttpRecruitmentApi};
use tabled::Tabled;

use super::Context;
use crate::output::OutputFormat;
use crate::FormCommands;

#[derive(Tabled)]
struct ErrorRow {
    #[tabled(rename = "Field")]
    path: String,
    #[tabled(rename = "Error")]
    message: String,
}

pub async fn handle(action: FormCommands, ctx: &Context) -> Result<(), String> {
    let today = chrono::Local::now().date_naive();
    match action {
        FormCommands::Show { job } => {
            let page = ctx.open_page(job).await?;
            match page.view(today) {
                PageView::Form { title, form, .. } => {
                    if ctx.format == OutputFormat::Table {
                        println!("{}", title.bold());
                        for line in form_lines(&form) {
                            println!("{}", line);
                        }
                    } else {
                        ctx.format.print(&form);
                    }
                }
                PageView::Error { message } => return Err(message),
                PageView::Loading => return Err("Form is not available".into()),
            }
        }
        FormCommands::Validate { job, values } => {
            let mut page = ctx.open_page(job).await?;
            let session = session_mut(&mut page)?;
            session.fill_from_json(&load_answers(&values)?).map_err(|e| e.to_string())?;

            if session.validate_all() {
                println!("{}", "Form is valid".green());
                return Ok(());
            }
            print_errors(session, ctx.format);
            return Err(format!("{} field(s) need attention", session.errors().len()));
        }
    }
    Ok(())
}

pub fn session_mut(page: &mut recruit_forms::ApplicationPage<HttpRecruitmentApi>) -> Result<&mut FormSession, String> {
    page.session_mut().ok_or_else(|| "Form is not available".to_string())
}

pub fn load_answers(path: &Path) -> Result<serde_json::Value, String> {
    let content = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn print_errors(session: &FormSession, format: OutputFormat) {
    let rows = session
        .errors()
        .iter()
        .map(|(path, message)| ErrorRow { path: path.to_string(), message: message.clone() })
        .collect();
    format.print_rows(session.errors(), rows);
}

/// Plain text rendering of a form view
pub fn form_lines(form: &FormView) -> Vec<String> {
    let mut lines = Vec::new();
    for block in &form.blocks {
        match block {
            Block::Field(field) => field_lines(field, 0, &mut lines),
            Block::JobSelector(selector) => {
                lines.push(format!("{}:", selector.label));
                for option in &selector.options {
                    let mark = if selector.selected == Some(option.id) { "(*)" } else { "( )" };
                    lines.push(format!("  {} {} [{}]", mark, option.title, option.id));
                }
            }
            Block::Submit { label, disabled } => {
                let button = format!("[ {} ]", label);
                lines.push(if *disabled { button.dimmed().to_string() } else { button.bold().to_string() });
            }
        }
    }
    lines
}

fn field_lines(field: &FieldView, depth: usize, lines: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    let mut label = field.label.clone();
    if field.required {
        label.push_str(" *");
    }
    let label = if field.disabled { label.dimmed().to_string() } else { label };

    match &field.widget {
        Widget::Input { input_type, value, .. } => {
            lines.push(format!("{}{} <{}>: {}", indent, label, input_type, value));
        }
        Widget::DatePicker { display_format, value, age, .. } => {
            lines.push(format!("{}{} ({}): {}", indent, label, display_format, value));
            if let Some(age) = age.as_deref().filter(|a| !a.is_empty()) {
                lines.push(format!("{}  {}", indent, age.cyan()));
            }
        }
        Widget::File { accept, file_name } => {
            let picked = file_name.clone().unwrap_or_else(|| "no file".into());
            let accept = if accept.is_empty() { String::new() } else { format!(" [{}]", accept.join(", ")) };
            lines.push(format!("{}{}{}: {}", indent, label, accept, picked));
        }
        Widget::Checkbox { checked } | Widget::Declaration { checked } => {
            let mark = if *checked { "[x]" } else { "[ ]" };
            lines.push(format!("{}{} {}", indent, mark, label));
        }
        Widget::Signature { signed } => {
            lines.push(format!("{}{}: {}", indent, label, if *signed { "signed" } else { "unsigned" }));
        }
        Widget::Group { fields } => {
            lines.push(format!("{}{}", indent, label.underline()));
            for sub in fields {
                field_lines(sub, depth + 1, lines);
            }
        }
        Widget::Array { rows, add_label, total_experience } => {
            lines.push(format!("{}{}", indent, label.underline()));
            for row in rows {
                lines.push(format!("{}  #{}", indent, row.index + 1));
                for cell in &row.fields {
                    field_lines(cell, depth + 2, lines);
                }
                if let Some(experience) = &row.experience {
                    lines.push(format!("{}    {}", indent, experience.cyan()));
                }
            }
            lines.push(format!("{}  + {}", indent, add_label));
            if let Some(total) = total_experience {
                lines.push(format!("{}  {}", indent, total.cyan()));
            }
        }
    }

    if let Some(error) = &field.error {
        lines.push(format!("{}  {}", indent, error.red()));
    }
}
