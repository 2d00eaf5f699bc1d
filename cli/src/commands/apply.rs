//! Apply command

use std::path::PathBuf;

use colored::Colorize;
use recruit_forms::domain::FileBlob;
use recruit_forms::{FieldPath, FormSession, FormsError};

use super::form::{load_answers, print_errors, session_mut};
use super::Context;

pub struct ApplyArgs {
    pub job: Option<u64>,
    pub values: PathBuf,
    pub files: Vec<String>,
    pub signature: Option<PathBuf>,
}

pub async fn handle(args: ApplyArgs, ctx: &Context) -> Result<(), String> {
    let uploads = args
        .files
        .iter()
        .map(|arg| parse_upload(arg))
        .collect::<Result<Vec<_>, _>>()?;

    let mut page = ctx.open_page(args.job).await?;
    {
        let session = session_mut(&mut page)?;
        session
            .fill_from_json(&load_answers(&args.values)?)
            .map_err(|e| e.to_string())?;
        for (path, file) in uploads {
            attach_file(session, &path, file)?;
        }
        if let Some(signature) = &args.signature {
            attach_signature(session, signature)?;
        }
    }

    match page.submit().await {
        Ok(route) => {
            println!("{} {}", "Application submitted:".green(), route);
            Ok(())
        }
        Err(FormsError::Validation(errors)) => {
            if let Some(session) = page.session() {
                print_errors(session, ctx.format);
            }
            Err(format!("{} field(s) need attention", errors.len()))
        }
        Err(e) => Err(page.submit_error().map(str::to_string).unwrap_or_else(|| e.to_string())),
    }
}

/// `documents[0].file=./degree.pdf` -> (path, file)
fn parse_upload(arg: &str) -> Result<(FieldPath, PathBuf), String> {
    let (path, file) = arg
        .split_once('=')
        .ok_or_else(|| format!("Expected PATH=FILE, got {}", arg))?;
    let path = path.trim().parse::<FieldPath>().map_err(|e| e.to_string())?;
    Ok((path, PathBuf::from(file.trim())))
}

/// Attach a file, growing the enclosing array when the row does not exist yet
fn attach_file(session: &mut FormSession, path: &FieldPath, file: PathBuf) -> Result<(), String> {
    let blob = FileBlob::from_path(&file).map_err(|e| e.to_string())?;
    if let [recruit_forms::domain::PathSegment::Key(array), recruit_forms::domain::PathSegment::Index(row), ..] =
        path.segments()
    {
        let array = FieldPath::field(array);
        let rows = session
            .values()
            .get_path(&array)
            .and_then(|v| v.as_rows())
            .map_or(0, <[_]>::len);
        for _ in rows..=*row {
            session.add_row(&array).map_err(|e| e.to_string())?;
        }
    }
    session.set_file(path, Some(blob)).map_err(|e| e.to_string())
}

fn attach_signature(session: &mut FormSession, png: &PathBuf) -> Result<(), String> {
    let bytes = std::fs::read(png).map_err(|e| format!("{}: {}", png.display(), e))?;
    let field = session
        .schema()
        .field_with_role(recruit_forms::domain::FieldRole::Signature)
        .map(|f| FieldPath::field(&f.name))
        .ok_or_else(|| "This form has no signature field".to_string())?;
    session.set_signature_png(&field, &bytes).map_err(|e| e.to_string())
}
