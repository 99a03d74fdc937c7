use std::path::Path;

use anyhow::Context;
use serde_json::json;

use crate::cli::utils::{confirm, fail, output_success, output_view};
use crate::cli::{CliContext, OutputFormat};
use crate::editor::UploadFile;
use crate::section::{AdminSection, SaveKind};
use crate::shell::{TabContent, TabView};

pub fn tabs(ctx: &CliContext) -> anyhow::Result<()> {
    let tabs = ctx.shell.visible_tabs();
    match ctx.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "role": ctx.shell.role(), "tabs": tabs }))?);
        }
        OutputFormat::Text => {
            for tab in tabs {
                let tables: Vec<&str> = tab.collections().iter().map(|c| c.table).collect();
                println!("{:<14} {:<20} {}", tab.id, tab.label, tables.join(", "));
            }
        }
    }
    Ok(())
}

pub async fn list(ctx: &mut CliContext, tab: &str, filter: Option<&str>) -> anyhow::Result<()> {
    let format = ctx.format;
    let content = ctx.shell.open_tab(tab).await.map_err(fail)?;

    if let (Some(filter), TabContent::Sections(sections)) = (filter, &mut *content) {
        for section in sections.iter_mut().filter(|s| s.spec().filter_by.is_some()) {
            section.set_filter(filter).map_err(fail)?;
        }
    }

    match content.view() {
        TabView::Sections { sections } => match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sections)?),
            OutputFormat::Text => {
                for view in &sections {
                    output_view(format, view)?;
                    println!();
                }
            }
        },
        TabView::Team(view) => output_view(format, &view)?,
    }
    Ok(())
}

pub async fn add(
    ctx: &CliContext,
    collection: &str,
    set: Vec<(String, String)>,
    image: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let mut section = open(ctx, collection).await?;
    section.add().map_err(fail)?;
    fill_and_save(ctx, &mut section, set, image).await
}

pub async fn edit(
    ctx: &CliContext,
    collection: &str,
    id: &str,
    set: Vec<(String, String)>,
    image: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let mut section = open(ctx, collection).await?;
    section.edit(id).map_err(fail)?;
    fill_and_save(ctx, &mut section, set, image).await
}

pub async fn delete(ctx: &CliContext, collection: &str, id: &str, yes: bool) -> anyhow::Result<()> {
    let mut section = open(ctx, collection).await?;
    section.request_delete(id).map_err(fail)?;

    if !yes {
        let message = section.view().confirm.map(|c| c.message).unwrap_or_default();
        if !confirm(&message)? {
            section.cancel_delete();
            return output_success(ctx.format, "Cancelled", None);
        }
    }

    section.confirm_delete().await.map_err(fail)?;
    output_success(ctx.format, &format!("Deleted {} from {}", id, collection), Some(json!({ "id": id })))
}

async fn open(ctx: &CliContext, collection: &str) -> anyhow::Result<AdminSection> {
    let mut section = ctx.shell.section_for(collection).map_err(fail)?;
    section.load().await.map_err(fail)?;
    Ok(section)
}

async fn fill_and_save(
    ctx: &CliContext,
    section: &mut AdminSection,
    set: Vec<(String, String)>,
    image: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let editor = section.editor_mut().context("Editor did not open")?;

    for (key, text) in set {
        editor.set_text(&key, &text).map_err(|e| anyhow::anyhow!(e.user_message()))?;
    }

    for (key, path) in image {
        let bytes = tokio::fs::read(&path).await.with_context(|| format!("Cannot read {}", path))?;
        let name = Path::new(&path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        editor
            .upload_image(&key, &UploadFile::new(name, bytes), ctx.blobs.as_ref(), &ctx.upload)
            .await
            .map_err(|e| anyhow::anyhow!("{}: {}", key, e.user_message()))?;
    }

    let kind = section.save().await.map_err(fail)?;
    let verb = match kind {
        SaveKind::Inserted => "Added",
        SaveKind::Updated => "Updated",
    };
    output_success(
        ctx.format,
        &format!("{} record in {}", verb, section.spec().title),
        Some(json!({ "records": section.records() })),
    )
}
