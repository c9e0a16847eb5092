//! Targets command

use super::Session;
use crate::cli::TargetsArgs;
use crate::output;
use anyhow::Result;
use bakery_core::ImageTarget;
use camino::Utf8Path;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct TargetRow {
    uid: String,
    version: String,
    variant: String,
    os: String,
    tags: usize,
    #[tabled(rename = "first tag")]
    first_tag: String,
}

#[derive(Serialize)]
struct TargetJson {
    uid: String,
    image: String,
    version: String,
    variant: Option<String>,
    os: Option<String>,
    latest: bool,
    development: bool,
    tags: Vec<String>,
}

impl From<&ImageTarget<'_>> for TargetRow {
    fn from(target: &ImageTarget<'_>) -> Self {
        let tags = target.tags();
        Self {
            uid: target.uid(),
            version: target.version.name.clone(),
            variant: target.variant.map(|v| v.name.clone()).unwrap_or_default(),
            os: target.os.map(|o| o.name.clone()).unwrap_or_default(),
            tags: tags.len(),
            first_tag: tags.into_iter().next().unwrap_or_default(),
        }
    }
}

impl From<&ImageTarget<'_>> for TargetJson {
    fn from(target: &ImageTarget<'_>) -> Self {
        Self {
            uid: target.uid(),
            image: target.image.name.clone(),
            version: target.version.name.clone(),
            variant: target.variant.map(|v| v.name.clone()),
            os: target.os.map(|o| o.name.clone()),
            latest: target.is_latest(),
            development: target.is_development_version(),
            tags: target.tags(),
        }
    }
}

/// List resolved targets
pub async fn run(args: TargetsArgs, config: Option<&Utf8Path>) -> Result<()> {
    let session = Session::load(config, &args.filter).await?;
    let targets = session.targets()?;

    if args.json {
        let rows: Vec<TargetJson> = targets.iter().map(TargetJson::from).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if targets.is_empty() {
        return Ok(());
    }

    let rows: Vec<TargetRow> = targets.iter().map(TargetRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
    output::info(&format!("{} targets", targets.len()));

    Ok(())
}
