//! Build command

use super::{versions_of, Session};
use crate::cli::BuildArgs;
use crate::output;
use anyhow::{Context, Result};
use bakery_core::{cleanup_ephemeral, render_version, BakePlan, ImageTarget};
use bakery_tools::buildx::{self, BakeOptions};
use camino::Utf8Path;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Render development versions, bake every target, then clean up
pub async fn run(args: BuildArgs, config: Option<&Utf8Path>) -> Result<()> {
    let session = Session::load(config, &args.filter).await?;
    let targets = session.targets()?;
    if targets.is_empty() {
        return Ok(());
    }
    let context = session.config.context();

    let result = bake(&args, context, &targets).await;

    if !args.keep_rendered {
        remove_ephemeral(context, &targets);
    }

    let plan = result?;
    output::success(&format!("Built {} targets", plan.target.len()));
    Ok(())
}

async fn bake(
    args: &BuildArgs,
    context: &Utf8Path,
    targets: &[ImageTarget<'_>],
) -> Result<BakePlan> {
    for target in versions_of(targets).iter().filter(|t| t.version.ephemeral) {
        render_version(context, target.image, target.version).with_context(|| {
            format!("Failed to render development version {}", target.version.name)
        })?;
    }

    let plan = BakePlan::from_targets(context, targets)?;
    let plan_file = tempfile::Builder::new()
        .prefix("bakery-plan-")
        .suffix(".json")
        .tempfile()
        .context("Failed to create bake plan file")?;
    let plan_path = Utf8Path::from_path(plan_file.path())
        .context("Temporary plan path is not valid UTF-8")?;
    debug!("Bake plan at {}", plan_path);

    let options = BakeOptions {
        push: args.push,
        load: args.load,
        builder: args.builder.clone(),
        targets: Vec::new(),
    };

    let spinner = output::spinner(&format!("Building {} targets...", plan.target.len()));
    let baked = buildx::bake(&plan, plan_path, &options).await;
    spinner.finish_and_clear();
    baked?;

    Ok(plan)
}

fn remove_ephemeral(context: &Utf8Path, targets: &[ImageTarget<'_>]) {
    let mut seen = BTreeSet::new();
    for target in targets {
        if !seen.insert(target.image.name.as_str()) {
            continue;
        }
        match cleanup_ephemeral(context, target.image) {
            Ok(0) => {}
            Ok(n) => debug!(
                "Removed {} rendered development versions of {}",
                n, target.image.name
            ),
            Err(e) => warn!("Failed to clean up {}: {}", target.image.name, e),
        }
    }
}
