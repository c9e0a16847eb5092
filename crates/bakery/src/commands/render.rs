//! Render command

use super::{versions_of, Session};
use crate::cli::RenderArgs;
use crate::output;
use anyhow::{Context, Result};
use bakery_core::{render_version, ImageTarget};
use camino::Utf8Path;

/// Render the templates of every selected version; returns files written
pub fn render_targets(context: &Utf8Path, targets: &[ImageTarget<'_>]) -> Result<usize> {
    let mut written = 0;
    for target in versions_of(targets) {
        let files = render_version(context, target.image, target.version).with_context(|| {
            format!(
                "Failed to render {} version {}",
                target.image.name, target.version.name
            )
        })?;
        written += files.len();
    }
    Ok(written)
}

/// Render version templates
pub async fn run(args: RenderArgs, config: Option<&Utf8Path>) -> Result<()> {
    let session = Session::load(config, &args.filter).await?;
    let targets = session.targets()?;

    let written = render_targets(session.config.context(), &targets)?;
    output::success(&format!(
        "Rendered {} files for {} versions",
        written,
        versions_of(&targets).len()
    ));

    Ok(())
}
