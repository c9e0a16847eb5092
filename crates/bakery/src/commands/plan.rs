//! Plan command

use super::Session;
use crate::cli::PlanArgs;
use crate::output;
use anyhow::Result;
use bakery_core::BakePlan;
use camino::Utf8Path;

/// Print or write the bake plan
pub async fn run(args: PlanArgs, config: Option<&Utf8Path>) -> Result<()> {
    let session = Session::load(config, &args.filter).await?;
    let targets = session.targets()?;
    let plan = BakePlan::from_targets(session.config.context(), &targets)?;

    match &args.output {
        Some(path) => {
            plan.write(path)?;
            output::success(&format!(
                "Wrote bake plan with {} targets to {}",
                plan.target.len(),
                path
            ));
        }
        None => println!("{}", plan.to_json()?),
    }

    Ok(())
}
