use anyhow::Result;

use super::{ConnectionArgs, build_plan, load_settings, open_local, open_remote};
use crate::render;

/// Show what a sync would do without touching either store.
pub async fn run(args: &ConnectionArgs) -> Result<()> {
    let settings = load_settings(args)?;
    let local = open_local(&settings)?;
    let remote = open_remote(&settings).await?;

    let plan = build_plan(&local, &remote).await?;
    println!("{}", render::plan(&plan));

    if !plan.is_empty() {
        println!("\nRun `taskdav sync` to apply these changes.");
    }
    Ok(())
}
