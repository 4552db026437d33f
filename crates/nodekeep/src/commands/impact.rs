use anyhow::Result;
use nodekeep_config::{GlobalArgs, ImpactArgs};
use nodekeep_types::ToolInfo;

use crate::config::Settings;
use crate::render::{self, ImpactView};

pub(crate) fn handle(args: ImpactArgs, global: &GlobalArgs, settings: &Settings) -> Result<bool> {
    let registry = nodekeep_registry::load(&settings.registry_path)?;
    let report = nodekeep_impact::analyze(
        &registry,
        &args.id,
        &settings.impact,
        args.workflow.as_deref(),
    )?;
    let view = ImpactView {
        tool: ToolInfo::default(),
        max_risk: report.max_risk(),
        report,
    };
    render::emit(global, &view, render::impact_text)?;
    Ok(true)
}
