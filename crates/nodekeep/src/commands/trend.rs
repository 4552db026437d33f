use anyhow::Result;
use nodekeep_config::{GlobalArgs, TrendArgs};
use nodekeep_metrics::MetricsStore;
use nodekeep_types::ToolInfo;

use crate::config::Settings;
use crate::render::{self, MetricsView, TrendView};

fn open_store(settings: &Settings) -> Result<MetricsStore> {
    Ok(MetricsStore::load(&settings.metrics_path)?.with_history_cap(settings.history_cap))
}

pub(crate) fn handle_trend(args: TrendArgs, global: &GlobalArgs, settings: &Settings) -> Result<bool> {
    let store = open_store(settings)?;
    let validator = args.validator.as_deref();
    let view = TrendView {
        tool: ToolInfo::default(),
        validator,
        trend: match validator {
            Some(name) => store.trend_for(name),
            None => store.trend(),
        },
        latest: match validator {
            Some(name) => store.latest(name),
            None => store.history().last(),
        },
    };
    render::emit(global, &view, render::trend_text)?;
    Ok(true)
}

pub(crate) fn handle_metrics(global: &GlobalArgs, settings: &Settings) -> Result<bool> {
    let store = open_store(settings)?;
    let view = MetricsView {
        tool: ToolInfo::default(),
        path: settings.metrics_path.display().to_string(),
        total_runs: store.total_runs(),
        by_type: store.by_type(),
        by_date: store.by_date(),
        history: store.history().len(),
        history_cap: store.history_cap(),
    };
    render::emit(global, &view, render::metrics_text)?;
    Ok(true)
}
