//! Engine host used outside a browser: records what the engine would be
//! initialized with instead of constructing it.

use std::convert::Infallible;

use sheetload::{EngineConfig, EngineHost, PluginSpec, UnitKind, WorkbookData};

/// What a dry initialization produced
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSummary {
    pub config: EngineConfig,
    pub plugins: Vec<String>,
    pub units: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ReportingHost;

impl EngineHost for ReportingHost {
    type Instance = EngineSummary;
    type Error = Infallible;

    fn construct(&mut self, config: &EngineConfig) -> Result<EngineSummary, Infallible> {
        tracing::info!(
            "construct(theme={}, locale={}, container=#{})",
            config.theme,
            config.locale,
            config.container
        );
        Ok(EngineSummary {
            config: config.clone(),
            plugins: Vec::new(),
            units: Vec::new(),
        })
    }

    fn register_plugin(
        &mut self,
        instance: &mut EngineSummary,
        plugin: &PluginSpec,
    ) -> Result<(), Infallible> {
        tracing::info!("registerPlugin({})", plugin.name);
        instance.plugins.push(plugin.name.clone());
        Ok(())
    }

    fn create_unit(
        &mut self,
        instance: &mut EngineSummary,
        kind: UnitKind,
        data: &WorkbookData,
    ) -> Result<(), Infallible> {
        let sheets: Vec<String> = data
            .ordered_sheets()
            .map(|s| format!("{} ({}x{})", s.name, s.row_count, s.column_count))
            .collect();
        tracing::info!("createUnit({}, {}: {})", kind.as_str(), data.id, sheets.join(", "));
        instance.units.push(format!("{}:{}", kind.as_str(), data.id));
        Ok(())
    }
}
