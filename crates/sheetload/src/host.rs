//! The engine collaborator and the fixed initialization sequence run against it.

use std::fmt;

use sheetload_core::{EngineConfig, PluginSpec, UnitKind, WorkbookData};

use crate::error::{InitError, InitStep};

/// Construction API of the loaded engine.
///
/// Only called after every resource is Loaded. Errors are opaque causes that
/// end up in [`InitError`].
pub trait EngineHost {
    /// Handle to a constructed engine
    type Instance;
    type Error: fmt::Display;

    fn construct(&mut self, config: &EngineConfig) -> Result<Self::Instance, Self::Error>;

    fn register_plugin(
        &mut self,
        instance: &mut Self::Instance,
        plugin: &PluginSpec,
    ) -> Result<(), Self::Error>;

    fn create_unit(
        &mut self,
        instance: &mut Self::Instance,
        kind: UnitKind,
        data: &WorkbookData,
    ) -> Result<(), Self::Error>;
}

/// What the engine is initialized with once loading completes
#[derive(Debug, Clone, PartialEq)]
pub struct InitPlan {
    pub config: EngineConfig,
    /// Registered in order
    pub plugins: Vec<PluginSpec>,
    pub unit_kind: UnitKind,
    pub workbook: WorkbookData,
}

impl Default for InitPlan {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            plugins: PluginSpec::default_plugins(),
            unit_kind: UnitKind::Sheet,
            workbook: WorkbookData::default(),
        }
    }
}

impl InitPlan {
    /// Construct the engine, register every plugin and create the default unit.
    ///
    /// Stops at the first step the host rejects.
    pub fn apply<H: EngineHost>(&self, host: &mut H) -> Result<H::Instance, InitError> {
        let mut instance = host
            .construct(&self.config)
            .map_err(|e| InitError::new(InitStep::Construct, e))?;
        tracing::debug!(
            theme = %self.config.theme,
            locale = %self.config.locale,
            container = %self.config.container,
            "Engine constructed"
        );

        for plugin in &self.plugins {
            host.register_plugin(&mut instance, plugin)
                .map_err(|e| InitError::new(InitStep::RegisterPlugin(plugin.name.clone()), e))?;
            tracing::trace!("Registered plugin {}", plugin.name);
        }

        host.create_unit(&mut instance, self.unit_kind, &self.workbook)
            .map_err(|e| InitError::new(InitStep::CreateUnit, e))?;
        tracing::debug!(
            "Created {} unit '{}' with {} sheet(s)",
            self.unit_kind.as_str(),
            self.workbook.id,
            self.workbook.sheets.len()
        );

        Ok(instance)
    }
}
