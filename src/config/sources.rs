//! File sources merged into the configuration builder.

pub mod global_file {
    //! Global config file source: $XDG_CONFIG_HOME/briefsmith/config.toml

    use crate::config::paths;
    use config::builder::DefaultState;
    use config::ConfigBuilder;
    use config::File;
    use tracing::debug;

    /// Add the global config file source to the builder if it exists.
    pub fn add_to_builder(
        mut builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, crate::error::BriefError> {
        if let Ok(global_path) = paths::global_config_file() {
            if global_path.exists() {
                let canonical = global_path.canonicalize().unwrap_or(global_path);
                builder = builder.add_source(
                    File::with_name(&canonical.to_string_lossy()).required(false),
                );
            } else {
                debug!(
                    config_path = %global_path.display(),
                    "No global configuration file; using defaults"
                );
            }
        }
        Ok(builder)
    }
}

pub mod workspace_file {
    //! Workspace config file source: ./briefsmith.toml

    use config::builder::DefaultState;
    use config::ConfigBuilder;
    use config::File;
    use std::path::Path;

    /// Add the workspace config file to the builder. Overrides the global
    /// file field-by-field.
    pub fn add_to_builder(
        mut builder: ConfigBuilder<DefaultState>,
        workspace_root: &Path,
    ) -> Result<ConfigBuilder<DefaultState>, crate::error::BriefError> {
        let workspace_path = workspace_root.join("briefsmith.toml");
        if workspace_path.exists() {
            builder = builder
                .add_source(File::with_name(&workspace_path.to_string_lossy()).required(false));
        }
        Ok(builder)
    }
}
