// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for hostwatch.

use crate::{
    dialog::{DialogProbe, DialogWatchdog},
    errors::{ConfigParseError, ProfileNotFound},
    events::DialogKind,
    reporter::{FinalStatusLevel, StatusLevel},
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::{collections::HashMap, time::Duration};

/// Overall configuration for hostwatch.
///
/// This is the root data structure for hostwatch configuration. Most settings are managed
/// through [profiles](HostwatchProfile), obtained through the [`profile`](Self::profile) method.
#[derive(Clone, Debug)]
pub struct HostwatchConfig {
    workspace_root: Utf8PathBuf,
    inner: HostwatchConfigImpl,
}

impl HostwatchConfig {
    /// The default location of the config within the path: `.config/hostwatch.toml`, used to
    /// read the config from the given directory.
    pub const CONFIG_PATH: &'static str = ".config/hostwatch.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// The name of the default profile.
    pub const DEFAULT_PROFILE: &'static str = "default";

    /// Reads the hostwatch config from the given file, or if not specified from
    /// `.config/hostwatch.toml` in the workspace root.
    ///
    /// If no config file is specified and the workspace doesn't have `.config/hostwatch.toml`,
    /// uses the default config options.
    pub fn from_sources(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let workspace_root = workspace_root.into();
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = workspace_root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let inner = Self::build_and_deserialize_config(&builder)
            .map_err(|err| ConfigParseError::new(config_file, err))?;

        Ok(Self {
            workspace_root,
            inner,
        })
    }

    /// Returns the default hostwatch config.
    pub fn default_config(workspace_root: impl Into<Utf8PathBuf>) -> Self {
        let inner = Self::build_and_deserialize_config(&Self::make_default_config())
            .expect("default config is always valid");
        Self {
            workspace_root: workspace_root.into(),
            inner,
        }
    }

    /// Returns the profile with the given name, or an error if a profile was specified but not
    /// found.
    pub fn profile(
        &self,
        name: impl AsRef<str>,
    ) -> Result<HostwatchProfile<'_>, ProfileNotFound> {
        self.make_profile(name.as_ref())
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn make_profile(&self, name: &str) -> Result<HostwatchProfile<'_>, ProfileNotFound> {
        let custom_profile = self.inner.profiles.get(name)?;

        // The profile was found: construct the HostwatchProfile.
        let mut store_dir = self.workspace_root.join(&self.inner.store.dir);
        store_dir.push(name);

        Ok(HostwatchProfile {
            name: name.to_owned(),
            store_dir,
            default_profile: &self.inner.profiles.default,
            custom_profile,
        })
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<HostwatchConfigImpl, config::ConfigError> {
        builder.build_cloned()?.try_deserialize()
    }
}

/// A configuration profile for hostwatch.
///
/// Returned by [`HostwatchConfig::profile`].
#[derive(Clone, Debug)]
pub struct HostwatchProfile<'cfg> {
    name: String,
    store_dir: Utf8PathBuf,
    default_profile: &'cfg DefaultProfileImpl,
    custom_profile: Option<&'cfg CustomProfileImpl>,
}

impl<'cfg> HostwatchProfile<'cfg> {
    /// Returns the name of the profile.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the absolute profile-specific store directory.
    pub fn store_dir(&self) -> &Utf8Path {
        &self.store_dir
    }

    /// Returns the status level for results as they arrive.
    pub fn status_level(&self) -> StatusLevel {
        self.custom_profile
            .and_then(|profile| profile.status_level)
            .unwrap_or(self.default_profile.status_level)
    }

    /// Returns the status level at the end of the run.
    pub fn final_status_level(&self) -> FinalStatusLevel {
        self.custom_profile
            .and_then(|profile| profile.final_status_level)
            .unwrap_or(self.default_profile.final_status_level)
    }

    /// Returns how often the dialog watchdog polls for dialogs.
    pub fn dialog_poll_interval(&self) -> Duration {
        self.custom_profile
            .and_then(|profile| profile.dialog_poll_interval)
            .unwrap_or(self.default_profile.dialog_poll_interval)
    }

    /// Creates a watchdog for dialogs of the given kind, polling at this profile's
    /// `dialog-poll-interval`.
    pub fn dialog_watchdog<P: DialogProbe>(
        &self,
        probe: P,
        kind: DialogKind,
    ) -> DialogWatchdog<P> {
        DialogWatchdog::new(probe, kind, self.dialog_poll_interval())
    }

    /// Returns the first port the harness server tries.
    pub fn port(&self) -> u16 {
        self.custom_profile
            .and_then(|profile| profile.port)
            .unwrap_or(self.default_profile.port)
    }

    /// Returns the JUnit configuration for this profile, or `None` if JUnit output is disabled.
    pub fn junit(&self) -> Option<JunitConfig<'cfg>> {
        let path = self
            .custom_profile
            .and_then(|profile| profile.junit.path.as_deref())
            .or(self.default_profile.junit.path.as_deref());

        path.map(|path| {
            let path = self.store_dir.join(path);
            let report_name = self
                .custom_profile
                .and_then(|profile| profile.junit.report_name.as_deref())
                .unwrap_or(&self.default_profile.junit.report_name);
            JunitConfig { path, report_name }
        })
    }
}

/// JUnit configuration for hostwatch, returned by a [`HostwatchProfile`].
#[derive(Clone, Debug)]
pub struct JunitConfig<'cfg> {
    path: Utf8PathBuf,
    report_name: &'cfg str,
}

impl<'cfg> JunitConfig<'cfg> {
    /// Returns the absolute path to the JUnit report.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the name of the JUnit report.
    pub fn report_name(&self) -> &'cfg str {
        self.report_name
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct HostwatchConfigImpl {
    store: StoreConfigImpl,
    #[serde(rename = "profile")]
    profiles: HostwatchProfilesImpl,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct StoreConfigImpl {
    dir: Utf8PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct HostwatchProfilesImpl {
    default: DefaultProfileImpl,
    #[serde(flatten)]
    other: HashMap<String, CustomProfileImpl>,
}

impl HostwatchProfilesImpl {
    fn get(&self, profile: &str) -> Result<Option<&CustomProfileImpl>, ProfileNotFound> {
        let custom_profile = match profile {
            HostwatchConfig::DEFAULT_PROFILE => None,
            other => Some(
                self.other
                    .get(other)
                    .ok_or_else(|| ProfileNotFound::new(profile, self.all_profiles()))?,
            ),
        };
        Ok(custom_profile)
    }

    fn all_profiles(&self) -> impl Iterator<Item = &str> {
        self.other
            .keys()
            .map(|key| key.as_str())
            .chain(std::iter::once(HostwatchConfig::DEFAULT_PROFILE))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DefaultProfileImpl {
    status_level: StatusLevel,
    final_status_level: FinalStatusLevel,
    #[serde(with = "humantime_serde")]
    dialog_poll_interval: Duration,
    port: u16,
    junit: DefaultJunitImpl,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DefaultJunitImpl {
    #[serde(default)]
    path: Option<Utf8PathBuf>,
    report_name: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CustomProfileImpl {
    #[serde(default)]
    status_level: Option<StatusLevel>,
    #[serde(default)]
    final_status_level: Option<FinalStatusLevel>,
    #[serde(default, with = "humantime_serde::option")]
    dialog_poll_interval: Option<Duration>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    junit: JunitImpl,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct JunitImpl {
    #[serde(default)]
    path: Option<Utf8PathBuf>,
    #[serde(default)]
    report_name: Option<String>,
}
