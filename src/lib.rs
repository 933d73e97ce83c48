pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{console_panel::ConsolePanel, headless_map::HeadlessMap, http::HttpBackend};
pub use config::toml_config::TomlConfig;
pub use core::{
    driver::Navigator,
    engine::{Engine, FetchCommand, Loaded, MapEvent, UserEvent},
    layers::ViewSettings,
    loader::CascadingLoader,
    navigation::{NavEvent, NavigationState},
};
pub use utils::error::{NavError, Result};
