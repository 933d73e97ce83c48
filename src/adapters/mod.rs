// Adapters layer: concrete implementations of the domain ports (backend, map, panel)

pub mod console_panel;
pub mod headless_map;
pub mod http;
