//! Interactive price chart core: OHLCV series, incremental technical
//! indicators, a gesture-driven viewport and a dual-mode render pipeline.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod time_utils;

pub use application::{ChartEvent, ChartSession, InputEvent};
pub use config::ChartConfig;
pub use domain::errors::{ChartError, ChartResult};

use domain::logging::{LogComponent, get_logger};
use wasm_bindgen::prelude::*;

/// Install the console logger, clock and panic hook once per page
#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();

    let console_logger = Box::new(infrastructure::services::ConsoleLogger::for_build());
    domain::logging::init_logger(console_logger);

    let browser_time_provider = Box::new(infrastructure::services::BrowserTimeProvider::new());
    domain::logging::init_time_provider(browser_time_provider);

    get_logger().info(LogComponent::Presentation("Initialize"), "price chart core initialized");
}
