use crate::domain::errors::{ChartError, ChartResult};
use std::cell::{RefCell, RefMut};

#[cfg(feature = "render")]
pub mod wasm_api;

#[cfg(feature = "render")]
pub use wasm_api::WasmChart;

/// Borrow shared chart state for a host call. Subscribers run while the
/// session is borrowed, so a call made from inside one gets `Busy`.
pub fn lock_host<T>(cell: &RefCell<T>) -> ChartResult<RefMut<'_, T>> {
    cell.try_borrow_mut().map_err(|_| ChartError::Busy)
}
