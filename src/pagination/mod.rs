//! Pagination layer - when to ask the data source for more items.
//!
//! - `throttle`: ScrollThrottle - leading + trailing scroll coalescing
//! - `controller`: PaginationController - single-flight page requests

pub mod controller;
pub mod throttle;

pub use controller::{
    FetchRequest, PaginationConfig, PaginationController, PaginationState, PAGE_PARAM,
};
pub use throttle::ScrollThrottle;
