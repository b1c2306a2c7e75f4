//! # Homecast workspace
//!
//! Facade over the workspace crates: `estate_math` for the numeric kernels and
//! `homecast` for the normalization, imputation and forecasting pipeline.
//!
//! ## Example
//!
//! ```
//! use homecast_workspace::homecast::{DealType, RegionRegistry};
//!
//! let mut registry = RegionRegistry::new();
//! let seoul = registry.observe("11000", " 서울 ");
//! assert_eq!(seoul.name_en, "Seoul");
//! assert_eq!(DealType::Sale.as_str(), "sale");
//! ```

pub use estate_math;
pub use homecast;
