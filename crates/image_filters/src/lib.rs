//! # Image Filters
//!
//! Named image filters (grayscale, sepia, blur, sharpen, edge detection,
//! invert, emboss, contour, smooth, solarize) exposed as MCP tools.
//!
//! A tool call names a filter and an input path. The input path is resolved
//! through a chain of fallbacks so that a call always has a real image to work
//! on, and the output is written to a location that is known to be writable.
//! The status message always reports where the file actually landed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use image_filters::{Dispatcher, FilterEnvironment, FilterKind, InvocationRequest, ServerConfig};
//!
//! let environment = FilterEnvironment::initialize(&ServerConfig::default());
//! let dispatcher = Dispatcher::new(environment);
//!
//! let invocation = dispatcher.invoke(
//!     InvocationRequest::new(FilterKind::Blur, "~/Pictures/cat.jpg")
//!         .with_param("radius", 5.0),
//! )?;
//! println!("{}", invocation.message());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Strictness
//!
//! In the default `lenient` mode a missing or sandboxed input is replaced by a
//! generated gradient test image, an undecodable input by an in-memory
//! gradient, and a failed save by a temporary `.jpg` file. `strict` mode
//! surfaces those failures instead. Filter failures are always surfaced.

// Core modules
pub mod error;
pub mod logging;
pub mod traits;
pub mod filters;
pub mod catalog;
pub mod config;
pub mod environment;
pub mod paths;
pub mod test_image;
pub mod dispatcher;
pub mod mcp;

// Re-exports for convenience
pub use error::{FilterError, Result};
pub use traits::*;
pub use catalog::{FilterCatalog, FilterDescriptor, FilterKind, FilterParams, ParamSpec, ParamValue};
pub use config::{ServerConfig, Strictness};
pub use environment::FilterEnvironment;
pub use dispatcher::{Dispatcher, Invocation, InvocationRequest};
pub use mcp::ImageFilterMcpServer;
