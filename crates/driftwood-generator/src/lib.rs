//! Driftwood Generator Library
//!
//! Site rendering engine for Driftwood.
//!
//! # Modules
//!
//! - [`template`] - HTML template system with variable interpolation
//! - [`html`] - HTML generation from parsed content
//! - [`collector`] - Content collection and organization
//! - [`feed`] - RSS feed generation
//! - [`assets`] - Static asset copying
//! - [`plugins`] - Build pipeline hooks
//! - [`build`] - Build orchestration and the [`Renderer`] seam

pub mod assets;
pub mod build;
pub mod collector;
pub mod feed;
pub mod html;
pub mod plugins;
pub mod template;

pub use assets::AssetCopier;
pub use build::{BuildError, BuildStats, Builder, Renderer};
pub use collector::{ContentCollector, SiteContent};
pub use feed::FeedGenerator;
pub use html::HtmlGenerator;
pub use plugins::{Plugin, PluginRegistry};
pub use template::{Template, TemplateContext, TemplateRegistry};
