//! Snippet-markup expansion for server-rendered HTML.
//!
//! Authors write lightweight markers such as `{{toggle: Title}}` ...
//! `{{/toggle}}` into their posts. This crate parses the rendered page,
//! turns every marker into its widget (collapsible toggles, reveal-answer
//! quizzes, tooltips, colored spans, content grids, quote attributions,
//! card-symbol coloring and title-cased headings) and serializes the
//! result.
//!
//! # Architecture
//!
//! - [`locate`] finds paired block markers among sibling elements and
//!   [`extract`] cuts their content out at the node level.
//! - Widget builders (one per snippet type) run as declared [`Stage`]s in a
//!   fixed order against one [`ContentRoot`].
//! - The [`Engine`] owns configuration and per-page state and drives the
//!   stages; content problems are reported as [`Diagnostic`]s and never
//!   abort a render.
//! - [`Popover`] is the host-driven controller for the tooltip popover.
//!
//! # Example
//!
//! ```
//! use snip_engine::{Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::new()).unwrap();
//! let rendered = engine.render_fragment("<p>{{toggle: More}}Hidden{{/toggle}}</p>");
//! assert!(rendered.html.contains(r#"class="toggle""#));
//! assert!(rendered.report.is_clean());
//! ```

mod builders;
mod config;
mod diagnostics;
mod dom;
mod engine;
mod error;
pub mod extract;
pub mod locate;
pub mod marker;
mod pipeline;
mod popover;
mod root;

pub use builders::{TooltipDefinitions, card_color, to_title_case};
pub use config::{AnnouncementSettings, EngineConfig, PaletteColor, PopoverSettings};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use dom::{inner_html, outer_html};
pub use engine::{Engine, Rendered, Report};
pub use error::EngineError;
pub use pipeline::Stage;
pub use popover::{
    Key, Layout, Placement, Popover, PopoverEvent, PopoverState, Rect, TriggerId, Viewport, place,
};
pub use root::ContentRoot;
