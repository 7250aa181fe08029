//! fOS Element Behaviors
//!
//! Attach reusable, named behaviors to DOM elements through a declarative
//! attribute (`has` by default):
//!
//! ```text
//! <div has="counter tooltip"></div>
//! ```
//!
//! Each listed name that is defined gets its own instance per element, with
//! custom-element-like `connected`, `disconnected`, `adopted` and
//! `attribute_changed` hooks. The main document, same-origin frame
//! documents and open shadow roots are all watched through one coalesced
//! mutation observer.
//!
//! # Example
//! ```rust,ignore
//! use fos_behaviors::{BehaviorClass, BehaviorsConfig, ElementBehaviors};
//! use fos_dom::Dom;
//!
//! let mut dom = Dom::new("https://example.com/")?;
//! let mut behaviors = ElementBehaviors::new(&mut dom, BehaviorsConfig::default())?;
//! behaviors.define("counter", BehaviorClass::of::<ClickCounter>());
//!
//! let main = dom.main_document();
//! let div = dom.create_element(main, "div")?;
//! dom.set_attribute(div, "has", "counter")?;
//! dom.append_child(dom.body(main).unwrap(), div)?;
//!
//! // End of turn: deliver queued mutations
//! behaviors.tick(&mut dom);
//! ```

mod behavior;
mod clock;
mod config;
mod dispatch;
mod engine;
mod frames;
mod instances;
mod interceptor;
mod owners;
mod registry;
pub mod tokens;
mod tracker;
mod watch;

pub use behavior::{AttributeChange, Behavior, BehaviorClass, BehaviorHandle, DefineBehavior};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    BehaviorsConfig, DEFAULT_ATTRIBUTE, DEFAULT_OBSERVER_TIMEOUT, MIN_OBSERVER_TIMEOUT,
};
pub use engine::ElementBehaviors;
pub use watch::ObservationState;

/// Element behaviors version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("DOM error: {0}")]
    Dom(#[from] fos_dom::DomError),
}
