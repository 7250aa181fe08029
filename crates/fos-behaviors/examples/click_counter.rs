//! Example: a click counter behavior
//!
//! Run with `RUST_LOG=debug` to see the engine's tracing output.

use anyhow::Context;
use fos_behaviors::{
    AttributeChange, Behavior, BehaviorClass, BehaviorsConfig, DefineBehavior, ElementBehaviors,
};
use fos_dom::{Dom, ListenerId, NodeId};

struct ClickCounter {
    listener: Option<ListenerId>,
}

impl ClickCounter {
    fn render(&self, dom: &mut Dom, node: NodeId) {
        let count = dom.attribute(node, "count").unwrap_or("0").to_string();
        if let Err(err) = dom.set_text_content(node, &format!("Count: {count}")) {
            tracing::warn!("Cannot render {:?}: {}", node, err);
        }
    }
}

impl DefineBehavior for ClickCounter {
    const OBSERVED_ATTRIBUTES: &'static [&'static str] = &["count"];

    fn construct(dom: &mut Dom, node: NodeId) -> Self {
        if !dom.has_attribute(node, "count") {
            if let Err(err) = dom.set_attribute(node, "count", "0") {
                tracing::warn!("Cannot seed count on {:?}: {}", node, err);
            }
        }
        Self { listener: None }
    }
}

impl Behavior for ClickCounter {
    fn connected(&mut self, dom: &mut Dom, node: NodeId) {
        self.render(dom, node);
        self.listener = Some(dom.add_event_listener(node, "click", |dom, node| {
            let count: u32 = dom
                .attribute(node, "count")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            if let Err(err) = dom.set_attribute(node, "count", &(count + 1).to_string()) {
                tracing::warn!("Cannot store count on {:?}: {}", node, err);
            }
        }));
    }

    fn disconnected(&mut self, dom: &mut Dom, node: NodeId) {
        if let Some(id) = self.listener.take() {
            dom.remove_event_listener(node, id);
        }
    }

    fn attribute_changed(&mut self, dom: &mut Dom, change: AttributeChange<'_>) {
        self.render(dom, change.node);
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut dom = Dom::new("https://example.com/")?;
    let mut behaviors = ElementBehaviors::new(&mut dom, BehaviorsConfig::default())?;
    behaviors.define("click-counter", BehaviorClass::of::<ClickCounter>());
    println!("fOS Element Behaviors v{} ready", behaviors.version());

    let main = dom.main_document();
    let body = dom.body(main).context("document has no body")?;
    let button = dom.create_element(main, "button")?;
    dom.set_attribute(button, "has", "click-counter")?;
    dom.append_child(body, button)?;
    behaviors.tick(&mut dom);
    println!("{}", dom.text_content(button));

    for _ in 0..3 {
        dom.click(button);
        behaviors.tick(&mut dom);
        println!("{}", dom.text_content(button));
    }

    Ok(())
}
