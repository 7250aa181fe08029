//! Mutation observer delivery across tree boundaries
//!
//! Documents, frame documents and shadow roots are separate trees: a
//! `subtree` registration on one never sees changes inside another.

use fos_dom::{Dom, MutationObserverInit, MutationType, ShadowRootInit};

fn tree_options() -> MutationObserverInit {
    MutationObserverInit {
        child_list: true,
        attributes: true,
        subtree: true,
        ..Default::default()
    }
}

#[test]
fn test_document_observer_sees_descendant_changes() {
    let mut dom = Dom::new("https://example.com/").unwrap();
    let main = dom.main_document();
    let body = dom.body(main).unwrap();
    let observer = dom.observers_mut().create();
    dom.observers_mut().observe(observer, main, tree_options());

    let div = dom.create_element(main, "div").unwrap();
    dom.append_child(body, div).unwrap();
    dom.set_attribute(div, "has", "counter").unwrap();

    let records = dom.observers_mut().take_records(observer);
    assert_eq!(records.len(), 2, "insert and attribute change expected");
    assert_eq!(records[0].mutation_type, MutationType::ChildList);
    assert_eq!(records[0].target, body);
    assert_eq!(records[0].added_nodes, vec![div]);
    assert_eq!(records[1].attribute_name.as_deref(), Some("has"));
}

#[test]
fn test_shadow_root_is_a_separate_tree() {
    let mut dom = Dom::new("https://example.com/").unwrap();
    let main = dom.main_document();
    let body = dom.body(main).unwrap();
    let host = dom.create_element(main, "div").unwrap();
    dom.append_child(body, host).unwrap();
    let root = dom.attach_shadow(host, ShadowRootInit::open()).unwrap();

    let observer = dom.observers_mut().create();
    dom.observers_mut().observe(observer, main, tree_options());

    let inner = dom.create_element(main, "p").unwrap();
    dom.append_child(root, inner).unwrap();
    assert!(
        !dom.observers().has_pending(observer),
        "document observer must not see shadow content"
    );

    dom.observers_mut().observe(observer, root, tree_options());
    dom.set_attribute(inner, "has", "x").unwrap();
    assert_eq!(dom.observers_mut().take_records(observer).len(), 1);
}

#[test]
fn test_frame_document_is_a_separate_tree() {
    let mut dom = Dom::new("https://example.com/").unwrap();
    let main = dom.main_document();
    let body = dom.body(main).unwrap();
    let iframe = dom.create_element(main, "iframe").unwrap();
    dom.append_child(body, iframe).unwrap();
    let frame_doc = dom.attach_frame(iframe, "https://example.com/inner").unwrap();
    let frame_body = dom.body(frame_doc).unwrap();

    let observer = dom.observers_mut().create();
    dom.observers_mut().observe(observer, main, tree_options());

    let div = dom.create_element(frame_doc, "div").unwrap();
    dom.append_child(frame_body, div).unwrap();
    assert!(!dom.observers().has_pending(observer));
}

#[test]
fn test_move_between_documents_queues_removal_then_insertion() {
    let mut dom = Dom::new("https://example.com/").unwrap();
    let main = dom.main_document();
    let body = dom.body(main).unwrap();
    let iframe = dom.create_element(main, "iframe").unwrap();
    dom.append_child(body, iframe).unwrap();
    let frame_doc = dom.attach_frame(iframe, "https://example.com/inner").unwrap();
    let frame_body = dom.body(frame_doc).unwrap();

    let div = dom.create_element(main, "div").unwrap();
    dom.append_child(body, div).unwrap();

    let observer = dom.observers_mut().create();
    dom.observers_mut().observe(observer, main, tree_options());
    dom.observers_mut().observe(observer, frame_doc, tree_options());

    dom.append_child(frame_body, div).unwrap();

    let records = dom.observers_mut().take_records(observer);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].removed_nodes, vec![div]);
    assert_eq!(records[1].added_nodes, vec![div]);
    assert_eq!(dom.owner_document(div), Some(frame_doc));
}

#[test]
fn test_destroyed_frame_content_goes_stale() {
    let mut dom = Dom::new("https://example.com/").unwrap();
    let main = dom.main_document();
    let body = dom.body(main).unwrap();
    let iframe = dom.create_element(main, "iframe").unwrap();
    dom.append_child(body, iframe).unwrap();
    let frame_doc = dom.attach_frame(iframe, "https://example.com/inner").unwrap();
    let frame_body = dom.body(frame_doc).unwrap();

    dom.remove(iframe).unwrap();
    dom.destroy(iframe).unwrap();

    assert!(!dom.contains(iframe));
    assert!(!dom.contains(frame_doc));
    assert!(!dom.contains(frame_body));
    assert!(dom.children(body).is_empty());
}
