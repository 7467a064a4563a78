//! Integration tests for the tree synchronization engine: a mock transport
//! plays the remote browser and the tests drive patches, navigations and
//! failures through the public API.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use axterm::protocol::NodeId;
use axterm::tree::{AccessibilityTree, TreeNotification};
use common::{node, sample_page, MockTransport};

async fn wait_changed(rx: &mut tokio::sync::mpsc::UnboundedReceiver<TreeNotification>) {
    loop {
        let notification = timeout(Duration::from_secs(30), rx.recv())
            .await
            .expect("timed out waiting for a notification")
            .expect("engine dropped the notification channel");
        match notification {
            TreeNotification::Changed => return,
            TreeNotification::Error(e) => panic!("unexpected error notification: {e}"),
        }
    }
}

#[tokio::test]
async fn initialize_mirrors_the_whole_page() {
    let transport = MockTransport::new(sample_page());
    let mut tree = AccessibilityTree::new(transport);
    let mut rx = tree.take_notifications().unwrap();
    tree.initialize().await.unwrap();
    wait_changed(&mut rx).await;

    let root = tree.current_root().expect("root after initialize");
    assert_eq!(root.id, NodeId::from("root"));
    assert_eq!(root.role, "RootWebArea");
    // Every node of the fixture made it into the mirror.
    for id in ["h", "ht", "p", "pt", "a", "at", "l", "i1", "t1", "i2", "t2"] {
        assert!(tree.lookup(&NodeId::from(id)).is_some(), "missing {id}");
    }
    tree.dispose().await;
}

#[tokio::test]
async fn patch_updates_surface_through_notifications() {
    let transport = MockTransport::new(sample_page());
    let mut tree = AccessibilityTree::new(Arc::clone(&transport) as Arc<dyn axterm::protocol::Transport>);
    let mut rx = tree.take_notifications().unwrap();
    tree.initialize().await.unwrap();
    wait_changed(&mut rx).await;

    transport.patch(vec![node(serde_json::json!({
        "id": "pt", "role": "StaticText", "parentId": "p", "name": "Skim the"
    }))]);
    wait_changed(&mut rx).await;

    let updated = tree.lookup(&NodeId::from("pt")).unwrap();
    assert_eq!(updated.raw.name.as_deref(), Some("Skim the"));
    // The parent still lists it at the same position.
    let parent = tree.lookup(&NodeId::from("p")).unwrap();
    assert_eq!(parent.children[0], NodeId::from("pt"));
    tree.dispose().await;
}

#[tokio::test]
async fn navigation_drops_stale_patches_and_reconstructs() {
    let transport = MockTransport::new(sample_page());
    let mut tree = AccessibilityTree::new(Arc::clone(&transport) as Arc<dyn axterm::protocol::Transport>);
    let mut rx = tree.take_notifications().unwrap();
    tree.initialize().await.unwrap();
    wait_changed(&mut rx).await;

    transport.send(axterm::protocol::TreeEvent::DocumentAboutToLoad);
    // Late patch from the dying document; must not resurrect anything.
    transport.patch(vec![node(serde_json::json!({
        "id": "ghost", "role": "paragraph", "parentId": "root"
    }))]);
    transport.set_page(vec![
        node(serde_json::json!({
            "id": "root2", "role": "RootWebArea", "name": "Next", "childIds": ["t"]
        })),
        node(serde_json::json!({
            "id": "t", "role": "StaticText", "parentId": "root2", "name": "landed"
        })),
    ]);
    transport.send(axterm::protocol::TreeEvent::DocumentLoaded);
    wait_changed(&mut rx).await;

    let root = tree.current_root().unwrap();
    assert_eq!(root.id, NodeId::from("root2"));
    assert!(tree.lookup(&NodeId::from("ghost")).is_none());
    assert!(tree.lookup(&NodeId::from("h")).is_none());
    tree.dispose().await;
}

#[tokio::test]
async fn dispose_during_a_slow_reconstruct_keeps_the_old_mirror() {
    let transport = MockTransport::new(sample_page());
    let mut tree = AccessibilityTree::new(Arc::clone(&transport) as Arc<dyn axterm::protocol::Transport>);
    let mut rx = tree.take_notifications().unwrap();
    tree.initialize().await.unwrap();
    wait_changed(&mut rx).await;

    // The next reconstruct parks on the root's children.
    let gate = transport.block_children_of("root2");
    transport.set_page(vec![
        node(serde_json::json!({
            "id": "root2", "role": "RootWebArea", "childIds": ["t"]
        })),
        node(serde_json::json!({
            "id": "t", "role": "StaticText", "parentId": "root2", "name": "late"
        })),
    ]);
    transport.send(axterm::protocol::TreeEvent::DocumentLoaded);
    // Let the engine start the reconstruct and hit the gate.
    tokio::time::sleep(Duration::from_millis(50)).await;

    tree.dispose().await;
    gate.notify_one();

    // The half-fetched page never replaced the mirror.
    assert_eq!(tree.current_root().unwrap().id, NodeId::from("root"));
    assert!(tree.lookup(&NodeId::from("root2")).is_none());
}

#[tokio::test(start_paused = true)]
async fn transport_failure_during_reconcile_schedules_a_reconstruct() {
    let transport = MockTransport::new(sample_page());
    let mut tree = AccessibilityTree::new(Arc::clone(&transport) as Arc<dyn axterm::protocol::Transport>);
    let mut rx = tree.take_notifications().unwrap();
    tree.initialize().await.unwrap();
    wait_changed(&mut rx).await;

    // The patch references a child the mirror has never seen; the
    // supplemental fetch for it fails once.
    *transport.fail_children_once.lock().unwrap() = Some(NodeId::from("p2"));
    let mut page = sample_page();
    page[0] = node(serde_json::json!({
        "id": "root", "role": "RootWebArea", "name": "Example",
        "childIds": ["h", "p", "l", "p2"]
    }));
    page.push(node(serde_json::json!({
        "id": "p2", "role": "paragraph", "parentId": "root", "childIds": ["x"]
    })));
    page.push(node(serde_json::json!({
        "id": "x", "role": "StaticText", "parentId": "p2", "name": "appended"
    })));
    transport.set_page(page);
    transport.patch(vec![node(serde_json::json!({
        "id": "p2", "role": "paragraph", "parentId": "root", "childIds": ["x"]
    }))]);

    // The debounced reconstruct recovers the whole page.
    wait_changed(&mut rx).await;
    assert!(tree.lookup(&NodeId::from("x")).is_some());
    assert_eq!(
        tree.lookup(&NodeId::from("root")).unwrap().children.last(),
        Some(&NodeId::from("p2"))
    );
    tree.dispose().await;
}
