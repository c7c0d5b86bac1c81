//! Fitment tree expansion, lazy loading and failure handling

mod helpers;

use std::sync::Arc;

use partnav_common::events::{EventBus, NavigatorEvent};
use partnav_common::{NodeKey, TreeLevel};
use partnav_engine::{ExpansionController, ExpansionOutcome, FitmentTree, NodeLoad, TreeNode};

use helpers::{count_type, drain, sample_provider, vehicle_result, ScriptedProvider};

#[tokio::test]
async fn test_collapse_then_reexpand_fetches_again() {
    let provider = sample_provider();
    let tree = FitmentTree::new(provider.clone(), EventBus::new(64));
    let node = TreeNode::Model { year: 2010, make_id: 5, model_id: 20 };

    tree.toggle(node).await;
    tree.toggle(node).await;
    assert!(!tree.is_expanded(&node.key()).await);
    tree.toggle(node).await;

    assert_eq!(provider.stats().engines, 2);
    assert_eq!(tree.engines(5, 20).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_collapse_only_flips_the_collapsed_node() {
    let provider = sample_provider();
    let tree = FitmentTree::new(provider, EventBus::new(64));

    tree.expand(TreeNode::Year(2010)).await;
    tree.expand(TreeNode::Make { year: 2010, make_id: 5 }).await;
    tree.collapse(TreeNode::Year(2010)).await;

    // Children keep their own state; only the collapsed node flips
    assert!(tree.is_expanded(&NodeKey::Make { year: 2010, make_id: 5 }).await);
    assert_eq!(tree.expanded_keys(Some(TreeLevel::Year)).await, Vec::<NodeKey>::new());
}

#[tokio::test]
async fn test_failed_fetch_leaves_node_expanded_and_empty() {
    let provider = Arc::new(ScriptedProvider::new().fail_makes(2009));
    let tree = FitmentTree::new(provider, EventBus::new(64));
    let mut rx = tree.subscribe();

    assert!(tree.expand(TreeNode::Year(2009)).await);

    let key = NodeKey::Year { year: 2009 };
    assert!(tree.is_expanded(&key).await);
    assert!(matches!(tree.node_load(&key).await, Some(NodeLoad::Failed(_))));
    assert!(tree.makes(2009).await.is_none());
    assert_eq!(tree.stats().await.failed, 1);

    let events = drain(&mut rx);
    assert_eq!(count_type(&events, "NodeExpanded"), 1);
    match events.last() {
        Some(NavigatorEvent::NodeLoadFailed { key: failed, message, .. }) => {
            assert_eq!(*failed, key);
            assert!(message.contains("2009"));
        }
        other => panic!("unexpected event {:?}", other),
    }

    // Other years are unaffected
    tree.expand(TreeNode::Year(2010)).await;
    assert_eq!(tree.makes(2010).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_expand_to_make_leaves_lower_levels_unset() {
    let provider = sample_provider();
    let controller = ExpansionController::new(FitmentTree::new(provider.clone(), EventBus::new(64)));

    let outcome = controller.expand_to_vehicle(&vehicle_result(2010, Some(5), None)).await;

    let tree = controller.tree();
    assert!(tree.is_expanded(&NodeKey::Year { year: 2010 }).await);
    assert!(tree.is_expanded(&NodeKey::Make { year: 2010, make_id: 5 }).await);
    assert!(tree.expanded_keys(Some(TreeLevel::Model)).await.is_empty());
    assert!(tree.expanded_keys(Some(TreeLevel::Engine)).await.is_empty());

    let path = tree.selected_path().await;
    assert_eq!(path.year, Some(2010));
    assert_eq!(path.make_id, Some(5));
    assert_eq!(path.model_id, None);
    assert_eq!(path.engine_id, None);
    assert_eq!(path.category_id, None);
    assert_eq!(outcome, ExpansionOutcome::Revealed { path });

    assert_eq!(provider.stats().makes, 1);
    assert_eq!(provider.stats().models, 1);
}

#[tokio::test]
async fn test_revealing_again_does_not_refetch() {
    let provider = sample_provider();
    let controller = ExpansionController::new(FitmentTree::new(provider.clone(), EventBus::new(64)));
    let result = vehicle_result(2010, Some(5), Some(20));

    controller.expand_to_vehicle(&result).await;
    controller.expand_to_vehicle(&result).await;

    let counts = provider.stats();
    assert_eq!((counts.makes, counts.models, counts.engines), (1, 1, 1));
}

#[tokio::test]
async fn test_new_path_replaces_previous_wholesale() {
    let provider = sample_provider();
    let controller = ExpansionController::new(FitmentTree::new(provider, EventBus::new(64)));

    controller.expand_to_vehicle(&vehicle_result(2010, Some(5), Some(20))).await;
    controller.expand_to_vehicle(&vehicle_result(2011, None, None)).await;

    let path = controller.tree().selected_path().await;
    assert_eq!(path.year, Some(2011));
    assert_eq!(path.make_id, None);
    assert_eq!(path.model_id, None);
}
