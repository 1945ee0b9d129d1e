//! Structural-change notifications for editors and tree/graph views.

use bn_core::BehaviorId;

/// Callbacks invoked by [`BehaviorNetwork`][crate::BehaviorNetwork] after a
/// structural edit succeeds.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.  Observers are owned by the network and
/// must be `Send` so the network can move onto the compute thread.
pub trait NetworkObserver: Send {
    /// A behavior was added (directly, by paste, or by loading a description).
    fn on_behavior_added(&mut self, _id: BehaviorId, _name: &str) {}

    /// A behavior and all its edges were removed.
    fn on_behavior_removed(&mut self, _id: BehaviorId) {}

    /// A behavior changed layout position.
    fn on_behavior_moved(&mut self, _id: BehaviorId, _index: usize) {}
}
