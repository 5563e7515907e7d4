//! Deferred add/remove list shared by entity lists and component lists.
//!
//! A [`DeferredList`] keeps a *live* sequence that is iterated once per
//! frame, plus two queues. [`add`](DeferredList::add) and
//! [`remove`](DeferredList::remove) only touch the queues; the live sequence
//! changes at exactly one point, the start of [`update`](DeferredList::update):
//!
//! 1. Queued additions are appended to the live sequence in queue order and
//!    `on_added` fires for each. They are remembered as "just admitted".
//! 2. Queued removals fire `on_removed` and are excised.
//! 3. `awake` fires once for every just-admitted item that is still live.
//! 4. `update` fires for every live item, in sequence order.
//!
//! What each hook does is decided by the owner through [`ListHooks`], so the
//! same list drives entities in a scene and components on an entity.
//!
//! # Example
//!
//! ```
//! use sprig_ecs::deferred::{DeferredList, ListHooks, ListItem};
//!
//! #[derive(Debug)]
//! struct Counter { id: u32, ticks: u32 }
//!
//! impl ListItem for Counter {
//!     type Key = u32;
//!     const LABEL: &'static str = "counter";
//!     fn key(&self) -> u32 { self.id }
//! }
//!
//! struct Tick;
//! impl ListHooks<Counter> for Tick {
//!     fn update(&mut self, item: &mut Counter) { item.ticks += 1; }
//! }
//!
//! let mut list = DeferredList::new();
//! list.add(Counter { id: 1, ticks: 0 }).unwrap();
//! assert_eq!(list.len(), 0); // still queued
//!
//! list.update(&mut Tick);
//! assert_eq!(list.get(1).unwrap().ticks, 1);
//! ```

use std::fmt;

use crate::EcsError;

// ---------------------------------------------------------------------------
// ListItem / ListHooks
// ---------------------------------------------------------------------------

/// Something that can live in a [`DeferredList`].
pub trait ListItem {
    /// Stable identity of the item inside its list.
    type Key: Copy + Eq + fmt::Debug;

    /// Human-readable item kind used in error messages ("entity", "component").
    const LABEL: &'static str;

    fn key(&self) -> Self::Key;

    /// Whether `self` may not coexist with `other` in the same list.
    ///
    /// Defaults to key equality. Items that disallow multiple instances of a
    /// kind widen this to "same kind".
    fn conflicts_with(&self, other: &Self) -> bool {
        self.key() == other.key()
    }

    fn can_be_removed(&self) -> bool {
        true
    }

    /// Description used in error messages.
    fn describe(&self) -> String {
        format!("{} {:?}", Self::LABEL, self.key())
    }
}

/// Callbacks fired by [`DeferredList::update`].
pub trait ListHooks<T> {
    fn on_added(&mut self, _item: &mut T) {}
    fn on_removed(&mut self, _item: &mut T) {}
    fn awake(&mut self, _item: &mut T) {}
    fn update(&mut self, item: &mut T);
}

// ---------------------------------------------------------------------------
// LifecycleState / Removal
// ---------------------------------------------------------------------------

/// Where an item is in its list lifecycle.
///
/// `Detached` covers both "never added" and "already removed"; the list keeps
/// no record of items it no longer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    PendingAdd,
    Live,
    PendingRemove,
    Detached,
}

/// Outcome of a successful [`DeferredList::remove`].
#[derive(Debug)]
pub enum Removal<T> {
    /// The item is live and will be removed at the next flush.
    Queued,
    /// The item was still waiting to be added. It never became live, so it is
    /// handed back and no hooks fire for it.
    Cancelled(T),
}

// ---------------------------------------------------------------------------
// DeferredList
// ---------------------------------------------------------------------------

/// A list whose structural changes are deferred to the next update.
pub struct DeferredList<T: ListItem> {
    live: Vec<T>,
    pending_add: Vec<T>,
    pending_remove: Vec<T::Key>,
    just_added: Vec<T::Key>,
}

impl<T: ListItem> DeferredList<T> {
    pub fn new() -> Self {
        Self {
            live: Vec::new(),
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
            just_added: Vec::new(),
        }
    }

    /// Queue `item` for addition at the next flush.
    ///
    /// Fails with [`EcsError::Duplicate`] if a conflicting item is live (and
    /// not queued for removal) or already queued for addition.
    pub fn add(&mut self, item: T) -> Result<T::Key, EcsError> {
        let conflict = self
            .live
            .iter()
            .filter(|existing| !self.pending_remove.contains(&existing.key()))
            .chain(self.pending_add.iter())
            .find(|existing| existing.conflicts_with(&item) || item.conflicts_with(existing));
        if let Some(existing) = conflict {
            return Err(EcsError::Duplicate {
                what: existing.describe(),
            });
        }
        let key = item.key();
        self.pending_add.push(item);
        Ok(key)
    }

    /// Queue the item with `key` for removal at the next flush.
    ///
    /// An item that is only queued for addition is cancelled instead. Fails
    /// with [`EcsError::NotRemovable`] if the item refuses removal and
    /// [`EcsError::NotFound`] if it is absent or already queued for removal.
    pub fn remove(&mut self, key: T::Key) -> Result<Removal<T>, EcsError> {
        if let Some(pos) = self.pending_add.iter().position(|i| i.key() == key) {
            let item = &self.pending_add[pos];
            if !item.can_be_removed() {
                return Err(EcsError::NotRemovable {
                    what: item.describe(),
                });
            }
            return Ok(Removal::Cancelled(self.pending_add.remove(pos)));
        }

        let item = self
            .live
            .iter()
            .find(|i| i.key() == key)
            .filter(|_| !self.pending_remove.contains(&key))
            .ok_or_else(|| EcsError::NotFound {
                what: format!("{} {:?}", T::LABEL, key),
            })?;
        if !item.can_be_removed() {
            return Err(EcsError::NotRemovable {
                what: item.describe(),
            });
        }
        self.pending_remove.push(key);
        Ok(Removal::Queued)
    }

    /// Apply queued additions and removals, then awaken the new arrivals.
    ///
    /// This is steps 1-3 of [`update`](Self::update).
    pub fn flush<H: ListHooks<T>>(&mut self, hooks: &mut H) {
        for item in std::mem::take(&mut self.pending_add) {
            let index = self.live.len();
            self.just_added.push(item.key());
            self.live.push(item);
            hooks.on_added(&mut self.live[index]);
        }

        for key in std::mem::take(&mut self.pending_remove) {
            if let Some(pos) = self.live.iter().position(|i| i.key() == key) {
                hooks.on_removed(&mut self.live[pos]);
                self.live.remove(pos);
            }
        }

        for key in std::mem::take(&mut self.just_added) {
            if let Some(item) = self.live.iter_mut().find(|i| i.key() == key) {
                hooks.awake(item);
            }
        }
    }

    /// Flush, then run `hooks.update` on every live item in order.
    pub fn update<H: ListHooks<T>>(&mut self, hooks: &mut H) {
        self.flush(hooks);
        for item in &mut self.live {
            hooks.update(item);
        }
    }

    /// Remove everything immediately: `on_removed` fires for each live item
    /// and queued additions are dropped without hooks.
    pub fn clear<H: ListHooks<T>>(&mut self, hooks: &mut H) {
        self.pending_add.clear();
        self.pending_remove.clear();
        self.just_added.clear();
        for mut item in self.live.drain(..) {
            hooks.on_removed(&mut item);
        }
    }

    pub fn state(&self, key: T::Key) -> LifecycleState {
        if self.pending_add.iter().any(|i| i.key() == key) {
            LifecycleState::PendingAdd
        } else if self.pending_remove.contains(&key) {
            LifecycleState::PendingRemove
        } else if self.live.iter().any(|i| i.key() == key) {
            LifecycleState::Live
        } else {
            LifecycleState::Detached
        }
    }

    /// Find a live or queued item by key.
    pub fn get(&self, key: T::Key) -> Option<&T> {
        self.live
            .iter()
            .chain(self.pending_add.iter())
            .find(|i| i.key() == key)
    }

    /// Mutable lookup of a live or queued item by key.
    pub fn get_mut(&mut self, key: T::Key) -> Option<&mut T> {
        self.live
            .iter_mut()
            .chain(self.pending_add.iter_mut())
            .find(|i| i.key() == key)
    }

    /// The live sequence, in insertion order.
    pub fn live(&self) -> &[T] {
        &self.live
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.live.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.live.iter_mut()
    }

    /// Live items followed by items queued for addition.
    pub fn iter_with_pending(&self) -> impl Iterator<Item = &T> {
        self.live.iter().chain(self.pending_add.iter())
    }

    /// Live items that are not queued for removal, then queued additions.
    /// This is the set a new item is checked against.
    pub fn iter_effective(&self) -> impl Iterator<Item = &T> {
        self.live
            .iter()
            .filter(|i| !self.pending_remove.contains(&i.key()))
            .chain(self.pending_add.iter())
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn pending_add_count(&self) -> usize {
        self.pending_add.len()
    }

    pub fn pending_remove_count(&self) -> usize {
        self.pending_remove.len()
    }
}

impl<T: ListItem> Default for DeferredList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ListItem + fmt::Debug> fmt::Debug for DeferredList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredList")
            .field("live", &self.live)
            .field("pending_add", &self.pending_add)
            .field("pending_remove", &self.pending_remove)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Item {
        id: u32,
        kind: &'static str,
        multiple: bool,
        removable: bool,
    }

    impl Item {
        fn new(id: u32) -> Self {
            Self {
                id,
                kind: "plain",
                multiple: true,
                removable: true,
            }
        }
    }

    impl ListItem for Item {
        type Key = u32;
        const LABEL: &'static str = "item";

        fn key(&self) -> u32 {
            self.id
        }

        fn conflicts_with(&self, other: &Self) -> bool {
            self.id == other.id || (self.kind == other.kind && !self.multiple)
        }

        fn can_be_removed(&self) -> bool {
            self.removable
        }
    }

    /// Records every hook call as `"<hook>:<id>"`.
    #[derive(Default)]
    struct Log(Vec<String>);

    impl ListHooks<Item> for Log {
        fn on_added(&mut self, item: &mut Item) {
            self.0.push(format!("added:{}", item.id));
        }
        fn on_removed(&mut self, item: &mut Item) {
            self.0.push(format!("removed:{}", item.id));
        }
        fn awake(&mut self, item: &mut Item) {
            self.0.push(format!("awake:{}", item.id));
        }
        fn update(&mut self, item: &mut Item) {
            self.0.push(format!("update:{}", item.id));
        }
    }

    #[test]
    fn add_is_deferred_until_update() {
        let mut list = DeferredList::new();
        list.add(Item::new(1)).unwrap();
        assert_eq!(list.len(), 0);
        assert_eq!(list.state(1), LifecycleState::PendingAdd);

        let mut log = Log::default();
        list.update(&mut log);
        assert_eq!(list.len(), 1);
        assert_eq!(list.state(1), LifecycleState::Live);
        assert_eq!(log.0, ["added:1", "awake:1", "update:1"]);
    }

    #[test]
    fn hook_order_within_one_update() {
        let mut list = DeferredList::new();
        let mut log = Log::default();
        list.add(Item::new(1)).unwrap();
        list.update(&mut log);
        log.0.clear();

        list.add(Item::new(2)).unwrap();
        list.add(Item::new(3)).unwrap();
        list.remove(1).unwrap();
        list.update(&mut log);

        assert_eq!(
            log.0,
            ["added:2", "added:3", "removed:1", "awake:2", "awake:3", "update:2", "update:3"]
        );
    }

    #[test]
    fn awake_fires_only_once() {
        let mut list = DeferredList::new();
        let mut log = Log::default();
        list.add(Item::new(7)).unwrap();
        for _ in 0..3 {
            list.update(&mut log);
        }
        assert_eq!(log.0.iter().filter(|s| *s == "awake:7").count(), 1);
        assert_eq!(log.0.iter().filter(|s| *s == "update:7").count(), 3);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut list = DeferredList::new();
        list.add(Item::new(1)).unwrap();
        assert!(matches!(list.add(Item::new(1)), Err(EcsError::Duplicate { .. })));

        list.update(&mut Log::default());
        assert!(matches!(list.add(Item::new(1)), Err(EcsError::Duplicate { .. })));
    }

    #[test]
    fn single_instance_kind_is_rejected() {
        let single = |id| Item {
            id,
            kind: "camera",
            multiple: false,
            removable: true,
        };
        let mut list = DeferredList::new();
        list.add(single(1)).unwrap();
        assert!(matches!(list.add(single(2)), Err(EcsError::Duplicate { .. })));
        assert!(list.add(Item::new(3)).is_ok());
    }

    #[test]
    fn re_adding_a_kind_queued_for_removal_is_allowed() {
        let single = |id| Item {
            id,
            kind: "camera",
            multiple: false,
            removable: true,
        };
        let mut list = DeferredList::new();
        list.add(single(1)).unwrap();
        list.update(&mut Log::default());

        list.remove(1).unwrap();
        assert!(list.add(single(2)).is_ok());
    }

    #[test]
    fn remove_errors() {
        let mut list = DeferredList::new();
        assert!(matches!(list.remove(9), Err(EcsError::NotFound { .. })));

        list.add(Item {
            removable: false,
            ..Item::new(1)
        })
        .unwrap();
        list.update(&mut Log::default());
        assert!(matches!(list.remove(1), Err(EcsError::NotRemovable { .. })));

        list.add(Item::new(2)).unwrap();
        list.update(&mut Log::default());
        list.remove(2).unwrap();
        assert!(matches!(list.remove(2), Err(EcsError::NotFound { .. })));
    }

    #[test]
    fn removing_a_pending_add_cancels_it() {
        let mut list = DeferredList::new();
        list.add(Item::new(4)).unwrap();
        let removal = list.remove(4).unwrap();
        assert!(matches!(removal, Removal::Cancelled(Item { id: 4, .. })));

        let mut log = Log::default();
        list.update(&mut log);
        assert!(log.0.is_empty());
        assert_eq!(list.state(4), LifecycleState::Detached);
    }

    #[test]
    fn clear_fires_on_removed_for_live_items_only() {
        let mut list = DeferredList::new();
        list.add(Item::new(1)).unwrap();
        list.update(&mut Log::default());
        list.add(Item::new(2)).unwrap();

        let mut log = Log::default();
        list.clear(&mut log);
        assert_eq!(log.0, ["removed:1"]);
        assert!(list.is_empty());
        assert_eq!(list.pending_add_count(), 0);
    }

    #[test]
    fn get_sees_pending_items() {
        let mut list = DeferredList::new();
        list.add(Item::new(5)).unwrap();
        assert!(list.get(5).is_some());
        assert_eq!(list.iter().count(), 0);
        assert_eq!(list.iter_with_pending().count(), 1);
    }
}
