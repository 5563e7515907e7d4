//! Game events emitted by components and collected per scene.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// A notable occurrence during a frame, attributed to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Event type identifier (e.g. "animation_ended").
    pub event_type: String,
    /// Entity that emitted the event.
    pub entity: EntityId,
    /// Free-form payload.
    pub details: Vec<String>,
    /// Frame on which it was emitted.
    pub frame: u64,
}

/// FIFO of events waiting for the game to read them.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GameEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneId;

    fn event(name: &str) -> GameEvent {
        GameEvent {
            event_type: name.to_owned(),
            entity: EntityId::new(SceneId(0), 0, 0),
            details: vec![],
            frame: 3,
        }
    }

    #[test]
    fn drain_empties_in_order() {
        let mut queue = EventQueue::new();
        queue.push(event("a"));
        queue.push(event("b"));
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert_eq!(drained[0].event_type, "a");
        assert_eq!(drained[1].event_type, "b");
        assert!(queue.is_empty());
    }

    #[test]
    fn event_serializes() {
        let json = serde_json::to_string(&event("hit")).unwrap();
        assert!(json.contains("\"event_type\":\"hit\""));
    }
}
