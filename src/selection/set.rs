use std::sync::Arc;

use log::debug;
use tokio::sync::watch;

use crate::models::{Place, PlaceId};

/// Immutable view of the selection at one version. Consumers render from
/// this; mutations always go back through [`SelectionSet`].
#[derive(Debug, Clone, Default)]
pub struct SelectionSnapshot {
    version: u64,
    places: Arc<Vec<Place>>,
}

impl SelectionSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn contains(&self, id: &PlaceId) -> bool {
        self.places.iter().any(|place| &place.id == id)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    fn with_places(&self, places: Vec<Place>) -> Self {
        Self {
            version: self.version + 1,
            places: Arc::new(places),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Added,
    Removed,
}

/// Places the user has put on the map. Cloning yields another handle to
/// the same set.
#[derive(Clone)]
pub struct SelectionSet {
    tx: Arc<watch::Sender<SelectionSnapshot>>,
}

impl Default for SelectionSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionSet {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SelectionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    /// Returns `true` if the place was inserted.
    pub fn add(&self, place: Place) -> bool {
        self.tx.send_if_modified(|current| {
            if current.contains(&place.id) {
                return false;
            }

            debug!("selection add {}", place.id);
            let mut places = current.places().to_vec();
            places.push(place);
            *current = current.with_places(places);
            true
        })
    }

    /// Returns `true` if a place was removed.
    pub fn remove(&self, id: &PlaceId) -> bool {
        self.tx.send_if_modified(|current| {
            if !current.contains(id) {
                return false;
            }

            debug!("selection remove {id}");
            let places = current
                .places()
                .iter()
                .filter(|place| &place.id != id)
                .cloned()
                .collect();
            *current = current.with_places(places);
            true
        })
    }

    pub fn toggle(&self, place: Place) -> Membership {
        let mut outcome = Membership::Added;
        self.tx.send_modify(|current| {
            let places = if current.contains(&place.id) {
                outcome = Membership::Removed;
                current
                    .places()
                    .iter()
                    .filter(|existing| existing.id != place.id)
                    .cloned()
                    .collect()
            } else {
                let mut places = current.places().to_vec();
                places.push(place);
                places
            };
            *current = current.with_places(places);
        });
        debug!("selection toggle -> {outcome:?}");
        outcome
    }

    pub fn contains(&self, id: &PlaceId) -> bool {
        self.tx.borrow().contains(id)
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        self.tx.borrow().clone()
    }

    /// Receivers are notified once per effective mutation; no-op adds and
    /// removes do not wake them.
    pub fn subscribe(&self) -> watch::Receiver<SelectionSnapshot> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str, name: &str) -> Place {
        Place {
            id: PlaceId::new(id),
            name: name.into(),
            category: "restaurant".into(),
            rating: 4.0,
            num_ratings: 10,
            photo_url: format!("https://img.example/{id}.jpg"),
            location: None,
        }
    }

    #[test]
    fn add_is_idempotent() {
        let set = SelectionSet::new();
        assert!(set.add(place("a", "Noodle Bar")));
        assert!(!set.add(place("a", "Noodle Bar")));

        let snapshot = set.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.version(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let set = SelectionSet::new();
        set.add(place("a", "Noodle Bar"));

        assert!(set.remove(&PlaceId::new("a")));
        assert!(!set.remove(&PlaceId::new("a")));

        let snapshot = set.snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.version(), 2);
    }

    #[test]
    fn toggle_twice_restores_membership() {
        let set = SelectionSet::new();
        let target = place("a", "Noodle Bar");

        assert_eq!(set.toggle(target.clone()), Membership::Added);
        assert_eq!(set.toggle(target.clone()), Membership::Removed);
        assert!(!set.contains(&target.id));

        set.add(target.clone());
        set.toggle(target.clone());
        set.toggle(target.clone());
        assert!(set.contains(&target.id));
    }

    #[test]
    fn same_name_different_ids_are_distinct() {
        let set = SelectionSet::new();
        set.add(place("a", "Central Park"));
        set.add(place("b", "Central Park"));
        assert_eq!(set.snapshot().len(), 2);

        set.remove(&PlaceId::new("a"));
        let snapshot = set.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains(&PlaceId::new("b")));
    }

    #[test]
    fn earlier_snapshots_are_unaffected_by_later_mutations() {
        let set = SelectionSet::new();
        set.add(place("a", "Noodle Bar"));
        let before = set.snapshot();

        set.add(place("b", "Taco Stand"));
        assert_eq!(before.len(), 1);
        assert_eq!(set.snapshot().len(), 2);
    }

    #[test]
    fn clones_share_the_same_set() {
        let set = SelectionSet::new();
        let card_handle = set.clone();
        card_handle.add(place("a", "Noodle Bar"));
        assert!(set.contains(&PlaceId::new("a")));
    }

    #[tokio::test]
    async fn subscribers_see_only_effective_mutations() {
        let set = SelectionSet::new();
        let mut rx = set.subscribe();

        set.add(place("a", "Noodle Bar"));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        set.add(place("a", "Noodle Bar"));
        set.remove(&PlaceId::new("zzz"));
        assert!(!rx.has_changed().unwrap());
    }
}
