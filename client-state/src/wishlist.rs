use crate::persist::{Persisted, PersistedStore, StateContainer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type WishlistStore<S> = PersistedStore<Wishlist, S>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WishlistKind {
    Product,
    Photoshoot,
}

/// Display fields copied from the product or look when it is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub id: Uuid,
    pub kind: WishlistKind,
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: Uuid,
    pub kind: WishlistKind,
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    pub slug: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum WishlistAction {
    AddItem(WishlistEntry),
    RemoveItem(Uuid),
    Clear,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_in_wishlist(&self, id: Uuid) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    fn add_item(&mut self, entry: WishlistEntry) {
        if self.is_in_wishlist(entry.id) {
            return;
        }
        self.items.push(WishlistItem {
            id: entry.id,
            kind: entry.kind,
            name: entry.name,
            price: entry.price,
            image: entry.image,
            slug: entry.slug,
            added_at: Utc::now(),
        });
    }
}

impl StateContainer for Wishlist {
    type Action = WishlistAction;

    fn apply(&mut self, action: WishlistAction) {
        match action {
            WishlistAction::AddItem(entry) => self.add_item(entry),
            WishlistAction::RemoveItem(id) => self.items.retain(|item| item.id != id),
            WishlistAction::Clear => self.items.clear(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct WishlistSnapshot {
    items: Vec<WishlistItem>,
}

impl Persisted for Wishlist {
    const STORAGE_NAME: &'static str = "wishlist-storage";
    type Snapshot = WishlistSnapshot;

    fn snapshot(&self) -> WishlistSnapshot {
        WishlistSnapshot {
            items: self.items.clone(),
        }
    }

    fn restore(snapshot: WishlistSnapshot) -> Self {
        let mut wishlist = Wishlist::default();
        for item in snapshot.items {
            if !wishlist.is_in_wishlist(item.id) {
                wishlist.items.push(item);
            }
        }
        wishlist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStorage;

    fn look(n: u128) -> WishlistEntry {
        WishlistEntry {
            id: Uuid::from_u128(n),
            kind: WishlistKind::Photoshoot,
            name: format!("Spring garden look {}", n),
            price: 120_000,
            image: None,
            slug: format!("spring-garden-{}", n),
        }
    }

    #[test]
    fn adding_twice_keeps_one_entry() {
        let mut wishlist = Wishlist::default();
        wishlist.apply(WishlistAction::AddItem(look(1)));
        let first_added = wishlist.items()[0].added_at;
        wishlist.apply(WishlistAction::AddItem(look(1)));

        assert_eq!(wishlist.len(), 1);
        assert_eq!(wishlist.items()[0].added_at, first_added);
        assert!(wishlist.is_in_wishlist(Uuid::from_u128(1)));
    }

    #[test]
    fn removing_absent_id_is_a_no_op() {
        let mut wishlist = Wishlist::default();
        wishlist.apply(WishlistAction::AddItem(look(1)));
        wishlist.apply(WishlistAction::AddItem(look(2)));
        let before = wishlist.clone();

        wishlist.apply(WishlistAction::RemoveItem(Uuid::from_u128(42)));
        assert_eq!(wishlist, before);
    }

    #[test]
    fn remove_and_clear() {
        let mut wishlist = Wishlist::default();
        wishlist.apply(WishlistAction::AddItem(look(1)));
        wishlist.apply(WishlistAction::AddItem(look(2)));

        wishlist.apply(WishlistAction::RemoveItem(Uuid::from_u128(1)));
        assert!(!wishlist.is_in_wishlist(Uuid::from_u128(1)));
        assert!(wishlist.is_in_wishlist(Uuid::from_u128(2)));

        wishlist.apply(WishlistAction::Clear);
        assert!(wishlist.is_empty());
    }

    #[test]
    fn store_persists_entries_with_timestamps() {
        let storage = MemoryStorage::new();
        let mut store = WishlistStore::hydrate(storage.clone());
        store.dispatch(WishlistAction::AddItem(look(3)));

        let reloaded = WishlistStore::hydrate(storage);
        assert_eq!(reloaded.state().len(), 1);
        assert_eq!(reloaded.state().items()[0], store.state().items()[0]);
    }
}
