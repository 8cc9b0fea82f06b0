//! # Client State
//!
//! Shopper-side cart and wishlist containers. Each container is a plain value
//! with one update function per action; [`PersistedStore`] pairs a container
//! with a [`SnapshotStorage`] adapter and writes a versioned snapshot after
//! every mutation, the way a browser tab mirrors its state into local storage.

pub mod cart;
pub mod persist;
pub mod wishlist;

pub use cart::{Cart, CartAction, CartItem, CartKey, CartProduct, CartStore};
pub use persist::{
    FileStorage, MemoryStorage, Persisted, PersistedStore, SnapshotStorage, StateContainer,
    StorageError, SNAPSHOT_VERSION,
};
pub use wishlist::{Wishlist, WishlistAction, WishlistEntry, WishlistItem, WishlistKind, WishlistStore};
