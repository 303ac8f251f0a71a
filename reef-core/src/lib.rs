//! Core engine of the reef key/value server.
//!
//! The keyspace and the sorted-set engine are built from three pieces that mirror each
//! other's ownership story: a slot [`arena`](crate::arena) owns the records, while the
//! [progressive-rehash hash index](crate::htable) and the
//! [count-augmented AVL tree](crate::avl) hold non-owning `NodeId` handles into it.
//! [`dispatch`](crate::dispatch) maps parsed commands onto typed handlers over the
//! keyspace.

pub mod arena;
pub mod avl;
pub mod containers;
pub mod dispatch;
pub mod htable;
pub mod zset;
