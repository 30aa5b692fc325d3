//! Membership Filter Module
//!
//! Probabilistic "possibly present / definitely absent" test over the
//! identifiers of one block. Built once at seal time, immutable afterwards.
//!
//! The filter is not consulted by point lookups inside a block. It exists so
//! a layer holding many blocks can skip the ones that cannot hold an id.

mod bloom;

pub use bloom::BloomFilter;

/// Capability a per-block membership filter provides
pub trait MembershipFilter {
    /// Record `id` as present
    fn add(&mut self, id: &[u8]);

    /// `false` means `id` was never added; `true` means it may have been
    fn may_contain(&self, id: &[u8]) -> bool;
}
