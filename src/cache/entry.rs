//! Cache Entry Module
//!
//! Defines resident cache entries and the weighers that price them.

// == Cache Entry ==
/// A resident value together with the cost it was admitted at.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,
    /// Budget consumed by this entry, fixed at insertion
    pub cost: usize,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, cost: usize) -> Self {
        Self { value, cost }
    }
}

// == Weigher ==
/// Prices a value against a cache's capacity budget.
pub trait Weigher<V> {
    fn weigh(&self, value: &V) -> usize;
}

/// Uniform cost of one per entry; capacity is an entry count.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountWeigher;

impl<V> Weigher<V> for CountWeigher {
    fn weigh(&self, _value: &V) -> usize {
        1
    }
}

/// Cost is the byte length of the value; capacity is a byte budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteWeigher;

impl<V: AsRef<[u8]>> Weigher<V> for ByteWeigher {
    fn weigh(&self, value: &V) -> usize {
        value.as_ref().len()
    }
}
