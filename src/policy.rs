//! Resize policies: when a table grows and to what size.
//!
//! A policy is immutable once a set is built; sets share it through an `Arc`
//! so `duplicate()` never copies it. Capacity compatibility with a particular
//! probe order (primes, powers of two) is not the policy's business: each
//! `CollisionStrategy` adjusts the capacities it is offered.

/// Capacity and growth decisions consulted by every set.
pub trait ResizePolicy {
    /// Capacity of a freshly built (or never grown) table.
    fn initial_capacity(&self) -> usize;

    /// Capacity to grow to from `current`. Returning a value that is not
    /// larger than `current` means the table cannot grow any further.
    fn next_capacity(&self, current: usize) -> usize;

    /// True when holding `size` elements in `modulus` slots is too dense and
    /// the table should grow before placing the next element.
    fn test_loaded_size(&self, size: usize, modulus: usize) -> bool;

    /// True when a probe that has already examined `probe_index + 1` slots
    /// should be abandoned in favour of growing the table.
    fn test_link_length(&self, probe_index: usize, modulus: usize) -> bool;
}

impl<R: ResizePolicy + ?Sized> ResizePolicy for &R {
    fn initial_capacity(&self) -> usize {
        (**self).initial_capacity()
    }
    fn next_capacity(&self, current: usize) -> usize {
        (**self).next_capacity(current)
    }
    fn test_loaded_size(&self, size: usize, modulus: usize) -> bool {
        (**self).test_loaded_size(size, modulus)
    }
    fn test_link_length(&self, probe_index: usize, modulus: usize) -> bool {
        (**self).test_link_length(probe_index, modulus)
    }
}

/// Doubling policy with a load-factor ceiling and a logarithmic probe limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TwiceResizePolicy {
    initial_capacity: usize,
    max_capacity: usize,
    load_percent: usize,
    link_factor: usize,
}

impl TwiceResizePolicy {
    pub const DEFAULT_INITIAL_CAPACITY: usize = 16;
    pub const DEFAULT_MAX_CAPACITY: usize = 1 << 30;
    pub const DEFAULT_LOAD_PERCENT: usize = 75;
    pub const DEFAULT_LINK_FACTOR: usize = 8;

    pub const fn new() -> Self {
        Self {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            max_capacity: Self::DEFAULT_MAX_CAPACITY,
            load_percent: Self::DEFAULT_LOAD_PERCENT,
            link_factor: Self::DEFAULT_LINK_FACTOR,
        }
    }

    /// Sets the first table size; clamped to at least 1.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity.max(1);
        self
    }

    /// Sets the capacity past which the table refuses to grow.
    pub fn with_max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity.max(1);
        self
    }

    /// Sets the maximum load, in percent of the modulus; clamped to `1..=100`.
    pub fn with_load_percent(mut self, percent: usize) -> Self {
        self.load_percent = percent.clamp(1, 100);
        self
    }

    /// Sets the probe-length factor. Zero disables early resizing on long
    /// probe chains.
    pub fn with_link_factor(mut self, factor: usize) -> Self {
        self.link_factor = factor;
        self
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn load_percent(&self) -> usize {
        self.load_percent
    }

    pub fn link_factor(&self) -> usize {
        self.link_factor
    }

    /// Longest probe (in examined slots) tolerated for a given modulus.
    pub fn link_limit(&self, modulus: usize) -> usize {
        let bits = (usize::BITS - modulus.leading_zeros()) as usize;
        self.link_factor.saturating_mul(bits)
    }
}

impl Default for TwiceResizePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ResizePolicy for TwiceResizePolicy {
    fn initial_capacity(&self) -> usize {
        self.initial_capacity.min(self.max_capacity)
    }

    fn next_capacity(&self, current: usize) -> usize {
        if current == 0 {
            return self.initial_capacity();
        }
        current.saturating_mul(2).min(self.max_capacity).max(current)
    }

    fn test_loaded_size(&self, size: usize, modulus: usize) -> bool {
        (size as u128) * 100 > (modulus as u128) * (self.load_percent as u128)
    }

    fn test_link_length(&self, probe_index: usize, modulus: usize) -> bool {
        self.link_factor != 0 && probe_index >= self.link_limit(modulus)
    }
}

/// True if `n` is prime. Trial division; capacities stay far below the range
/// where that matters.
pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut d = 5usize;
    while d.saturating_mul(d) <= n {
        if n % d == 0 || n % (d + 2) == 0 {
            return false;
        }
        d += 6;
    }
    true
}

/// Smallest prime `>= n` (2 for `n <= 2`). Saturates at the largest prime
/// representable if the search would overflow.
pub fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        match candidate.checked_add(1) {
            Some(c) => candidate = c,
            None => return prev_prime(usize::MAX),
        }
    }
    candidate
}

fn prev_prime(mut n: usize) -> usize {
    while n > 2 && !is_prime(n) {
        n -= 1;
    }
    n.max(2)
}
