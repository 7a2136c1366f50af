//! Probe orders for open addressing.
//!
//! A `Probe` turns a hash and a modulus into the sequence of slots an
//! operation examines. Every sequence has exactly `modulus` items; whether it
//! visits every slot depends on the capacity, which is why each probe also
//! decides which capacities it accepts.

/// Probe order of an open-addressing table.
pub trait Probe: Clone {
    type Seq<'a>: Iterator<Item = usize>
    where
        Self: 'a;

    /// Smallest capacity `>= requested` this probe order fully covers.
    fn admissible_capacity(&self, requested: usize) -> usize;

    /// Called whenever the owning table switches to a new modulus.
    fn set_modulus(&mut self, _modulus: usize) {}

    /// Slots to examine for `hash` in a table of `modulus` slots.
    fn sequence(&self, hash: u64, modulus: usize) -> Self::Seq<'_>;
}

/// Arithmetic progression `start, start + step, ...` modulo `modulus`,
/// `modulus` items long.
#[derive(Clone, Debug)]
pub struct Stride {
    index: usize,
    step: usize,
    modulus: usize,
    remaining: usize,
}

impl Stride {
    fn new(start: usize, step: usize, modulus: usize) -> Self {
        debug_assert!(modulus == 0 || (start < modulus && step < modulus.max(2)));
        Self {
            index: start,
            step,
            modulus,
            remaining: modulus,
        }
    }
}

impl Iterator for Stride {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.index;
        // Both terms are below modulus, so one subtraction normalizes.
        let next = current + self.step;
        self.index = if next >= self.modulus {
            next - self.modulus
        } else {
            next
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Stride {}

/// Fixed step of one.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearProbe;

impl Probe for LinearProbe {
    type Seq<'a> = Stride;

    fn admissible_capacity(&self, requested: usize) -> usize {
        requested.max(1)
    }

    fn sequence(&self, hash: u64, modulus: usize) -> Stride {
        if modulus == 0 {
            return Stride::new(0, 0, 0);
        }
        let start = (hash % modulus as u64) as usize;
        Stride::new(start, 1 % modulus.max(2), modulus)
    }
}

/// Splits a hash into a start slot and a step coprime to a prime `modulus`.
///
/// The start is `hash mod m`; the raw step `hash div m` is folded into
/// `1..=m-1`, so for prime `m` the progression visits every residue once.
pub fn congruent_start(hash: u64, modulus: usize) -> (usize, usize) {
    let m = modulus as u64;
    let start = hash % m;
    let step = if m > 1 { (hash / m) % (m - 1) + 1 } else { 1 };
    (start as usize, step as usize)
}

/// Step derived from the hash itself; capacities are always prime.
#[derive(Clone, Copy, Debug, Default)]
pub struct CongruentProbe;

impl Probe for CongruentProbe {
    type Seq<'a> = Stride;

    fn admissible_capacity(&self, requested: usize) -> usize {
        crate::policy::next_prime(requested)
    }

    fn sequence(&self, hash: u64, modulus: usize) -> Stride {
        if modulus == 0 {
            return Stride::new(0, 0, 0);
        }
        debug_assert!(
            crate::policy::is_prime(modulus),
            "congruent probing needs a prime modulus, got {modulus}"
        );
        let (start, step) = congruent_start(hash, modulus);
        Stride::new(start, step % modulus.max(2), modulus)
    }
}

/// Modulus-aware generator of a complete probe order.
///
/// For every modulus returned by `fit`, `indices` must enumerate each slot in
/// `0..modulus` exactly once.
pub trait ProbeSequence: Clone {
    type Indices<'a>: Iterator<Item = usize>
    where
        Self: 'a;

    /// Smallest supported modulus `>= requested`.
    fn fit(&self, requested: usize) -> usize;

    fn modulus(&self) -> usize;

    fn set_modulus(&mut self, modulus: usize);

    fn indices(&self, hash: u64) -> Self::Indices<'_>;
}

/// Triangular-number probing, `start + k(k+1)/2 mod m`, over power-of-two
/// moduli where it is a full cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriangularSequence {
    modulus: usize,
}

impl TriangularSequence {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Iterator returned by `TriangularSequence::indices`.
#[derive(Clone, Debug)]
pub struct TriangularIndices {
    index: usize,
    offset: usize,
    mask: usize,
    remaining: usize,
}

impl Iterator for TriangularIndices {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.index;
        self.offset += 1;
        self.index = (self.index + self.offset) & self.mask;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for TriangularIndices {}

impl ProbeSequence for TriangularSequence {
    type Indices<'a> = TriangularIndices;

    fn fit(&self, requested: usize) -> usize {
        requested
            .max(1)
            .checked_next_power_of_two()
            .unwrap_or(1 << (usize::BITS - 1))
    }

    fn modulus(&self) -> usize {
        self.modulus
    }

    fn set_modulus(&mut self, modulus: usize) {
        debug_assert!(modulus == 0 || modulus.is_power_of_two());
        self.modulus = modulus;
    }

    fn indices(&self, hash: u64) -> TriangularIndices {
        let mask = self.modulus.wrapping_sub(1);
        TriangularIndices {
            index: (hash as usize) & mask,
            offset: 0,
            mask,
            remaining: self.modulus,
        }
    }
}

/// Probe order supplied by an external `ProbeSequence`; the table keeps the
/// generator's modulus in step with its own size.
#[derive(Clone, Debug, Default)]
pub struct QuadraticProbe<G = TriangularSequence> {
    generator: G,
}

impl<G: ProbeSequence> QuadraticProbe<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }
}

impl<G: ProbeSequence> Probe for QuadraticProbe<G> {
    type Seq<'a>
        = G::Indices<'a>
    where
        Self: 'a;

    fn admissible_capacity(&self, requested: usize) -> usize {
        self.generator.fit(requested)
    }

    fn set_modulus(&mut self, modulus: usize) {
        self.generator.set_modulus(modulus);
    }

    fn sequence(&self, hash: u64, modulus: usize) -> G::Indices<'_> {
        debug_assert_eq!(
            self.generator.modulus(),
            modulus,
            "probe generator modulus out of sync with table"
        );
        self.generator.indices(hash)
    }
}
