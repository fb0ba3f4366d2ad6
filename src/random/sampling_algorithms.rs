//! Uniform sampling without replacement. Friend lists are slices, so the daily subset is
//! drawn by index; stranger windows are filtered on the fly and go through a reservoir.

use crate::rand::seq::index::sample as choose_range;
use crate::rand::Rng;

/// Picks `min(requested, items.len())` distinct items uniformly, keeping their slice order.
pub fn sample_from_slice<R: Rng, T: Copy>(rng: &mut R, items: &[T], requested: usize) -> Vec<T> {
    if requested >= items.len() {
        return items.to_vec();
    }
    if requested == 0 {
        return Vec::new();
    }
    let mut picked = choose_range(rng, items.len(), requested).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|index| items[index]).collect()
}

/// A fixed-size uniform sample of a stream of unknown length, using "Algorithm L" from
/// Kim-Hung Li, Reservoir-Sampling Algorithms of Time Complexity O(n(1 + log(N/n)))
/// <https://dl.acm.org/doi/pdf/10.1145/198429.198435>.
///
/// Offer every item in turn; the reservoir skips ahead geometrically once it is full. Storage
/// grows with the items taken, so a capacity far beyond the stream length costs nothing.
#[derive(Debug, Clone)]
pub struct Reservoir<T> {
    capacity: usize,
    items: Vec<T>,
    seen: usize,
    // 1-based position of the next item to take
    next_take: usize,
    weight: f64,
    exhausted: bool,
}

impl<T> Reservoir<T> {
    pub fn new<R: Rng>(rng: &mut R, capacity: usize) -> Self {
        Reservoir {
            capacity,
            items: Vec::new(),
            seen: 0,
            next_take: 1,
            weight: Self::shrink(rng, 1.0, capacity),
            exhausted: capacity == 0,
        }
    }

    fn shrink<R: Rng>(rng: &mut R, weight: f64, capacity: usize) -> f64 {
        let u: f64 = rng.random_range(0.0..1.0);
        weight * u.powf(1.0 / capacity.max(1) as f64)
    }

    /// True once no later item can enter the reservoir.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn offer<R: Rng>(&mut self, rng: &mut R, item: T) {
        if self.exhausted {
            return;
        }
        self.seen += 1;
        if self.seen != self.next_take {
            return;
        }
        if self.items.len() == self.capacity {
            let evicted = rng.random_range(0..self.capacity);
            self.items.swap_remove(evicted);
        }
        self.items.push(item);

        if self.items.len() < self.capacity {
            self.next_take += 1;
            return;
        }
        let u: f64 = rng.random_range(0.0..1.0);
        let skip = u.ln() / (1.0 - self.weight).ln();
        // ln 0, or a weight at the edge of the interval
        if !skip.is_finite() {
            self.exhausted = true;
            return;
        }
        self.next_take += skip.floor() as usize + 1;
        self.weight = Self::shrink(rng, self.weight, self.capacity);
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

/// Draws up to `requested` items from `iter` with a [`Reservoir`]. Shorter streams are
/// returned whole, in some order.
pub fn sample_from_stream<R, I>(rng: &mut R, iter: I, requested: usize) -> Vec<I::Item>
where
    R: Rng,
    I: IntoIterator,
{
    let mut reservoir = Reservoir::new(rng, requested);
    for item in iter {
        if reservoir.is_exhausted() {
            break;
        }
        reservoir.offer(rng, item);
    }
    reservoir.into_vec()
}
