//! Fisher–Yates shuffle that remembers where every item came from.

use rand::Rng;

/// A permuted copy of a sequence plus the map back to original indices:
/// `display_order[i] == original[inverse_index[i]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shuffled<T> {
    pub display_order: Vec<T>,
    pub inverse_index: Vec<usize>,
}

impl<T> Shuffled<T> {
    /// Unshuffled pairing, used when randomization is switched off.
    pub fn identity(items: Vec<T>) -> Self {
        let inverse_index = (0..items.len()).collect();
        Self {
            display_order: items,
            inverse_index,
        }
    }

    pub fn len(&self) -> usize {
        self.display_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.display_order.is_empty()
    }

    /// Original index of whatever is shown at `display_position`.
    pub fn original_index(&self, display_position: usize) -> Option<usize> {
        self.inverse_index.get(display_position).copied()
    }

    /// Display position of the item originally at `original`.
    pub fn display_position(&self, original: usize) -> Option<usize> {
        self.inverse_index.iter().position(|&i| i == original)
    }
}

/// Unbiased permutation of `items`. Items and indices go through the same swaps.
pub fn shuffle<T, R>(items: &[T], rng: &mut R) -> Shuffled<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    let mut display_order = items.to_vec();
    let mut inverse_index: Vec<usize> = (0..items.len()).collect();

    for i in (1..display_order.len()).rev() {
        let j = rng.random_range(0..=i);
        display_order.swap(i, j);
        inverse_index.swap(i, j);
    }

    Shuffled {
        display_order,
        inverse_index,
    }
}
