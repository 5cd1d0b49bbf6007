use crate::ImageId;
use std::collections::HashMap;

/// Counts votes per image for a single vertex.
///
/// The tally remembers the order in which images received their first vote. [`VoteTally::top`]
/// uses that order to break ties, so equal counts rank the image seen first higher.
#[derive(Debug, Clone, Default)]
pub struct VoteTally {
    /// Maps each image to its slot in `votes`.
    slots: HashMap<ImageId, usize>,
    votes: Vec<(ImageId, usize)>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every vote, keeping the allocations.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.votes.clear();
    }

    pub fn vote(&mut self, image: ImageId) {
        let votes = &mut self.votes;
        let slot = *self.slots.entry(image).or_insert_with(|| {
            votes.push((image, 0));
            votes.len() - 1
        });
        self.votes[slot].1 += 1;
    }

    pub fn count(&self, image: ImageId) -> usize {
        self.slots
            .get(&image)
            .map(|&slot| self.votes[slot].1)
            .unwrap_or(0)
    }

    /// The number of distinct images that received a vote.
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// The `n` images with the most votes, most votes first.
    pub fn top(&self, n: usize) -> Vec<ImageId> {
        let mut ranked: Vec<(usize, &(ImageId, usize))> = self.votes.iter().enumerate().collect();
        ranked.sort_by(|(a_seen, (_, a)), (b_seen, (_, b))| b.cmp(a).then(a_seen.cmp(b_seen)));
        ranked
            .into_iter()
            .take(n)
            .map(|(_, &(image, _))| image)
            .collect()
    }
}
