use crate::{MatchError, MatchReader, MatchRecord};
use log::*;
use std::collections::{HashMap, VecDeque};
use std::io::BufRead;

/// A registered image accepted as a neighbor of a new image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedNeighbor {
    pub image: String,
    /// Pairs of matching feature indices `(neighbor, new image)`.
    pub feature_pairs: Vec<(usize, usize)>,
}

impl RankedNeighbor {
    pub fn matches(&self) -> usize {
        self.feature_pairs.len()
    }
}

/// The registered neighbors of one new image, strongest first.
///
/// A record only becomes a neighbor when it matches at least as many features as the strongest
/// neighbor so far, so each accepted neighbor ranks above every earlier one. Among equal match
/// counts the record seen last ranks first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborRanking {
    image: String,
    best: usize,
    neighbors: VecDeque<RankedNeighbor>,
}

impl NeighborRanking {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            best: 0,
            neighbors: VecDeque::new(),
        }
    }

    /// The new image this ranking belongs to.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// The match count of the strongest neighbor, or `0` without neighbors.
    pub fn best(&self) -> usize {
        self.best
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Ranks `neighbor` first if it matches at least as many features as the current best.
    ///
    /// Returns whether it was accepted.
    pub fn offer(&mut self, neighbor: RankedNeighbor) -> bool {
        if neighbor.matches() < self.best {
            return false;
        }
        self.best = neighbor.matches();
        self.neighbors.push_front(neighbor);
        true
    }

    /// Forgets all but the `k` strongest neighbors.
    pub fn truncate(&mut self, k: usize) {
        self.neighbors.truncate(k);
    }

    /// The neighbor images, strongest first.
    pub fn neighbors(&self) -> impl Iterator<Item = &str> + '_ {
        self.neighbors.iter().map(|n| n.image.as_str())
    }

    /// The feature pairs of each neighbor, in the same order as [`NeighborRanking::neighbors`].
    pub fn feature_pairs(&self) -> impl Iterator<Item = &[(usize, usize)]> + '_ {
        self.neighbors.iter().map(|n| n.feature_pairs.as_slice())
    }

    /// At most `k` of the strongest neighbors.
    pub fn nearest(&self, k: usize) -> impl Iterator<Item = &RankedNeighbor> + '_ {
        self.neighbors.iter().take(k)
    }
}

/// Selects registered neighbors for a batch of new images from a stream of match records.
///
/// Records are processed in order and the outcome depends on that order, so a matcher is fed
/// from a single thread.
#[derive(Debug, Clone)]
pub struct NeighborMatcher {
    rankings: Vec<NeighborRanking>,
    /// Maps a new image to its ranking.
    new_images: HashMap<String, usize>,
}

impl NeighborMatcher {
    pub fn new<I>(new_images: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut matcher = Self {
            rankings: vec![],
            new_images: HashMap::new(),
        };
        for image in new_images {
            let image = image.into();
            if matcher.new_images.contains_key(&image) {
                warn!("new image {} is listed twice", image);
                continue;
            }
            matcher
                .new_images
                .insert(image.clone(), matcher.rankings.len());
            matcher.rankings.push(NeighborRanking::new(image));
        }
        matcher
    }

    pub fn is_new(&self, image: &str) -> bool {
        self.new_images.contains_key(image)
    }

    /// Offers a record to the ranking of its second image.
    ///
    /// The record is only considered when its second image is new and its first image is not,
    /// since neighbors must already be registered. Returns whether it was accepted.
    pub fn offer(&mut self, record: MatchRecord) -> bool {
        let ix = match self.new_images.get(&record.second) {
            Some(&ix) => ix,
            None => return false,
        };
        if self.is_new(&record.first) {
            trace!(
                "ignoring matches between new images {} and {}",
                record.first,
                record.second
            );
            return false;
        }
        let count = record.count();
        let accepted = self.rankings[ix].offer(RankedNeighbor {
            image: record.first,
            feature_pairs: record.pairs,
        });
        if accepted {
            debug!(
                "{} now ranks first for {} with {} matches",
                self.rankings[ix].neighbors().next().unwrap_or_default(),
                record.second,
                count
            );
        }
        accepted
    }

    pub fn rankings(&self) -> &[NeighborRanking] {
        &self.rankings
    }

    /// The rankings in the order the new images were given.
    pub fn into_rankings(self) -> Vec<NeighborRanking> {
        self.rankings
    }
}

/// Ranks at most `k` registered neighbors for each new image from a match report.
///
/// Malformed lines between records are skipped. A record with a missing or malformed count or
/// feature index aborts the whole report.
pub fn match_neighbors<I>(
    new_images: I,
    report: impl BufRead,
    k: usize,
) -> Result<Vec<NeighborRanking>, MatchError>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut matcher = NeighborMatcher::new(new_images);
    info!(
        "finding up to {} neighbors for {} new images",
        k,
        matcher.rankings().len()
    );
    let mut records = 0;
    let mut accepted = 0;
    for record in MatchReader::new(report) {
        records += 1;
        if matcher.offer(record?) {
            accepted += 1;
        }
    }
    let mut rankings = matcher.into_rankings();
    for ranking in &mut rankings {
        ranking.truncate(k);
        if ranking.is_empty() {
            warn!("new image {} has no registered neighbor", ranking.image());
        }
    }
    info!("accepted {} of {} match records", accepted, records);
    Ok(rankings)
}
