use crate::NeighborRanking;
use log::*;
use std::io::{self, Write};

/// Registers new images into an existing reconstruction given their ranked neighbors.
///
/// Reconstruction tools differ in what they produce, so the resulting model is left to the
/// implementation.
pub trait RegistrationService {
    type Model;
    type Error;

    fn register_images(&mut self, rankings: &[NeighborRanking]) -> Result<Self::Model, Self::Error>;
}

/// Writes the image pairs to match for incremental registration, one `new neighbor` pair per
/// line, for a reconstruction tool to consume.
///
/// The model is the number of pairs written.
pub struct PairListWriter<W> {
    writer: W,
    k: usize,
}

impl<W: Write> PairListWriter<W> {
    /// Writes at most `k` neighbors per new image.
    pub fn new(writer: W, k: usize) -> Self {
        Self { writer, k }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RegistrationService for PairListWriter<W> {
    type Model = usize;
    type Error = io::Error;

    fn register_images(&mut self, rankings: &[NeighborRanking]) -> io::Result<usize> {
        let mut pairs = 0;
        for ranking in rankings {
            for neighbor in ranking.nearest(self.k) {
                writeln!(self.writer, "{} {}", ranking.image(), neighbor.image)?;
                pairs += 1;
            }
        }
        self.writer.flush()?;
        info!(
            "wrote {} image pairs for {} new images",
            pairs,
            rankings.len()
        );
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RankedNeighbor;

    #[test]
    fn writes_top_k_pairs() {
        let mut ranking = NeighborRanking::new("/new/1.jpg");
        for (image, count) in [("/old/a.jpg", 4), ("/old/b.jpg", 6), ("/old/c.jpg", 6)] {
            ranking.offer(RankedNeighbor {
                image: image.into(),
                feature_pairs: vec![(1, 2); count],
            });
        }
        let mut writer = PairListWriter::new(vec![], 2);
        let pairs = writer
            .register_images(&[ranking, NeighborRanking::new("/new/2.jpg")])
            .unwrap();
        assert_eq!(pairs, 2);
        assert_eq!(
            String::from_utf8(writer.into_inner()).unwrap(),
            "/new/1.jpg /old/c.jpg\n/new/1.jpg /old/b.jpg\n"
        );
    }
}
