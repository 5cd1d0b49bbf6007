use std::collections::VecDeque;
use std::io::{self, BufRead, Lines};
use thiserror::Error;

/// A fatal problem in a match report. Every variant carries the 1-based line it occurred on.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("line {line}: failed to read the match report: {source}")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: record for {first} ends before its second image")]
    MissingSecondImage { line: usize, first: String },
    #[error("line {line}: record ends before its match count")]
    MissingCount { line: usize },
    #[error("line {line}: match count {token:?} is not a number")]
    InvalidCount { line: usize, token: String },
    #[error("line {line}: record ends after {found} of {expected} feature indices")]
    MissingFeatureIndex {
        line: usize,
        found: usize,
        expected: usize,
    },
    #[error("line {line}: feature index {token:?} is not a number")]
    InvalidFeatureIndex { line: usize, token: String },
}

impl MatchError {
    pub fn line(&self) -> usize {
        match *self {
            Self::Io { line, .. }
            | Self::MissingSecondImage { line, .. }
            | Self::MissingCount { line }
            | Self::InvalidCount { line, .. }
            | Self::MissingFeatureIndex { line, .. }
            | Self::InvalidFeatureIndex { line, .. } => line,
        }
    }
}

/// The feature matches between two images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub first: String,
    pub second: String,
    /// Pairs of matching feature indices `(first, second)`.
    pub pairs: Vec<(usize, usize)>,
}

impl MatchRecord {
    pub fn count(&self) -> usize {
        self.pairs.len()
    }
}

/// Reads [`MatchRecord`]s from a match report.
///
/// A record is a line holding the path of the first image, a line holding the path of the second
/// image, the number of matches and then that many feature indices of the first image followed
/// by as many of the second image. Numbers are whitespace separated and may span lines.
///
/// ```text
/// /images/0001.jpg
/// /images/0002.jpg
/// 3
/// 12 40 7
/// 15 41 9
/// ```
///
/// Lines that do not start with `/` are skipped while looking for the next record. Anything left
/// on the line of the last feature index is ignored.
pub struct MatchReader<R> {
    lines: Lines<R>,
    line: usize,
    tokens: VecDeque<String>,
}

impl<R: BufRead> MatchReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            tokens: VecDeque::new(),
        }
    }

    /// The 1-based number of the last line read.
    pub fn line(&self) -> usize {
        self.line
    }

    fn next_line(&mut self) -> Result<Option<String>, MatchError> {
        self.tokens.clear();
        match self.lines.next() {
            None => Ok(None),
            Some(Err(source)) => Err(MatchError::Io {
                line: self.line + 1,
                source,
            }),
            Some(Ok(line)) => {
                self.line += 1;
                Ok(Some(line))
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<String>, MatchError> {
        loop {
            if let Some(token) = self.tokens.pop_front() {
                return Ok(Some(token));
            }
            match self.next_line()? {
                Some(line) => self
                    .tokens
                    .extend(line.split_whitespace().map(str::to_owned)),
                None => return Ok(None),
            }
        }
    }

    fn feature_indices(&mut self, count: usize) -> Result<Vec<usize>, MatchError> {
        (0..count)
            .map(|found| {
                let token = self.next_token()?.ok_or(MatchError::MissingFeatureIndex {
                    line: self.line,
                    found,
                    expected: 2 * count,
                })?;
                token
                    .parse()
                    .map_err(|_| MatchError::InvalidFeatureIndex {
                        line: self.line,
                        token,
                    })
            })
            .collect()
    }

    fn next_record(&mut self) -> Result<Option<MatchRecord>, MatchError> {
        let first = loop {
            match self.next_line()? {
                Some(line) if line.starts_with('/') => break line.trim_end().to_owned(),
                Some(_) => continue,
                None => return Ok(None),
            }
        };
        let second = self
            .next_line()?
            .ok_or_else(|| MatchError::MissingSecondImage {
                line: self.line,
                first: first.clone(),
            })?
            .trim_end()
            .to_owned();

        let token = self
            .next_token()?
            .ok_or(MatchError::MissingCount { line: self.line })?;
        let count: usize = token.parse().map_err(|_| MatchError::InvalidCount {
            line: self.line,
            token,
        })?;

        let firsts = self.feature_indices(count)?;
        let seconds = self.feature_indices(count).map_err(|e| match e {
            MatchError::MissingFeatureIndex {
                line,
                found,
                expected,
            } => MatchError::MissingFeatureIndex {
                line,
                found: found + count,
                expected,
            },
            e => e,
        })?;
        self.tokens.clear();

        Ok(Some(MatchRecord {
            first,
            second,
            pairs: firsts.into_iter().zip(seconds).collect(),
        }))
    }
}

impl<R: BufRead> Iterator for MatchReader<R> {
    type Item = Result<MatchRecord, MatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Reads a list of image paths, one per line. Blank lines are ignored.
pub fn read_image_list(reader: impl BufRead) -> io::Result<Vec<String>> {
    let mut images = vec![];
    for line in reader.lines() {
        let line = line?;
        let path = line.trim();
        if !path.is_empty() {
            images.push(path.to_owned());
        }
    }
    Ok(images)
}
