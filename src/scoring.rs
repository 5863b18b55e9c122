use rustc_hash::FxHashMap;

use crate::errors::{GpsaError, SequenceId};

/// Symbol whose substitution scores define the gap penalty
pub const WILDCARD: u8 = b'*';

/// Maps alphabet characters to row/column indices of a [`SubstitutionTable`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharacterMap {
    index: FxHashMap<u8, usize>,
}

impl CharacterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map assigning consecutive indices to the given symbols, in order.
    pub fn from_symbols(symbols: &[u8]) -> Result<Self, GpsaError> {
        let mut cmap = Self::new();
        for &symbol in symbols {
            if cmap.index.contains_key(&symbol) {
                return Err(GpsaError::InvalidTable(
                    format!("duplicate symbol {:?}", symbol as char)));
            }

            cmap.index.insert(symbol, cmap.index.len());
        }

        Ok(cmap)
    }

    pub fn get(&self, symbol: u8) -> Option<usize> {
        self.index.get(&symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Largest table index any symbol maps to.
    pub fn max_index(&self) -> Option<usize> {
        self.index.values().copied().max()
    }

    /// Translate a sequence to table indices. Fails on the first unmapped character.
    pub fn encode(&self, seq: &[u8], sequence: SequenceId) -> Result<Vec<usize>, GpsaError> {
        seq.iter()
            .enumerate()
            .map(|(position, &symbol)| {
                self.get(symbol)
                    .ok_or(GpsaError::KeyNotFound { symbol, sequence, position })
            })
            .collect()
    }
}

/// Square table of substitution scores, indexed by [`CharacterMap`] indices.
#[derive(Clone, Debug, PartialEq)]
pub struct SubstitutionTable {
    size: usize,
    scores: Vec<f32>,
}

impl SubstitutionTable {
    /// Create a table from row-major scores. `scores.len()` must equal `size * size`.
    pub fn new(size: usize, scores: Vec<f32>) -> Result<Self, GpsaError> {
        if size == 0 {
            return Err(GpsaError::InvalidTable("table is empty".to_string()));
        }

        if scores.len() != size * size {
            return Err(GpsaError::InvalidTable(
                format!("expected {} scores for a {size}x{size} table, got {}", size * size, scores.len())));
        }

        Ok(Self { size, scores })
    }

    /// Build a simple match/mismatch table over `alphabet`, with the wildcard appended as the
    /// last symbol. Every entry involving the wildcard scores `gap`.
    pub fn match_mismatch(
        alphabet: &[u8],
        match_score: f32,
        mismatch: f32,
        gap: f32,
    ) -> Result<(Self, CharacterMap), GpsaError> {
        let mut symbols = alphabet.to_vec();
        if !symbols.contains(&WILDCARD) {
            symbols.push(WILDCARD);
        }

        let cmap = CharacterMap::from_symbols(&symbols)?;
        let size = symbols.len();
        let mut scores = Vec::with_capacity(size * size);
        for &a in &symbols {
            for &b in &symbols {
                let score = if a == WILDCARD || b == WILDCARD {
                    gap
                } else if a == b {
                    match_score
                } else {
                    mismatch
                };

                scores.push(score);
            }
        }

        Ok((Self::new(size, scores)?, cmap))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Score for substituting the characters with indices `a` and `b`.
    #[inline]
    pub fn score(&self, a: usize, b: usize) -> f32 {
        self.scores[a * self.size + b]
    }

    pub fn min_score(&self) -> f32 {
        self.scores.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Check that every index of `cmap` addresses a row and column of this table.
    pub fn check_map(&self, cmap: &CharacterMap) -> Result<(), GpsaError> {
        match cmap.max_index() {
            Some(ix) if ix >= self.size => Err(GpsaError::InvalidTable(
                format!("character map index {ix} is outside the {}x{} table", self.size, self.size))),
            _ => Ok(()),
        }
    }

    /// The gap penalty is the score in row 0, wildcard column.
    pub fn gap_penalty(&self, cmap: &CharacterMap) -> Result<f32, GpsaError> {
        let wildcard = cmap.get(WILDCARD)
            .ok_or(GpsaError::KeyNotFound { symbol: WILDCARD, sequence: SequenceId::Wildcard, position: 0 })?;

        if wildcard >= self.size {
            return Err(GpsaError::InvalidTable(
                format!("wildcard index {wildcard} is outside the {}x{} table", self.size, self.size)));
        }

        Ok(self.score(0, wildcard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_mismatch_table() {
        let (table, cmap) = SubstitutionTable::match_mismatch(b"ACGT", 1.0, -1.0, -2.0).unwrap();
        assert_eq!(table.size(), 5);
        assert_eq!(cmap.get(b'*'), Some(4));

        let a = cmap.get(b'A').unwrap();
        let c = cmap.get(b'C').unwrap();
        assert_eq!(table.score(a, a), 1.0);
        assert_eq!(table.score(a, c), -1.0);
        assert_eq!(table.gap_penalty(&cmap).unwrap(), -2.0);
        assert_eq!(table.min_score(), -2.0);
    }

    #[test]
    fn test_encode_reports_position() {
        let (_, cmap) = SubstitutionTable::match_mismatch(b"ACGT", 1.0, -1.0, -2.0).unwrap();
        assert_eq!(cmap.encode(b"GAT", SequenceId::X).unwrap(), vec![2, 0, 3]);

        match cmap.encode(b"GAXT", SequenceId::Y) {
            Err(GpsaError::KeyNotFound { symbol, sequence, position }) => {
                assert_eq!(symbol, b'X');
                assert_eq!(sequence, SequenceId::Y);
                assert_eq!(position, 2);
            },
            other => panic!("Unexpected result: {other:?}")
        }
    }

    #[test]
    fn test_missing_wildcard() {
        let cmap = CharacterMap::from_symbols(b"AC").unwrap();
        let table = SubstitutionTable::new(2, vec![1.0, -1.0, -1.0, 1.0]).unwrap();
        assert!(matches!(
            table.gap_penalty(&cmap),
            Err(GpsaError::KeyNotFound { sequence: SequenceId::Wildcard, .. })
        ));
    }

    #[test]
    fn test_invalid_tables() {
        assert!(SubstitutionTable::new(0, vec![]).is_err());
        assert!(SubstitutionTable::new(2, vec![1.0, 2.0, 3.0]).is_err());
        assert!(CharacterMap::from_symbols(b"AA").is_err());
    }
}
