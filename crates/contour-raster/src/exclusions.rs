//! Grid cells the ring search must skip.

use contour_common::{Cell, ContourResult};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// A set of excluded grid cells, persisted as a JSON list of `[x, y]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellExclusions {
    cells: BTreeSet<Cell>,
}

impl CellExclusions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip `cell`. Returns true when the cell is now excluded.
    pub fn toggle(&mut self, cell: Cell) -> bool {
        if self.cells.remove(&cell) {
            false
        } else {
            self.cells.insert(cell);
            true
        }
    }

    #[inline]
    pub fn is_excluded(&self, cell: Cell) -> bool {
        !self.cells.is_empty() && self.cells.contains(&cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }

    /// Load exclusions from `path`. A missing file yields an empty set.
    pub fn load(path: impl AsRef<Path>) -> ContourResult<Self> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No exclusions file, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let pairs: Vec<[usize; 2]> = serde_json::from_str(&text)?;
        let exclusions: Self = pairs.into_iter().map(|[x, y]| Cell::new(x, y)).collect();
        info!(path = %path.display(), cells = exclusions.len(), "Loaded cell exclusions");
        Ok(exclusions)
    }

    /// Write the set to `path` as `[[x, y], ...]`, sorted.
    pub fn save(&self, path: impl AsRef<Path>) -> ContourResult<()> {
        let pairs: Vec<[usize; 2]> = self.cells.iter().map(|c| [c.x, c.y]).collect();
        fs::write(path.as_ref(), serde_json::to_string(&pairs)?)?;
        Ok(())
    }
}

impl FromIterator<Cell> for CellExclusions {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}
