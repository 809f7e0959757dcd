//! Persistence port for enumerated strategy grids.

use crate::domain::error::SigsweepError;
use crate::domain::grid::{Grid, StrategyDescriptor};

pub trait GridPort {
    /// Writes every descriptor of `grid`, returning the number of rows written.
    fn write_grid(&self, grid: &Grid) -> Result<usize, SigsweepError>;

    fn read_grid(&self) -> Result<Vec<StrategyDescriptor>, SigsweepError>;
}
