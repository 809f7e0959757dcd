//! Grid file adapter: one `Combination` column holding each descriptor's canonical text.

use crate::domain::error::SigsweepError;
use crate::domain::grid::{Grid, StrategyDescriptor};
use crate::ports::grid_port::GridPort;
use std::path::{Path, PathBuf};
use tracing::info;

pub const COMBINATION_COLUMN: &str = "Combination";

pub struct GridCsvAdapter {
    path: PathBuf,
}

impl GridCsvAdapter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GridPort for GridCsvAdapter {
    fn write_grid(&self, grid: &Grid) -> Result<usize, SigsweepError> {
        let mut wtr = csv::Writer::from_path(&self.path)?;
        wtr.write_record([COMBINATION_COLUMN])?;

        let mut rows = 0;
        for descriptor in grid.iter() {
            wtr.write_record([descriptor.to_canonical_string()?])?;
            rows += 1;
        }
        wtr.flush()?;

        info!(path = %self.path.display(), rows, "wrote grid");
        Ok(rows)
    }

    fn read_grid(&self) -> Result<Vec<StrategyDescriptor>, SigsweepError> {
        let mut rdr = csv::Reader::from_path(&self.path)?;
        let column = rdr
            .headers()?
            .iter()
            .position(|h| h == COMBINATION_COLUMN)
            .ok_or_else(|| SigsweepError::Data {
                reason: format!(
                    "{} has no '{}' column",
                    self.path.display(),
                    COMBINATION_COLUMN
                ),
            })?;

        let mut descriptors = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let text = record.get(column).ok_or_else(|| SigsweepError::Data {
                reason: format!("row {} is missing the combination", descriptors.len() + 1),
            })?;
            descriptors.push(StrategyDescriptor::parse(text)?);
        }
        Ok(descriptors)
    }
}
