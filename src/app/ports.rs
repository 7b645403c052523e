use crate::domain::{TableBundle, TableData};
use crate::error::Result;
use crate::pipeline::processing::RawDataset;

/// Where the raw titles and credits come from
pub trait RawSource {
    fn load(&self) -> Result<RawDataset>;
}

/// Where finished tables go. Writing a table replaces any existing table
/// of the same name.
pub trait TableSink {
    fn sink_name(&self) -> &'static str;

    fn write_table(&mut self, table: &TableData) -> Result<()>;

    fn write_bundle(&mut self, bundle: &TableBundle) -> Result<()> {
        for table in bundle.iter() {
            self.write_table(table)?;
        }
        Ok(())
    }
}
