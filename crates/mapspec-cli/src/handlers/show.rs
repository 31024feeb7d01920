//! Show command handler

use crate::cli::ShowArgs;
use crate::error::Result;
use crate::output::OutputWriter;
use crate::store::MappingStore;
use tracing::instrument;

/// Handle the show command
#[instrument(skip_all, fields(name = %args.name))]
pub fn handle_show(args: ShowArgs, store: &MappingStore, output: &mut OutputWriter) -> Result<()> {
    let spec = store.load(&args.name)?;
    output.data(&spec)
}
