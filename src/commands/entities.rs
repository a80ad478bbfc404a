use std::io::{self, Write};

use anyhow::Result;
use tracing::info;

use super::load_handler;
use crate::cli::EntitiesArgs;

pub fn run(args: EntitiesArgs) -> Result<()> {
    let handler = load_handler(args.rules_path.as_deref())?;
    let entities = handler.extract_entities(&args.query);
    info!(count = entities.len(), "entities extracted");

    if args.json {
        return crate::util::write_json_stdout(&entities);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for entity in &entities {
        writeln!(
            output,
            "{}\t{}\t{:.2}\t{}..{}",
            entity.entity_type, entity.value, entity.confidence, entity.span.start, entity.span.end
        )?;
    }
    output.flush()?;
    Ok(())
}
