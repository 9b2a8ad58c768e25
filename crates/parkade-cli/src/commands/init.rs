use super::{json_pretty, EXIT_SUCCESS};
use parkade_core::{CoreError, Engine};
use parkade_schema::parse_layout_file;
use std::path::Path;

pub fn run(engine: &Engine, layout_path: &Path, json: bool) -> Result<u8, String> {
    let layout = parse_layout_file(layout_path).map_err(|e| CoreError::from(e).to_string())?;
    let report = engine.seed(&layout).map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        println!(
            "initialized facility: {} levels, {} slots",
            report.levels, report.slots
        );
    }
    Ok(EXIT_SUCCESS)
}
