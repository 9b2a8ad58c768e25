use super::{colorize_free, json_pretty, EXIT_SUCCESS};
use parkade_core::Engine;

pub fn run(engine: &Engine, json: bool) -> Result<u8, String> {
    let occupancy = engine.occupancy().map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&occupancy)?);
    } else {
        println!(
            "free: {}",
            colorize_free(occupancy.free, occupancy.total)
        );
    }
    Ok(EXIT_SUCCESS)
}
