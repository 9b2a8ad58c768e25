use super::{json_pretty, EXIT_SUCCESS};
use parkade_core::Engine;

pub fn run(engine: &Engine, plate: &str, kind: &str, json: bool) -> Result<u8, String> {
    let ticket = engine.park(kind, plate).map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&ticket)?);
    } else {
        println!(
            "parked {} ({}) at level {} slot {}",
            ticket.license_plate, ticket.vehicle_type, ticket.level, ticket.slot
        );
    }
    Ok(EXIT_SUCCESS)
}
