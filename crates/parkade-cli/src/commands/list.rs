use super::{json_pretty, EXIT_SUCCESS};
use parkade_core::Engine;

pub fn run(engine: &Engine, json: bool) -> Result<u8, String> {
    let parked = engine.parked().map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&parked)?);
    } else if parked.is_empty() {
        println!("no vehicles parked");
    } else {
        println!(
            "{:<16} {:<12} {:<6} {:<6} PARKED_AT",
            "PLATE", "TYPE", "LEVEL", "SLOT"
        );
        for v in &parked {
            println!(
                "{:<16} {:<12} {:<6} {:<6} {}",
                v.license_plate.as_str(),
                v.vehicle_type,
                v.level,
                v.slot_number,
                v.parked_at
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
