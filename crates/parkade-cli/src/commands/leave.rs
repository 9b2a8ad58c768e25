use super::{json_pretty, EXIT_SUCCESS};
use parkade_core::{Engine, LeaveOutcome};

pub fn run(engine: &Engine, plate: &str, json: bool) -> Result<u8, String> {
    let outcome = engine.leave(plate).map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&outcome)?);
        return Ok(EXIT_SUCCESS);
    }
    match outcome {
        LeaveOutcome::Released {
            license_plate,
            level,
            slot,
        } => println!("{license_plate} left level {level} slot {slot}"),
        LeaveOutcome::StaleRecordRemoved { license_plate } => {
            println!("{license_plate} was not parked; removed its stale record");
        }
    }
    Ok(EXIT_SUCCESS)
}
