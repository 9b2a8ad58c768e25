use super::{json_pretty, EXIT_SUCCESS};
use parkade_core::Engine;

pub fn add(engine: &Engine, json: bool) -> Result<u8, String> {
    let level_number = engine.create_level().map_err(|e| e.to_string())?;
    if json {
        let payload = serde_json::json!({ "level_number": level_number });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("created level {level_number}");
    }
    Ok(EXIT_SUCCESS)
}

pub fn remove(engine: &Engine, level_number: u32, json: bool) -> Result<u8, String> {
    engine
        .delete_level(level_number)
        .map_err(|e| e.to_string())?;
    if json {
        let payload = serde_json::json!({ "deleted_level": level_number });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("deleted level {level_number}");
    }
    Ok(EXIT_SUCCESS)
}
