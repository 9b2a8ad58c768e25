use super::{colorize_size, json_pretty, EXIT_SUCCESS};
use parkade_core::Engine;
use parkade_schema::SizeClass;

pub fn add(engine: &Engine, level_number: u32, size: SizeClass, json: bool) -> Result<u8, String> {
    let slot_number = engine
        .create_slot(level_number, size)
        .map_err(|e| e.to_string())?;
    if json {
        let payload = serde_json::json!({
            "level_number": level_number,
            "slot_number": slot_number,
            "size": size,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "created {} slot {slot_number} on level {level_number}",
            colorize_size(size)
        );
    }
    Ok(EXIT_SUCCESS)
}

pub fn remove(engine: &Engine, level_number: u32, slot_number: u32, json: bool) -> Result<u8, String> {
    engine
        .delete_slot(level_number, slot_number)
        .map_err(|e| e.to_string())?;
    if json {
        let payload = serde_json::json!({
            "level_number": level_number,
            "deleted_slot": slot_number,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("deleted slot {slot_number} on level {level_number}");
    }
    Ok(EXIT_SUCCESS)
}
