use super::{colorize_free, colorize_size, json_pretty, EXIT_SUCCESS};
use parkade_core::Engine;

pub fn run(engine: &Engine, json: bool) -> Result<u8, String> {
    let levels = engine.levels().map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&levels)?);
        return Ok(EXIT_SUCCESS);
    }
    if levels.is_empty() {
        println!("no levels defined");
        return Ok(EXIT_SUCCESS);
    }
    for level in &levels {
        println!(
            "level {} ({} free)",
            level.level_number,
            colorize_free(level.free, level.capacity)
        );
        for slot in &level.slots {
            let occupant = slot.occupant.as_ref().map_or("-", |p| p.as_str());
            // Pad before colorizing; ANSI codes would skew the column width.
            let size = format!("{:<10}", slot.size.name());
            println!(
                "  {:>4}  {}  {occupant}",
                slot.slot_number,
                size.replace(slot.size.name(), &colorize_size(slot.size))
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
