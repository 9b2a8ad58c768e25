pub mod completions;
pub mod init;
pub mod leave;
pub mod level;
pub mod levels;
pub mod list;
pub mod man_pages;
pub mod park;
pub mod slot;
pub mod status;

use parkade_schema::SizeClass;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_LAYOUT_ERROR: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn colorize_size(size: SizeClass) -> String {
    use console::Style;
    let name = size.name();
    match size {
        SizeClass::Motorcycle => Style::new().cyan().apply_to(name).to_string(),
        SizeClass::Car => Style::new().green().apply_to(name).to_string(),
        SizeClass::Bus => Style::new().yellow().apply_to(name).to_string(),
    }
}

/// `free/total`, red when nothing is left.
pub fn colorize_free(free: usize, total: usize) -> String {
    use console::Style;
    let text = format!("{free}/{total}");
    if free == 0 && total > 0 {
        Style::new().red().bold().apply_to(text).to_string()
    } else {
        text
    }
}
