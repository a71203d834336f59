//! # mudstone-area: on-disk formats
//!
//! Owns every file format the server reads and writes:
//!
//! * area files — line-oriented `#SECTION` text (tilde strings, decimal
//!   numbers, letter-alphabet flags) or the JSON co-format, selected by
//!   file extension;
//! * `area.lst` — the boot list of area files, `$`-terminated;
//! * `#HELPS` sections and the help tree they populate;
//! * `#LOOT` sections, captured verbatim for the loot engine;
//! * player files — one key/value file per character.
//!
//! Persistence is always temp-then-rename: readers observe only fully
//! written files. For every area file the loader accepts without bug
//! records, `load(save(load(f)))` is byte-equal to `save(load(f))`.

mod error;
mod intern;
mod json;
mod lexer;
mod list;
mod load;
mod player;
mod save;

pub use error::{AreaError, AreaResult};
pub use intern::Interner;
pub use json::{parse_area_json, render_area_json, AreaJson};
pub use lexer::{parse_dice, Lexer};
pub use list::read_area_list;
pub use load::{affect_location, affect_location_word, parse_area, HelpEntry, LoadedArea};
pub use player::{load_player, player_path, save_player, PlayerFile};
pub use save::{render_area, save_area_file};

use std::path::Path;

/// Loads one area file, dispatching on extension.
pub fn load_area_file(path: &Path) -> AreaResult<LoadedArea> {
    let text = std::fs::read_to_string(path).map_err(|e| AreaError::io(path, e))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");
    if path.extension().is_some_and(|ext| ext == "json") {
        parse_area_json(&text)
    } else {
        parse_area(&text, file_name)
    }
}
