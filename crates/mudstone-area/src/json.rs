//! JSON co-format for area files.
//!
//! The area list selects the parser by extension: `.json` files load
//! through serde instead of the section lexer. The JSON shape mirrors the
//! prototype structs directly. JSON areas carry no `#HELPS` section.

use serde::{Deserialize, Serialize};

use mudstone_world::{AreaProto, MobProgScript, MobProto, ObjProto, RoomProto};

use crate::error::AreaResult;
use crate::load::LoadedArea;

/// Serde mirror of one area file.
#[derive(Debug, Serialize, Deserialize)]
pub struct AreaJson {
    pub area: AreaProto,
    #[serde(default)]
    pub rooms: Vec<RoomProto>,
    #[serde(default)]
    pub mobiles: Vec<MobProto>,
    #[serde(default)]
    pub objects: Vec<ObjProto>,
    #[serde(default)]
    pub mobprogs: Vec<MobProgScript>,
    /// Loot source text, identical to a `#LOOT` section body.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub loot: String,
}

/// Parses a JSON area document.
pub fn parse_area_json(text: &str) -> AreaResult<LoadedArea> {
    let doc: AreaJson = serde_json::from_str(text)?;
    Ok(LoadedArea {
        area: Some(doc.area),
        rooms: doc.rooms,
        mobiles: doc.mobiles,
        objects: doc.objects,
        progs: doc.mobprogs,
        helps: Vec::new(),
        loot_text: doc.loot,
    })
}

/// Renders a loaded area as pretty JSON. Helps are dropped: the JSON
/// format has no helps subsection.
pub fn render_area_json(loaded: &LoadedArea) -> AreaResult<String> {
    let doc = AreaJson {
        area: loaded
            .area
            .clone()
            .unwrap_or_else(|| placeholder_area(&loaded.rooms)),
        rooms: loaded.rooms.clone(),
        mobiles: loaded.mobiles.clone(),
        objects: loaded.objects.clone(),
        mobprogs: loaded.progs.clone(),
        loot: loaded.loot_text.clone(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn placeholder_area(rooms: &[RoomProto]) -> AreaProto {
    use mudstone_types::Vnum;
    let min = rooms.iter().map(|r| r.vnum.get()).min().unwrap_or(0);
    let max = rooms.iter().map(|r| r.vnum.get()).max().unwrap_or(0);
    AreaProto {
        name: "unnamed".into(),
        file_name: "unnamed.json".into(),
        credits: "".into(),
        min_vnum: Vnum::new(min),
        max_vnum: Vnum::new(max),
        builders: "None".into(),
        security: 9,
        reset_interval: 480,
        instance_policy: mudstone_world::InstancePolicy::Singleton,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trips_prototypes() {
        let text = r#"{
            "area": {
                "name": "Json Keep",
                "file_name": "keep.json",
                "credits": "{ 1 10} Test   Json Keep",
                "min_vnum": 9000,
                "max_vnum": 9099,
                "builders": "None",
                "security": 9,
                "reset_interval": 240,
                "instance_policy": "per_player"
            },
            "rooms": [],
            "mobiles": [],
            "objects": [],
            "mobprogs": []
        }"#;
        let loaded = parse_area_json(text).unwrap();
        let area = loaded.area.as_ref().unwrap();
        assert_eq!(&*area.name, "Json Keep");
        assert_eq!(
            area.instance_policy,
            mudstone_world::InstancePolicy::PerPlayer
        );

        let rendered = render_area_json(&loaded).unwrap();
        let reloaded = parse_area_json(&rendered).unwrap();
        assert_eq!(
            reloaded.area.unwrap().min_vnum,
            loaded.area.unwrap().min_vnum
        );
    }
}
