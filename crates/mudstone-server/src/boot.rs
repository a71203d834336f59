//! Boot: load every data file, build the world, bind the listener.

use std::net::SocketAddr;

use thiserror::Error;

use mudstone_area::AreaError;
use mudstone_loot::LootDb;
use mudstone_net::{NetError, NetServer, TlsConfig};
use mudstone_types::{ItemType, Vnum, WEAR_TAKE};
use mudstone_world::{ObjProto, Registry, World, WorldError};

use crate::config::ServerConfig;
use crate::fight::{CORPSE_VNUM, MONEY_VNUM};
use crate::game::{Game, GameIo};
use crate::help::HelpTree;

/// Boot failures. All fatal: the process exits 1.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("bad listen address '{0}'")]
    BadAddress(String),

    #[error("area list: {0}")]
    AreaList(#[source] AreaError),

    #[error("area file {file}: {source}")]
    Area {
        file: String,
        #[source]
        source: AreaError,
    },

    #[error(transparent)]
    Net(#[from] NetError),

    #[error("world: {0}")]
    World(#[from] WorldError),
}

/// Boots the server from configuration: parses every area file into the
/// registry, builds and links the singleton world, loads loot and helps,
/// resets every area once, and binds the listener.
pub fn boot(config: ServerConfig) -> Result<Game, BootError> {
    let address: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .map_err(|_| BootError::BadAddress(config.server.bind_address.clone()))?;

    // Prototypes from every listed area file.
    let mut registry = Registry::new();
    let mut helps = Vec::new();
    let mut loot = LootDb::new();
    let mut area_keys = Vec::new();

    let files =
        mudstone_area::read_area_list(&config.area_list_path()).map_err(BootError::AreaList)?;
    for file in files {
        let path = config.area_path(&file);
        let loaded = mudstone_area::load_area_file(&path).map_err(|source| BootError::Area {
            file: file.clone(),
            source,
        })?;
        helps.extend(loaded.helps.iter().cloned());
        if !loaded.loot_text.is_empty() {
            mudstone_loot::parse_loot_text(&mut loot, &loaded.loot_text, &file);
        }
        if let Some(key) = loaded.register(&mut registry) {
            area_keys.push(key);
        }
        tracing::info!(file, "area loaded");
    }

    // The standalone loot file is optional.
    match std::fs::read_to_string(config.loot_path()) {
        Ok(text) => mudstone_loot::parse_loot_text(&mut loot, &text, &config.data.loot_file),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(BootError::AreaList(AreaError::io(config.loot_path(), e)));
        }
    }
    loot.resolve_all();

    ensure_builtin_prototypes(&mut registry);

    // The world RNG seed comes from config so resets can be replayed.
    let seed = if config.game.rng_seed == 0 {
        rand::random()
    } else {
        config.game.rng_seed
    };
    let mut world = World::new(registry, seed);

    // Singleton instances for every area; per-player areas materialize
    // on first entry. Exit fix-up runs after all areas exist so
    // cross-area exits resolve.
    let mut instances = Vec::new();
    for key in area_keys {
        let policy = world
            .registry
            .area(key)
            .map(|a| a.instance_policy)
            .unwrap_or_default();
        if policy == mudstone_world::InstancePolicy::Singleton {
            instances.push(world.instantiate_area(key, None)?);
        }
    }
    for &area_id in &instances {
        world.link_area_exits(area_id);
    }
    for &area_id in &instances {
        mudstone_world::reset_area(&mut world, area_id);
    }
    tracing::info!(
        areas = instances.len(),
        rooms = world.rooms.len(),
        mobs = world.mobs.len(),
        "world materialized"
    );

    let tls = match (&config.server.tls_cert, &config.server.tls_key) {
        (Some(cert), Some(key)) => Some(TlsConfig::new(cert, key)),
        _ => None,
    };
    let net = NetServer::bind(address, tls.as_ref())?;

    let mut io = GameIo::new(net, config);
    io.helps = HelpTree::new(helps);
    io.loot = loot;
    register_natives(&mut io);

    let audit = world.audit();
    if !audit.is_empty() {
        tracing::warn!(target: "bug", violations = audit.len(), "boot audit found problems");
    }

    Ok(Game { world, io })
}

/// Binds the native command closures the command table resolves by
/// name through the script VM.
fn register_natives(io: &mut GameIo) {
    io.vm.register_native("cmd_version", |_context, _args| {
        Ok(mudstone_script::Value::Text(format!(
            "Mudstone {}\n\r",
            env!("CARGO_PKG_VERSION")
        )))
    });
}

/// Registers the engine-reserved prototypes (corpse shell, coin pile)
/// when no area provides them, so death and money handling never depend
/// on the data set.
fn ensure_builtin_prototypes(registry: &mut Registry) {
    if registry.object(CORPSE_VNUM).is_none() {
        registry.insert_object(builtin_object(
            CORPSE_VNUM,
            ItemType::Corpse,
            "corpse",
            "a corpse",
            "A corpse is lying here.",
        ));
    }
    if registry.object(MONEY_VNUM).is_none() {
        let mut coins = builtin_object(
            MONEY_VNUM,
            ItemType::Money,
            "coins money",
            "a pile of coins",
            "A pile of coins lies here.",
        );
        coins.wear_flags = WEAR_TAKE;
        registry.insert_object(coins);
    }
}

fn builtin_object(
    vnum: Vnum,
    item_type: ItemType,
    name: &str,
    short_descr: &str,
    description: &str,
) -> ObjProto {
    ObjProto {
        vnum,
        name: name.into(),
        short_descr: short_descr.into(),
        description: description.into(),
        material: "none".into(),
        item_type,
        extra_flags: 0,
        wear_flags: 0,
        values: [0; 5],
        weight: 10,
        cost: 0,
        condition: 100,
        level: 0,
        affects: Vec::new(),
        extra_descs: Vec::new(),
    }
}
