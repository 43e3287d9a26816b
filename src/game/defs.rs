//! Entity definitions
//!
//! Read-only capability table keyed by name: collision box, height, health,
//! speed, sight range, named animations, ordered attack options and the
//! names of sounds and effects a thing emits. Stored as RON.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::info;

/// Error type for definition loading
#[derive(Debug, Error)]
pub enum DefError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("unknown entity definition `{0}`")]
    Unknown(String),
    #[error("definition `{name}`: {message}")]
    Invalid { name: String, message: String },
}

/// Behavior family a definition spawns as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThingClass {
    Hero,
    Monster,
    Npc,
    Tree,
    Medkit,
    Armor,
    Missile,
    Particle,
}

/// Allegiance for target selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Group {
    Human,
    Demon,
    /// Never targets and is never targeted
    #[default]
    Neutral,
}

impl Group {
    pub fn is_hostile_to(self, other: Group) -> bool {
        self != Group::Neutral && other != Group::Neutral && self != other
    }
}

/// One attack option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackDef {
    pub name: String,
    /// Reach, measured between the two collision boxes
    pub range: f32,
    /// Cooldown ticks set when the attack is chosen
    pub reaction: u32,
    pub damage: i32,
    /// Extra damage rolled uniformly in 0..=variance
    #[serde(default)]
    pub damage_variance: i32,
    pub animation: String,
    /// Frame on which the hit lands or the projectile leaves
    pub fire_frame: usize,
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub sound_frame: usize,
    /// Missile definition to spawn; None = instant hit
    #[serde(default)]
    pub projectile: Option<String>,
}

impl AttackDef {
    pub fn is_instant(&self) -> bool {
        self.projectile.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundSet {
    pub wake: Option<String>,
    pub pain: Option<String>,
    pub death: Option<String>,
    pub impact: Option<String>,
    pub pickup: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    pub class: ThingClass,
    #[serde(default)]
    pub group: Group,
    /// Horizontal collision half-extent
    #[serde(rename = "box")]
    pub radius: f32,
    pub height: f32,
    #[serde(default)]
    pub health: i32,
    #[serde(default)]
    pub speed: f32,
    #[serde(default)]
    pub sight: f32,
    /// Animation name → sprite indices
    #[serde(default)]
    pub animations: HashMap<String, Vec<u32>>,
    #[serde(default)]
    pub attacks: Vec<AttackDef>,
    #[serde(default)]
    pub sounds: SoundSet,
    /// Particle knocked off a non-lethal hit
    #[serde(default)]
    pub blood: Option<String>,
    /// Particle burst on a lethal hit
    #[serde(default)]
    pub death_effect: Option<String>,
    /// Particle left where a missile lands
    #[serde(default)]
    pub explosion: Option<String>,
    /// Per-definition gravity override
    #[serde(default)]
    pub gravity: Option<f32>,
    /// Heal or armor value for pickups
    #[serde(default)]
    pub amount: i32,
}

/// Name → definition table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefTable {
    defs: HashMap<String, EntityDef>,
}

impl DefTable {
    /// Parse a table from RON and validate cross references.
    pub fn from_ron(text: &str) -> Result<Self, DefError> {
        let table: DefTable = ron::from_str(text)?;
        table.validate()?;
        info!(definitions = table.defs.len(), "loaded entity definitions");
        Ok(table)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DefError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    pub fn get(&self, name: &str) -> Result<&EntityDef, DefError> {
        self.defs.get(name).ok_or_else(|| DefError::Unknown(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, def: EntityDef) {
        self.defs.insert(name.into(), def);
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Check that attacks name existing animations and missile definitions.
    pub fn validate(&self) -> Result<(), DefError> {
        for (name, def) in &self.defs {
            let invalid = |message: String| DefError::Invalid { name: name.clone(), message };

            if !(def.radius > 0.0) || !(def.height > 0.0) {
                return Err(invalid(format!("box {} and height {} must be positive", def.radius, def.height)));
            }
            for attack in &def.attacks {
                let frames = def.animations.get(&attack.animation).ok_or_else(|| {
                    invalid(format!("attack `{}` uses missing animation `{}`", attack.name, attack.animation))
                })?;
                if attack.fire_frame >= frames.len() || attack.sound_frame >= frames.len() {
                    return Err(invalid(format!(
                        "attack `{}` frames out of range for {}-frame animation", attack.name, frames.len())));
                }
                if attack.damage_variance < 0 {
                    return Err(invalid(format!("attack `{}` has negative damage variance", attack.name)));
                }
                if let Some(projectile) = &attack.projectile {
                    match self.defs.get(projectile) {
                        Some(missile) if missile.class == ThingClass::Missile => {}
                        Some(_) => return Err(invalid(format!("projectile `{}` is not a missile", projectile))),
                        None => return Err(invalid(format!("projectile `{}` is not defined", projectile))),
                    }
                }
            }
        }
        Ok(())
    }
}
