//! Map loading
//!
//! `MapData` is the resolved-index form of a map: vertex positions, sector
//! and line records that refer to vertices/sectors by index, spawn requests,
//! line triggers and free-form info. It can be built in code, read from RON,
//! or parsed from the line-oriented text format:
//!
//! ```text
//! vertices 4
//! 0 0
//! ...
//! sectors 1
//! # bottom floor ceiling top floor_tex ceiling_tex count v0 v1 ...
//! 0 0 4 4 1 2 4 0 1 2 3
//! lines 4
//! # a b top_tex middle_tex bottom_tex plus minus   (-1 = none)
//! 0 1 -1 3 -1 0 -1
//! things 1
//! hero 2 2 0
//! triggers 1
//! 0 interact-line door 1
//! info
//! music theme
//! end
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::info;
use crate::math::Vec2;

/// Validation limits to keep malformed files from exhausting memory
pub mod limits {
    /// Maximum number of vertices in a map
    pub const MAX_VERTICES: usize = 65_536;
    /// Maximum number of sectors in a map
    pub const MAX_SECTORS: usize = 8_192;
    /// Maximum number of lines in a map
    pub const MAX_LINES: usize = 65_536;
    /// Maximum number of spawn requests
    pub const MAX_THINGS: usize = 16_384;
    /// Maximum coordinate value (prevents overflow issues)
    pub const MAX_COORD: f32 = 1_000_000.0;
    /// Maximum number of broad-phase grid cells the map bounds may need
    pub const MAX_GRID_CELLS: usize = 1 << 20;
}

/// Error type for map loading
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: unknown section `{keyword}`")]
    UnknownSection { line: usize, keyword: String },
    #[error("Validation error: {0}")]
    Validation(String),
}

/// A sector record as it appears in the map file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorSpec {
    pub bottom: f32,
    pub floor: f32,
    pub ceiling: f32,
    pub top: f32,
    #[serde(default)]
    pub floor_texture: Option<u32>,
    #[serde(default)]
    pub ceiling_texture: Option<u32>,
    /// Indices into `MapData::vertices`, in ring order
    pub vertices: Vec<usize>,
}

/// A line record as it appears in the map file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSpec {
    pub a: usize,
    pub b: usize,
    #[serde(default)]
    pub top: Option<u32>,
    #[serde(default)]
    pub middle: Option<u32>,
    #[serde(default)]
    pub bottom: Option<u32>,
    /// Sector on the left of a→b
    #[serde(default)]
    pub plus: Option<usize>,
    /// Sector on the right of a→b
    #[serde(default)]
    pub minus: Option<usize>,
}

/// A request to spawn an entity definition at a map position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThingSpawn {
    /// Entity definition name
    pub name: String,
    pub x: f32,
    pub z: f32,
    #[serde(default)]
    pub rotation: f32,
}

/// A gameplay trigger attached to a line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub line: usize,
    /// Event name passed up to the host (e.g. "interact-line", "begin-cinema")
    pub event: String,
    #[serde(default)]
    pub params: Vec<String>,
}

/// Fully index-resolved map description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    pub vertices: Vec<Vec2>,
    pub sectors: Vec<SectorSpec>,
    pub lines: Vec<LineSpec>,
    #[serde(default)]
    pub things: Vec<ThingSpawn>,
    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,
    /// Free-form key/value info (e.g. `music`)
    #[serde(default)]
    pub info: BTreeMap<String, String>,
}

impl MapData {
    /// Ambient music track named in the info section
    pub fn music(&self) -> Option<&str> {
        self.info.get("music").map(String::as_str)
    }

    /// Check index ranges, counts and height bands.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.vertices.len() > limits::MAX_VERTICES {
            return Err(LevelError::Validation(format!(
                "too many vertices ({} > {})", self.vertices.len(), limits::MAX_VERTICES)));
        }
        if self.sectors.len() > limits::MAX_SECTORS {
            return Err(LevelError::Validation(format!(
                "too many sectors ({} > {})", self.sectors.len(), limits::MAX_SECTORS)));
        }
        if self.lines.len() > limits::MAX_LINES {
            return Err(LevelError::Validation(format!(
                "too many lines ({} > {})", self.lines.len(), limits::MAX_LINES)));
        }
        if self.things.len() > limits::MAX_THINGS {
            return Err(LevelError::Validation(format!(
                "too many things ({} > {})", self.things.len(), limits::MAX_THINGS)));
        }

        for (i, v) in self.vertices.iter().enumerate() {
            if !is_valid_coord(v.x) || !is_valid_coord(v.y) {
                return Err(LevelError::Validation(format!("vertex {}: invalid position ({}, {})", i, v.x, v.y)));
            }
        }

        for (i, sector) in self.sectors.iter().enumerate() {
            if sector.vertices.len() < 3 {
                return Err(LevelError::Validation(format!(
                    "sector {}: needs at least 3 vertices, has {}", i, sector.vertices.len())));
            }
            if let Some(&bad) = sector.vertices.iter().find(|&&v| v >= self.vertices.len()) {
                return Err(LevelError::Validation(format!("sector {}: vertex index {} out of range", i, bad)));
            }
            if sector.floor > sector.ceiling {
                return Err(LevelError::Validation(format!(
                    "sector {}: floor {} above ceiling {}", i, sector.floor, sector.ceiling)));
            }
        }

        for (i, line) in self.lines.iter().enumerate() {
            if line.a >= self.vertices.len() || line.b >= self.vertices.len() {
                return Err(LevelError::Validation(format!("line {}: vertex index out of range", i)));
            }
            for side in [line.plus, line.minus].into_iter().flatten() {
                if side >= self.sectors.len() {
                    return Err(LevelError::Validation(format!("line {}: sector index {} out of range", i, side)));
                }
            }
            if line.plus.is_none() && line.minus.is_none() {
                return Err(LevelError::Validation(format!("line {}: has no adjoining sector", i)));
            }
        }

        for (i, trigger) in self.triggers.iter().enumerate() {
            if trigger.line >= self.lines.len() {
                return Err(LevelError::Validation(format!("trigger {}: line index {} out of range", i, trigger.line)));
            }
        }

        for thing in &self.things {
            if !is_valid_coord(thing.x) || !is_valid_coord(thing.z) {
                return Err(LevelError::Validation(format!("thing `{}`: invalid position", thing.name)));
            }
        }

        Ok(())
    }

    /// Parse the line-oriented text format.
    pub fn parse(text: &str) -> Result<Self, LevelError> {
        let mut reader = Reader::new(text);
        let mut data = MapData::default();

        let count = reader.expect_header("vertices")?;
        for _ in 0..count {
            let (line, fields) = reader.record()?;
            let x = parse_field::<f32>(&fields, 0, line)?;
            let z = parse_field::<f32>(&fields, 1, line)?;
            data.vertices.push(Vec2::new(x, z));
        }

        let count = reader.expect_header("sectors")?;
        for _ in 0..count {
            let (line, fields) = reader.record()?;
            let n = parse_field::<usize>(&fields, 6, line)?;
            let mut vertices = Vec::with_capacity(n.min(limits::MAX_VERTICES));
            for i in 0..n {
                vertices.push(parse_field::<usize>(&fields, 7 + i, line)?);
            }
            data.sectors.push(SectorSpec {
                bottom: parse_field(&fields, 0, line)?,
                floor: parse_field(&fields, 1, line)?,
                ceiling: parse_field(&fields, 2, line)?,
                top: parse_field(&fields, 3, line)?,
                floor_texture: parse_optional(&fields, 4, line)?,
                ceiling_texture: parse_optional(&fields, 5, line)?,
                vertices,
            });
        }

        let count = reader.expect_header("lines")?;
        for _ in 0..count {
            let (line, fields) = reader.record()?;
            data.lines.push(LineSpec {
                a: parse_field(&fields, 0, line)?,
                b: parse_field(&fields, 1, line)?,
                top: parse_optional(&fields, 2, line)?,
                middle: parse_optional(&fields, 3, line)?,
                bottom: parse_optional(&fields, 4, line)?,
                plus: parse_optional::<usize>(&fields, 5, line)?,
                minus: parse_optional::<usize>(&fields, 6, line)?,
            });
        }

        // Trailing keyed sections, any order
        while let Some((line, fields)) = reader.next_record() {
            let keyword = fields[0];
            match keyword {
                "things" => {
                    let count = parse_field::<usize>(&fields, 1, line)?;
                    for _ in 0..count {
                        let (line, fields) = reader.record()?;
                        data.things.push(ThingSpawn {
                            name: field(&fields, 0, line)?.to_string(),
                            x: parse_field(&fields, 1, line)?,
                            z: parse_field(&fields, 2, line)?,
                            rotation: if fields.len() > 3 { parse_field(&fields, 3, line)? } else { 0.0 },
                        });
                    }
                }
                "triggers" => {
                    let count = parse_field::<usize>(&fields, 1, line)?;
                    for _ in 0..count {
                        let (line, fields) = reader.record()?;
                        data.triggers.push(TriggerSpec {
                            line: parse_field(&fields, 0, line)?,
                            event: field(&fields, 1, line)?.to_string(),
                            params: fields[2..].iter().map(|s| s.to_string()).collect(),
                        });
                    }
                }
                "info" => loop {
                    let (line, fields) = reader.record()?;
                    if fields[0] == "end" {
                        break;
                    }
                    let value = fields[1..].join(" ");
                    if value.is_empty() {
                        return Err(LevelError::Parse { line, message: format!("info key `{}` has no value", fields[0]) });
                    }
                    data.info.insert(fields[0].to_string(), value);
                },
                other => {
                    return Err(LevelError::UnknownSection { line, keyword: other.to_string() });
                }
            }
        }

        data.validate()?;
        info!(
            vertices = data.vertices.len(),
            sectors = data.sectors.len(),
            lines = data.lines.len(),
            things = data.things.len(),
            "parsed map"
        );
        Ok(data)
    }

    /// Parse RON map data.
    pub fn from_ron(text: &str) -> Result<Self, LevelError> {
        let data: MapData = ron::from_str(text)?;
        data.validate()?;
        Ok(data)
    }
}

/// Load a map file. `.ron` files are read as RON, anything else as the text format.
pub fn load_map<P: AsRef<Path>>(path: P) -> Result<MapData, LevelError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let is_ron = path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("ron"));
    if is_ron {
        MapData::from_ron(&contents)
    } else {
        MapData::parse(&contents)
    }
}

/// Check if a float is valid (not NaN or Inf)
fn is_valid_coord(f: f32) -> bool {
    f.is_finite() && f.abs() <= limits::MAX_COORD
}

/// Record reader that skips blanks and `#` comments and tracks line numbers
struct Reader<'a> {
    lines: std::iter::Peekable<std::iter::Enumerate<std::str::Lines<'a>>>,
    last_line: usize,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Self { lines: text.lines().enumerate().peekable(), last_line: 0 }
    }

    fn next_record(&mut self) -> Option<(usize, Vec<&'a str>)> {
        for (i, raw) in self.lines.by_ref() {
            let content = raw.split('#').next().unwrap_or("");
            let fields: Vec<&str> = content.split_whitespace().collect();
            self.last_line = i + 1;
            if !fields.is_empty() {
                return Some((i + 1, fields));
            }
        }
        None
    }

    fn record(&mut self) -> Result<(usize, Vec<&'a str>), LevelError> {
        self.next_record().ok_or_else(|| LevelError::Parse {
            line: self.last_line,
            message: "unexpected end of file".into(),
        })
    }

    fn expect_header(&mut self, keyword: &str) -> Result<usize, LevelError> {
        let (line, fields) = self.record()?;
        if fields[0] != keyword {
            return Err(LevelError::Parse {
                line,
                message: format!("expected `{}` section, found `{}`", keyword, fields[0]),
            });
        }
        parse_field(&fields, 1, line)
    }
}

fn field<'a>(fields: &[&'a str], index: usize, line: usize) -> Result<&'a str, LevelError> {
    fields.get(index).copied().ok_or_else(|| LevelError::Parse {
        line,
        message: format!("missing field {}", index + 1),
    })
}

fn parse_field<T: std::str::FromStr>(fields: &[&str], index: usize, line: usize) -> Result<T, LevelError> {
    let raw = field(fields, index, line)?;
    raw.parse().map_err(|_| LevelError::Parse {
        line,
        message: format!("invalid value `{}` in field {}", raw, index + 1),
    })
}

/// `-1` (or any negative number) means "none"
fn parse_optional<T: TryFrom<i64>>(fields: &[&str], index: usize, line: usize) -> Result<Option<T>, LevelError> {
    let value: i64 = parse_field(fields, index, line)?;
    if value < 0 {
        return Ok(None);
    }
    T::try_from(value).map(Some).map_err(|_| LevelError::Parse {
        line,
        message: format!("value {} out of range in field {}", value, index + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ROOM: &str = "
        # single square room
        vertices 4
        0 0
        8 0
        8 8
        0 8
        sectors 1
        0 0 4 4 1 2 4 0 1 2 3
        lines 4
        0 1 -1 3 -1 0 -1
        1 2 -1 3 -1 0 -1
        2 3 -1 3 -1 0 -1
        3 0 -1 3 -1 0 -1
        things 2
        hero 2 2
        imp 6 6 1.5
        triggers 1
        2 interact-line door 1
        info
        music dungeon theme
        end
    ";

    #[test]
    fn test_parse_room() {
        let data = MapData::parse(ROOM).unwrap();
        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.sectors[0].vertices, vec![0, 1, 2, 3]);
        assert_eq!(data.sectors[0].floor_texture, Some(1));
        assert_eq!(data.lines[0].middle, Some(3));
        assert_eq!(data.lines[0].top, None);
        assert_eq!(data.lines[0].plus, Some(0));
        assert_eq!(data.lines[0].minus, None);
        assert_eq!(data.things[1].name, "imp");
        assert_eq!(data.things[1].rotation, 1.5);
        assert_eq!(data.triggers[0].params, vec!["door".to_string(), "1".to_string()]);
        assert_eq!(data.music(), Some("dungeon theme"));
    }

    #[test]
    fn test_unknown_section_is_fatal() {
        let text = ROOM.replace("triggers 1", "doors 1");
        match MapData::parse(&text) {
            Err(LevelError::UnknownSection { keyword, .. }) => assert_eq!(keyword, "doors"),
            other => panic!("expected unknown section error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_file_reports_line() {
        let text = "vertices 3\n0 0\n1 1\n";
        match MapData::parse(text) {
            Err(LevelError::Parse { message, .. }) => assert!(message.contains("end of file")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_floor_above_ceiling_rejected() {
        let text = ROOM.replace("0 0 4 4 1 2 4 0 1 2 3", "0 5 4 4 1 2 4 0 1 2 3");
        assert!(matches!(MapData::parse(&text), Err(LevelError::Validation(_))));
    }

    #[test]
    fn test_bad_sector_index_rejected() {
        let text = ROOM.replace("3 0 -1 3 -1 0 -1", "3 0 -1 3 -1 7 -1");
        assert!(matches!(MapData::parse(&text), Err(LevelError::Validation(_))));
    }

    #[test]
    fn test_load_map_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".map").tempfile().unwrap();
        file.write_all(ROOM.as_bytes()).unwrap();
        let data = load_map(file.path()).unwrap();
        assert_eq!(data.things.len(), 2);
    }

    #[test]
    fn test_ron_round_trip_through_disk() {
        let data = MapData::parse(ROOM).unwrap();
        let text = ron::to_string(&data).unwrap();
        let mut file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        assert_eq!(load_map(file.path()).unwrap(), data);
    }

    #[test]
    fn test_bundled_demo_map_parses() {
        let data = MapData::parse(include_str!("../../assets/maps/demo.map")).unwrap();
        assert_eq!(data.sectors.len(), 2);
        assert_eq!(data.things[0].name, "hero");
        assert_eq!(data.triggers[0].params, vec!["gate".to_string(), "1".to_string()]);
        assert_eq!(data.music(), Some("courtyard"));
    }
}
