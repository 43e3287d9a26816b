//! Sector graph
//!
//! Sectors are closed polygons with a floor/ceiling height band. Lines are
//! directed wall segments with up to two adjoining sectors: `plus` on the
//! left when walking a→b, `minus` on the right. Everything is stored in flat
//! arrays and cross-referenced by `SectorId` / `LineId`.

use serde::{Serialize, Deserialize};
use tracing::warn;
use crate::math::{
    point_in_polygon, point_in_triangle_2d, point_to_segment_distance, polygon_signed_area,
    side_of_line, Vec2,
};
use super::level::{LevelError, MapData};

/// Index of a sector in `Map::sectors`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectorId(pub u32);

impl SectorId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a line in `Map::lines`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId(pub u32);

impl LineId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A drawable wall band on one line (top, middle or bottom)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallPiece {
    /// Lower edge height
    pub floor: f32,
    /// Upper edge height
    pub ceiling: f32,
    /// Texture index (None = renderer fallback)
    pub texture: Option<u32>,
}

/// A directed wall segment between two sectors
#[derive(Debug, Clone)]
pub struct Line {
    pub a: Vec2,
    pub b: Vec2,
    /// Sector on the left side (a→b)
    pub plus: Option<SectorId>,
    /// Sector on the right side (a→b)
    pub minus: Option<SectorId>,
    pub top: Option<WallPiece>,
    pub middle: Option<WallPiece>,
    pub bottom: Option<WallPiece>,
    /// Always blocks horizontal movement when true. Non-physical lines are
    /// ledges: crossable if the height band fits.
    pub physical: bool,
}

impl Line {
    /// Both adjoining sectors, when the line is two-sided.
    pub fn sides(&self) -> Option<(SectorId, SectorId)> {
        match (self.plus, self.minus) {
            (Some(p), Some(m)) => Some((p, m)),
            _ => None,
        }
    }

    /// Distance from a map point to this segment.
    pub fn distance_to(&self, p: Vec2) -> f32 {
        point_to_segment_distance(p, self.a, self.b)
    }

    /// The sector on the side of the line that `p` lies on.
    /// Points exactly on the line resolve to `plus`.
    pub fn sector_on_side(&self, p: Vec2) -> Option<SectorId> {
        if side_of_line(p, self.a, self.b) >= 0.0 {
            self.plus.or(self.minus)
        } else {
            self.minus.or(self.plus)
        }
    }
}

/// A floor or ceiling triangle ready for the renderer
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub vertices: [Vec2; 3],
    pub uvs: [Vec2; 3],
    /// World height of the surface
    pub height: f32,
    pub texture: Option<u32>,
    /// +1.0 for floor (faces up), -1.0 for ceiling (faces down)
    pub normal: f32,
}

/// A polygonal region with a floor/ceiling height band
#[derive(Debug, Clone)]
pub struct Sector {
    /// Closed vertex ring (last vertex connects back to the first)
    pub vertices: Vec<Vec2>,
    /// Lines naming this sector on either side
    pub lines: Vec<LineId>,
    pub bottom: f32,
    pub floor: f32,
    pub ceiling: f32,
    pub top: f32,
    pub floor_texture: Option<u32>,
    pub ceiling_texture: Option<u32>,
    pub triangles: Vec<Triangle>,
    area: f32,
}

impl Sector {
    pub fn new(
        vertices: Vec<Vec2>,
        heights: [f32; 4],
        floor_texture: Option<u32>,
        ceiling_texture: Option<u32>,
        texture_scale: f32,
    ) -> Self {
        let [bottom, floor, ceiling, top] = heights;
        let area = polygon_signed_area(&vertices).abs();
        let mut sector = Self {
            vertices,
            lines: Vec::new(),
            bottom,
            floor,
            ceiling,
            top,
            floor_texture,
            ceiling_texture,
            triangles: Vec::new(),
            area,
        };
        sector.triangulate(texture_scale);
        sector
    }

    /// Point containment over the vertex ring.
    pub fn contains(&self, p: Vec2) -> bool {
        point_in_polygon(p, &self.vertices)
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    /// Rebuild floor and ceiling triangles by ear clipping the vertex ring.
    pub fn triangulate(&mut self, texture_scale: f32) {
        self.triangles.clear();
        let ears = ear_clip(&self.vertices);
        let uv = |v: Vec2| v * texture_scale;

        for [i, j, k] in &ears {
            let (a, b, c) = (self.vertices[*i], self.vertices[*j], self.vertices[*k]);
            self.triangles.push(Triangle {
                vertices: [a, b, c],
                uvs: [uv(a), uv(b), uv(c)],
                height: self.floor,
                texture: self.floor_texture,
                normal: 1.0,
            });
        }
        for [i, j, k] in &ears {
            // Ceiling faces down: reverse winding
            let (a, b, c) = (self.vertices[*k], self.vertices[*j], self.vertices[*i]);
            self.triangles.push(Triangle {
                vertices: [a, b, c],
                uvs: [uv(a), uv(b), uv(c)],
                height: self.ceiling,
                texture: self.ceiling_texture,
                normal: -1.0,
            });
        }
    }
}

/// Ear-clipping triangulation of a simple polygon.
///
/// Returns index triples with counter-clockwise winding regardless of the
/// ring's input orientation.
fn ear_clip(ring: &[Vec2]) -> Vec<[usize; 3]> {
    let n = ring.len();
    let mut out = Vec::with_capacity(n.saturating_sub(2));
    if n < 3 {
        return out;
    }

    let mut remaining: Vec<usize> = (0..n).collect();
    if polygon_signed_area(ring) < 0.0 {
        remaining.reverse();
    }

    let mut guard = 0;
    while remaining.len() > 3 {
        let m = remaining.len();
        let mut clipped = false;
        for i in 0..m {
            let prev = remaining[(i + m - 1) % m];
            let cur = remaining[i];
            let next = remaining[(i + 1) % m];
            let (a, b, c) = (ring[prev], ring[cur], ring[next]);

            // Reflex or collinear corner can't be an ear
            if (b - a).cross(c - b) <= 0.0 {
                continue;
            }
            let blocked = remaining.iter().any(|&other| {
                other != prev && other != cur && other != next
                    && point_in_triangle_2d(ring[other], a, b, c)
            });
            if blocked {
                continue;
            }

            out.push([prev, cur, next]);
            remaining.remove(i);
            clipped = true;
            break;
        }

        if !clipped {
            guard += 1;
            if guard > 1 {
                warn!(vertices = n, "ear clipping stalled on a degenerate polygon");
                break;
            }
            // Drop one collinear vertex and retry
            if let Some(pos) = (0..remaining.len()).find(|&i| {
                let m = remaining.len();
                let a = ring[remaining[(i + m - 1) % m]];
                let b = ring[remaining[i]];
                let c = ring[remaining[(i + 1) % m]];
                (b - a).cross(c - b).abs() < 1e-6
            }) {
                remaining.remove(pos);
                guard = 0;
            }
        }
    }
    if remaining.len() == 3 {
        out.push([remaining[0], remaining[1], remaining[2]]);
    }
    out
}

/// The static map: sectors and lines
#[derive(Debug, Clone)]
pub struct Map {
    pub sectors: Vec<Sector>,
    pub lines: Vec<Line>,
    /// Smallest x of any vertex
    pub min_x: f32,
    /// Smallest z of any vertex
    pub min_z: f32,
    /// Largest x of any vertex
    pub max_x: f32,
    /// Largest z of any vertex
    pub max_z: f32,
}

impl Map {
    /// Resolve parsed map data into the sector graph.
    pub fn build(data: &MapData, texture_scale: f32) -> Result<Self, LevelError> {
        data.validate()?;

        let mut sectors = Vec::with_capacity(data.sectors.len());
        for spec in &data.sectors {
            let ring: Vec<Vec2> = spec.vertices.iter().map(|&i| data.vertices[i]).collect();
            sectors.push(Sector::new(
                ring,
                [spec.bottom, spec.floor, spec.ceiling, spec.top],
                spec.floor_texture,
                spec.ceiling_texture,
                texture_scale,
            ));
        }

        let mut lines = Vec::with_capacity(data.lines.len());
        for (i, spec) in data.lines.iter().enumerate() {
            let id = LineId(i as u32);
            let plus = spec.plus.map(|s| SectorId(s as u32));
            let minus = spec.minus.map(|s| SectorId(s as u32));

            let mut line = Line {
                a: data.vertices[spec.a],
                b: data.vertices[spec.b],
                plus,
                minus,
                top: None,
                middle: None,
                bottom: None,
                physical: false,
            };

            match (plus, minus) {
                (Some(p), Some(m)) => {
                    let (sp, sm) = (&sectors[p.index()], &sectors[m.index()]);
                    let (low_floor, high_floor) = min_max(sp.floor, sm.floor);
                    let (low_ceiling, high_ceiling) = min_max(sp.ceiling, sm.ceiling);
                    if low_floor < high_floor {
                        line.bottom = Some(WallPiece { floor: low_floor, ceiling: high_floor, texture: spec.bottom });
                    }
                    if low_ceiling < high_ceiling {
                        line.top = Some(WallPiece { floor: low_ceiling, ceiling: high_ceiling, texture: spec.top });
                    }
                    if spec.middle.is_some() {
                        line.middle = Some(WallPiece { floor: high_floor, ceiling: low_ceiling, texture: spec.middle });
                        line.physical = true;
                    }
                }
                (Some(s), None) | (None, Some(s)) => {
                    let sector = &sectors[s.index()];
                    line.middle = Some(WallPiece { floor: sector.floor, ceiling: sector.ceiling, texture: spec.middle });
                    line.physical = true;
                }
                (None, None) => {
                    // Validation rejects these, but stay blocking if one slips through
                    line.physical = true;
                }
            }

            if let Some(p) = plus {
                sectors[p.index()].lines.push(id);
            }
            if let Some(m) = minus {
                if Some(m) != plus {
                    sectors[m.index()].lines.push(id);
                }
            }
            lines.push(line);
        }

        let (mut min_x, mut min_z) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_z) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for v in &data.vertices {
            min_x = min_x.min(v.x);
            min_z = min_z.min(v.y);
            max_x = max_x.max(v.x);
            max_z = max_z.max(v.y);
        }
        if data.vertices.is_empty() {
            (min_x, min_z, max_x, max_z) = (0.0, 0.0, 0.0, 0.0);
        }

        Ok(Self { sectors, lines, min_x, min_z, max_x, max_z })
    }

    pub fn sector(&self, id: SectorId) -> &Sector {
        &self.sectors[id.index()]
    }

    pub fn line(&self, id: LineId) -> &Line {
        &self.lines[id.index()]
    }

    /// Find which sector contains a map point.
    ///
    /// Full polygon search. Nested sectors resolve to the smallest containing
    /// polygon. Returns None outside the map.
    pub fn find_sector(&self, x: f32, z: f32) -> Option<SectorId> {
        let p = Vec2::new(x, z);
        let mut best: Option<(SectorId, f32)> = None;
        for (i, sector) in self.sectors.iter().enumerate() {
            if !sector.contains(p) {
                continue;
            }
            match best {
                Some((_, area)) if area <= sector.area() => {}
                _ => best = Some((SectorId(i as u32), sector.area())),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Find sector, checking a hint first.
    pub fn find_sector_with_hint(&self, x: f32, z: f32, hint: Option<SectorId>) -> Option<SectorId> {
        if let Some(id) = hint {
            let sector = self.sector(id);
            // Only trust the hint if nothing smaller could be nested inside it
            if sector.contains(Vec2::new(x, z)) && !self.has_nested(id) {
                return Some(id);
            }
        }
        self.find_sector(x, z)
    }

    fn has_nested(&self, id: SectorId) -> bool {
        let outer = self.sector(id);
        self.sectors.iter().enumerate().any(|(i, s)| {
            i != id.index() && s.area() < outer.area()
                && s.vertices.first().map_or(false, |&v| outer.contains(v))
        })
    }
}

fn min_max(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}
