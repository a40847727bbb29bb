// tour.rs — 导览数据：房间图与热点边

use std::collections::HashSet;
use std::path::Path;

use glam::Vec3;
use serde::Deserialize;

use crate::config::EngineConfig;
use crate::error::TourError;

pub type RoomId = String;

/// Anchor position of a hotspot, in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Position> for Vec3 {
    fn from(p: Position) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotDescriptor {
    pub id: String,
    pub position: Position,
    #[serde(alias = "target_room_id", alias = "targetRoomId")]
    pub target_room: RoomId,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDescriptor {
    pub id: RoomId,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "image_url", alias = "image")]
    pub image_url: String,
    #[serde(default, alias = "is_start")]
    pub is_start: bool,
    #[serde(default)]
    pub hotspots: Vec<HotspotDescriptor>,
}

impl RoomDescriptor {
    /// Name under which this room's panorama lives in the resource cache.
    pub fn texture_name(&self) -> &str {
        &self.image_url
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// The navigable graph of rooms. Immutable once loaded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TourGraph {
    #[serde(default)]
    pub name: String,
    pub rooms: Vec<RoomDescriptor>,
    #[serde(default)]
    pub settings: Option<EngineConfig>,
}

impl TourGraph {
    pub fn from_json(text: &str) -> Result<Self, TourError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, TourError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Interpret a tour service reply. 403 and every other non-2xx status
    /// mean the tour is suspended; no room may be built from it.
    pub fn from_response(status: u16, body: &str) -> Result<Self, TourError> {
        if !(200..300).contains(&status) {
            return Err(TourError::Suspended { status });
        }
        Self::from_json(body)
    }

    pub fn room(&self, id: &str) -> Option<&RoomDescriptor> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.room(id).is_some()
    }

    /// First room flagged `is_start`. When several are flagged the first
    /// one in document order wins.
    pub fn start_room(&self) -> Option<&RoomDescriptor> {
        self.rooms.iter().find(|r| r.is_start)
    }

    /// Deduplicated `(name, source)` pairs for every panorama in the tour.
    pub fn assets(&self) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        self.rooms
            .iter()
            .filter(|r| seen.insert(r.texture_name().to_string()))
            .map(|r| (r.texture_name().to_string(), r.image_url.clone()))
            .collect()
    }

    /// Every data-integrity problem in the graph. An empty list means the
    /// tour is fully navigable.
    pub fn validate(&self) -> Vec<TourError> {
        let mut problems = Vec::new();

        let starts = self.rooms.iter().filter(|r| r.is_start).count();
        match starts {
            0 => problems.push(TourError::DataIntegrity("no start room".into())),
            1 => {}
            n => problems.push(TourError::DataIntegrity(format!(
                "{n} rooms are marked as start, using the first"
            ))),
        }

        let mut ids = HashSet::new();
        for room in &self.rooms {
            if !ids.insert(room.id.as_str()) {
                problems.push(TourError::DataIntegrity(format!(
                    "duplicate room id `{}`",
                    room.id
                )));
            }
        }

        for room in &self.rooms {
            for hotspot in &room.hotspots {
                if !self.contains(&hotspot.target_room) {
                    problems.push(TourError::DataIntegrity(format!(
                        "hotspot `{}` in room `{}` targets unknown room `{}`",
                        hotspot.id, room.id, hotspot.target_room
                    )));
                }
            }
        }

        problems
    }

    /// Three-room tour bundled with the binary, used when no tour file is given.
    pub fn demo() -> Self {
        fn hotspot(id: &str, (x, y, z): (f32, f32, f32), target: &str, label: &str) -> HotspotDescriptor {
            HotspotDescriptor {
                id: id.into(),
                position: Position { x, y, z },
                target_room: target.into(),
                label: label.into(),
            }
        }

        Self {
            name: "Tour Demo".into(),
            rooms: vec![
                RoomDescriptor {
                    id: "salon".into(),
                    name: "Salon".into(),
                    image_url: "tour-demo/church.jpg".into(),
                    is_start: true,
                    hotspots: vec![hotspot("h1", (200.0, 0.0, -400.0), "chambre", "Chambre")],
                },
                RoomDescriptor {
                    id: "chambre".into(),
                    name: "Chambre".into(),
                    image_url: "tour-demo/warm_bar.jpg".into(),
                    is_start: false,
                    hotspots: vec![
                        hotspot("h2", (-200.0, 0.0, 400.0), "salon", "Retour Salon"),
                        hotspot("h3", (300.0, -50.0, 200.0), "cuisine", "Cuisine"),
                    ],
                },
                RoomDescriptor {
                    id: "cuisine".into(),
                    name: "Cuisine".into(),
                    image_url: "tour-demo/warm_restaurant_night.jpg".into(),
                    is_start: false,
                    hotspots: vec![hotspot("h4", (0.0, 0.0, 500.0), "chambre", "Retour Chambre")],
                },
            ],
            settings: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "name": "Test",
        "rooms": [
            {
                "id": "a",
                "name": "Room A",
                "imageUrl": "a.jpg",
                "isStart": true,
                "hotspots": [
                    { "id": "h1", "position": { "x": 200, "y": 0, "z": -400 }, "targetRoom": "b", "label": "To B" }
                ]
            },
            {
                "id": "b",
                "image_url": "b.jpg",
                "hotspots": [
                    { "id": "h2", "position": { "x": -200, "y": 0, "z": 400 }, "target_room_id": "a", "label": "Back" }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_camel_and_snake_case() {
        let tour = TourGraph::from_json(DOC).unwrap();
        assert_eq!(tour.rooms.len(), 2);
        assert_eq!(tour.start_room().unwrap().id, "a");
        assert_eq!(tour.rooms[0].hotspots[0].target_room, "b");
        assert_eq!(tour.rooms[1].hotspots[0].target_room, "a");
        assert_eq!(tour.rooms[1].image_url, "b.jpg");
        assert!(!tour.rooms[1].is_start);
        assert!(tour.validate().is_empty());
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let tour = TourGraph::from_json(DOC).unwrap();
        assert_eq!(tour.rooms[0].display_name(), "Room A");
        assert_eq!(tour.rooms[1].display_name(), "b");
    }

    #[test]
    fn test_non_success_status_is_suspended() {
        for status in [403, 404, 500, 302] {
            match TourGraph::from_response(status, DOC) {
                Err(TourError::Suspended { status: s }) => assert_eq!(s, status),
                other => panic!("expected suspended for {status}, got {other:?}"),
            }
        }
        assert!(TourGraph::from_response(200, DOC).is_ok());
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        assert!(matches!(
            TourGraph::from_json("{ \"rooms\": 3 }"),
            Err(TourError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_reports_integrity_problems() {
        let mut tour = TourGraph::from_json(DOC).unwrap();
        tour.rooms[0].is_start = false;
        tour.rooms[1].hotspots[0].target_room = "nowhere".into();

        let problems = tour.validate();
        assert_eq!(problems.len(), 2);
        assert!(problems
            .iter()
            .all(|p| matches!(p, TourError::DataIntegrity(_))));
        assert!(tour.start_room().is_none());
    }

    #[test]
    fn test_multiple_starts_pick_first() {
        let mut tour = TourGraph::from_json(DOC).unwrap();
        tour.rooms[1].is_start = true;
        assert_eq!(tour.start_room().unwrap().id, "a");
        assert_eq!(tour.validate().len(), 1);
    }

    #[test]
    fn test_assets_are_deduplicated() {
        let mut tour = TourGraph::from_json(DOC).unwrap();
        tour.rooms[1].image_url = "a.jpg".into();
        assert_eq!(tour.assets(), vec![("a.jpg".to_string(), "a.jpg".to_string())]);
    }

    #[test]
    fn test_demo_tour_is_consistent() {
        let tour = TourGraph::demo();
        assert!(tour.validate().is_empty());
        assert_eq!(tour.start_room().unwrap().id, "salon");
        assert_eq!(tour.assets().len(), 3);
    }
}
