//! Competitor - a single horse and its equipped items
//!
//! Race state (distance, fallen latch) is reset at every start; confidence
//! persists across races and only changes through `set_confidence`.

use serde::{Deserialize, Serialize};

use super::modifier;
use crate::clamp_unit;

/// Whether an item affects performance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Affects speed, endurance and confidence
    Equipment,
    /// Cosmetic only
    Accessory,
}

/// An equippable item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    pub speed_modifier: f64,
    pub endurance_modifier: f64,
    pub confidence_modifier: f64,
    #[serde(default)]
    pub description: String,
}

impl Item {
    /// Performance-affecting item
    pub fn equipment(name: impl Into<String>, speed: f64, endurance: f64, confidence: f64) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Equipment,
            speed_modifier: speed,
            endurance_modifier: endurance,
            confidence_modifier: confidence,
            description: String::new(),
        }
    }

    /// Cosmetic item with neutral multipliers
    pub fn accessory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Accessory,
            speed_modifier: 1.0,
            endurance_modifier: 1.0,
            confidence_modifier: 1.0,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Combined equipment multipliers for one competitor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifierProfile {
    pub speed: f64,
    pub endurance: f64,
    pub confidence: f64,
}

/// A race participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    name: String,
    symbol: char,
    confidence: f64,
    breed: String,
    coat_color: String,
    #[serde(default)]
    equipment: Vec<Item>,
    #[serde(default)]
    accessories: Vec<Item>,
    /// Units covered this race
    #[serde(skip)]
    distance_travelled: u32,
    /// One-way latch for the current race
    #[serde(skip)]
    fallen: bool,
}

impl Competitor {
    /// Create a competitor; confidence is clamped to [0, 1]
    pub fn new(
        symbol: char,
        name: impl Into<String>,
        confidence: f64,
        breed: impl Into<String>,
        coat_color: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol,
            confidence: clamp_unit(confidence),
            breed: breed.into(),
            coat_color: coat_color.into(),
            equipment: Vec::new(),
            accessories: Vec::new(),
            distance_travelled: 0,
            fallen: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> char {
        self.symbol
    }

    pub fn set_symbol(&mut self, symbol: char) {
        self.symbol = symbol;
    }

    pub fn breed(&self) -> &str {
        &self.breed
    }

    pub fn coat_color(&self) -> &str {
        &self.coat_color
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Update confidence in memory (clamped). Persisting it is the caller's job.
    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = clamp_unit(confidence);
    }

    pub fn distance_travelled(&self) -> u32 {
        self.distance_travelled
    }

    pub fn has_fallen(&self) -> bool {
        self.fallen
    }

    /// Advance one unit; a fallen competitor stays where it fell
    pub fn move_forward(&mut self) {
        if !self.fallen {
            self.distance_travelled += 1;
        }
    }

    pub fn fall(&mut self) {
        self.fallen = true;
    }

    /// Reset race state for a fresh start
    pub fn go_back_to_start(&mut self) {
        self.distance_travelled = 0;
        self.fallen = false;
    }

    /// Equip an item, routed by its kind
    pub fn equip(&mut self, item: Item) {
        match item.kind {
            ItemKind::Equipment => self.equipment.push(item),
            ItemKind::Accessory => self.accessories.push(item),
        }
    }

    /// Remove every item with this name; returns true if anything was removed
    pub fn unequip(&mut self, name: &str) -> bool {
        let before = self.equipment.len() + self.accessories.len();
        self.equipment.retain(|item| item.name != name);
        self.accessories.retain(|item| item.name != name);
        before != self.equipment.len() + self.accessories.len()
    }

    pub fn equipment(&self) -> &[Item] {
        &self.equipment
    }

    pub fn accessories(&self) -> &[Item] {
        &self.accessories
    }

    pub fn modifier_profile(&self) -> ModifierProfile {
        ModifierProfile {
            speed: modifier::equipment_speed_modifier(&self.equipment),
            endurance: modifier::equipment_endurance_modifier(&self.equipment),
            confidence: modifier::equipment_confidence_modifier(&self.equipment),
        }
    }
}
