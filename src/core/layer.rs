// Copyright @yucwang 2026

use std::collections::HashMap;

pub const MAX_LAYERS: usize = 32;
pub const DEFAULT_LAYER: &str = "default";

/// Set of geometry layers a ray is allowed to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RayMask(u32);

impl RayMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn from_layer(layer: u8) -> Self {
        if (layer as usize) < MAX_LAYERS {
            Self(1 << layer)
        } else {
            Self::NONE
        }
    }

    pub fn from_layers(layers: &[u8]) -> Self {
        layers.iter().fold(Self::NONE, |mask, layer| mask | Self::from_layer(*layer))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains_layer(self, layer: u8) -> bool {
        (self.0 & Self::from_layer(layer).0) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for RayMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl std::ops::BitOr for RayMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for RayMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Names the layers geometry can be assigned to. Layer 0 is always `default`.
#[derive(Debug, Clone)]
pub struct LayerTable {
    names: Vec<String>,
    lookup: HashMap<String, u8>,
}

impl Default for LayerTable {
    fn default() -> Self {
        let mut table = Self { names: Vec::new(), lookup: HashMap::new() };
        table.names.push(DEFAULT_LAYER.to_string());
        table.lookup.insert(DEFAULT_LAYER.to_string(), 0);
        table
    }
}

impl LayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index for `name`, registering it if needed.
    /// `None` once all layers are taken.
    pub fn register(&mut self, name: &str) -> Option<u8> {
        if let Some(idx) = self.lookup.get(name) {
            return Some(*idx);
        }
        if self.names.len() >= MAX_LAYERS {
            return None;
        }
        let idx = self.names.len() as u8;
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), idx);
        Some(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<u8> {
        self.lookup.get(name).copied()
    }

    pub fn name_of(&self, layer: u8) -> Option<&str> {
        self.names.get(layer as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Parses `all`, `none`, or a comma separated list of layer names.
    pub fn parse_mask(&self, value: &str) -> Result<RayMask, String> {
        match value.trim() {
            "all" | "" => return Ok(RayMask::ALL),
            "none" => return Ok(RayMask::NONE),
            _ => {}
        }

        let mut mask = RayMask::NONE;
        for name in value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
            let layer = self.index_of(name)
                .ok_or_else(|| format!("unknown layer: {}", name))?;
            mask |= RayMask::from_layer(layer);
        }
        Ok(mask)
    }
}
