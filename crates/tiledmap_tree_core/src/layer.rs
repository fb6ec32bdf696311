//! Layer model of a map.

use tiledmap_tree_assets::LayerFormat;
use tiledmap_tree_assets::assets::map::{LayerDocument, ObjectDocument, Properties};

/// One layer of a map, bottom to top in the map's layer list.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// Grid of tile GIDs
    Tiles(TileLayer),
    /// Container of placed objects
    Objects(ObjectLayer),
}

impl Layer {
    pub fn name(&self) -> &str {
        match self {
            Layer::Tiles(layer) => &layer.name,
            Layer::Objects(layer) => &layer.name,
        }
    }

    pub fn properties(&self) -> &Properties {
        match self {
            Layer::Tiles(layer) => &layer.properties,
            Layer::Objects(layer) => &layer.properties,
        }
    }

    #[inline]
    pub fn is_object_container(&self) -> bool {
        matches!(self, Layer::Objects(_))
    }

    pub fn as_tiles(&self) -> Option<&TileLayer> {
        match self {
            Layer::Tiles(layer) => Some(layer),
            Layer::Objects(_) => None,
        }
    }

    pub fn as_objects(&self) -> Option<&ObjectLayer> {
        match self {
            Layer::Objects(layer) => Some(layer),
            Layer::Tiles(_) => None,
        }
    }

    pub(crate) fn from_document(document: LayerDocument) -> Self {
        match document {
            LayerDocument::Tiles {
                name,
                width,
                height,
                format,
                tiles,
                properties,
            } => Layer::Tiles(TileLayer {
                name,
                width,
                height,
                format: Some(format),
                tiles,
                properties,
            }),
            LayerDocument::Objects {
                name,
                objects,
                properties,
            } => Layer::Objects(ObjectLayer {
                name,
                objects: objects.into_iter().map(MapObject::from).collect(),
                properties,
            }),
        }
    }

    /// `fallback` is used for a tile layer that never had a format assigned.
    pub(crate) fn to_document(&self, fallback: LayerFormat) -> LayerDocument {
        match self {
            Layer::Tiles(layer) => LayerDocument::Tiles {
                name: layer.name.clone(),
                width: layer.width,
                height: layer.height,
                format: layer.format.unwrap_or(fallback),
                tiles: layer.tiles.clone(),
                properties: layer.properties.clone(),
            },
            Layer::Objects(layer) => LayerDocument::Objects {
                name: layer.name.clone(),
                objects: layer.objects.iter().cloned().map(ObjectDocument::from).collect(),
                properties: layer.properties.clone(),
            },
        }
    }
}

/// A grid of tile GIDs, row-major, `0` meaning empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub name: String,
    /// Size in tiles; set from the map when the layer is created
    pub width: u32,
    pub height: u32,
    /// Payload encoding; `None` takes the map's default when the layer is added
    pub format: Option<LayerFormat>,
    pub tiles: Vec<u32>,
    pub properties: Properties,
}

impl TileLayer {
    /// An empty `width` x `height` grid.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            format: None,
            tiles: vec![0; width as usize * height as usize],
            properties: Properties::new(),
        }
    }

    pub fn with_format(mut self, format: LayerFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// GID at `(x, y)`, `None` outside the grid.
    pub fn tile(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get((y * self.width + x) as usize).copied()
    }
}

/// A layer holding placed objects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectLayer {
    pub name: String,
    pub objects: Vec<MapObject>,
    pub properties: Properties,
}

impl ObjectLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn object(&self, id: u32) -> Option<&MapObject> {
        self.objects.iter().find(|o| o.id == id)
    }
}

/// An object placed on an object layer.
///
/// An `id` of 0 means "not assigned yet": the map hands one out when the
/// object is added. An empty `name` is likewise filled in from the id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    /// Position in pixels
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Tile GID for tile objects, 0 otherwise
    pub gid: u32,
    pub properties: Properties,
}

impl MapObject {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl From<ObjectDocument> for MapObject {
    fn from(document: ObjectDocument) -> Self {
        Self {
            id: document.id,
            name: document.name,
            x: document.x,
            y: document.y,
            width: document.width,
            height: document.height,
            gid: document.gid,
            properties: document.properties,
        }
    }
}

impl From<MapObject> for ObjectDocument {
    fn from(object: MapObject) -> Self {
        Self {
            id: object.id,
            name: object.name,
            x: object.x,
            y: object.y,
            width: object.width,
            height: object.height,
            gid: object.gid,
            properties: object.properties,
        }
    }
}
