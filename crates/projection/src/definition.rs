//! Projection definitions attached to radar objects.
//!
//! The actual map projection arithmetic is done by an external library; the
//! radar data model only carries an identifier, a description and a
//! PROJ.4 style definition string such as
//! `+proj=latlong +ellps=WGS84 +datum=WGS84`.

use std::collections::BTreeMap;

use radar_common::{ObjectType, RadarError, RadarObject, RadarResult};
use tracing::debug;

/// Definition used when nothing else has been configured.
pub const LONLAT_DEFINITION: &str = "+proj=latlong +ellps=WGS84 +datum=WGS84";

/// A named projection definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    id: String,
    description: String,
    definition: String,
}

impl RadarObject for Projection {
    const TYPE: ObjectType = ObjectType::new("Projection");

    fn clone_object(&self) -> Self {
        self.clone()
    }
}

impl Projection {
    /// Create a projection definition.
    ///
    /// Fails when `id` is empty or `definition` is not a sequence of
    /// `+key[=value]` tokens containing `+proj`.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        definition: impl Into<String>,
    ) -> RadarResult<Self> {
        let id = id.into();
        let definition = definition.into();
        if id.trim().is_empty() {
            return Err(RadarError::InvalidProjection("empty projection id".to_string()));
        }
        let params = parse_definition(&definition)?;
        if !params.contains_key("proj") {
            return Err(RadarError::InvalidProjection(format!(
                "'{}' has no +proj parameter",
                definition
            )));
        }
        debug!(id = %id, definition = %definition, "Created projection");
        Ok(Self {
            id,
            description: description.into(),
            definition,
        })
    }

    /// Geographic longitude/latitude on WGS84.
    pub fn lonlat() -> Self {
        Self {
            id: "lonlat".to_string(),
            description: "lonlat".to_string(),
            definition: LONLAT_DEFINITION.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Parameters of the definition, e.g. `proj -> latlong`.
    ///
    /// Flags without a value map to an empty string.
    pub fn parameters(&self) -> BTreeMap<String, String> {
        // Validated at construction.
        parse_definition(&self.definition).unwrap_or_default()
    }

    pub fn is_lonlat(&self) -> bool {
        matches!(
            self.parameters().get("proj").map(String::as_str),
            Some("latlong") | Some("longlat") | Some("lonlat") | Some("latlon")
        )
    }
}

fn parse_definition(definition: &str) -> RadarResult<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    for token in definition.split_whitespace() {
        let body = token.strip_prefix('+').ok_or_else(|| {
            RadarError::InvalidProjection(format!("token '{}' does not start with '+'", token))
        })?;
        let (key, value) = body.split_once('=').unwrap_or((body, ""));
        if key.is_empty() {
            return Err(RadarError::InvalidProjection(format!("empty key in '{}'", token)));
        }
        params.insert(key.to_string(), value.to_string());
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lonlat_default() {
        let proj = Projection::lonlat();
        assert_eq!(proj.id(), "lonlat");
        assert!(proj.is_lonlat());
        assert_eq!(proj.parameters().get("ellps").map(String::as_str), Some("WGS84"));
    }

    #[test]
    fn test_new_validates_definition() {
        let proj = Projection::new(
            "swegrid",
            "Swedish grid",
            "+proj=tmerc +lat_0=0 +lon_0=15.808 +k=1 +x_0=1500000 +no_defs",
        )
        .unwrap();
        assert!(!proj.is_lonlat());
        assert_eq!(proj.parameters().get("no_defs").map(String::as_str), Some(""));

        assert!(Projection::new("", "x", LONLAT_DEFINITION).is_err());
        assert!(Projection::new("x", "x", "proj=latlong").is_err());
        assert!(Projection::new("x", "x", "+ellps=WGS84").is_err());
        assert!(Projection::new("x", "x", "+=3 +proj=latlong").is_err());
    }
}
