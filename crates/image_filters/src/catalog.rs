use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr, VariantNames};
use tracing::{debug, warn};

use crate::{
    error::{FilterError, Result},
    filters::{
        GaussianBlurFilter, GrayscaleFilter, InvertFilter, Kernel3x3, SepiaFilter,
        SolarizeFilter,
    },
    traits::ImageFilter,
};

#[derive(
    Debug, Clone, Copy,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq, Hash, PartialOrd, Ord
)]
#[strum(serialize_all = "snake_case")]
pub enum FilterKind {
    Grayscale,
    Sepia,
    Blur,
    Sharpen,
    EdgeDetection,
    Invert,
    Emboss,
    Contour,
    Smooth,
    Solarize,
}

/// Typed parameter value (also used for defaults)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
}

impl ParamValue {
    /// Coerce a caller-supplied JSON value to the same type as `self`
    fn coerce(&self, value: &Value) -> Option<Self> {
        match self {
            Self::Float(_) => match value {
                Value::Number(n) => n.as_f64().map(Self::Float),
                Value::String(s) => s.trim().parse().ok().map(Self::Float),
                _ => None,
            },
            Self::Int(_) => match value {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
                    .map(Self::Int),
                Value::String(s) => s.trim().parse().ok().map(Self::Int),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub default: ParamValue,
    pub description: &'static str,
}

const BLUR_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "radius",
    type_name: "float",
    default: ParamValue::Float(2.0),
    description: "Gaussian blur radius (standard deviation in pixels)",
}];

const SOLARIZE_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "threshold",
    type_name: "int",
    default: ParamValue::Int(128),
    description: "Channel values at or above this threshold are inverted",
}];

impl FilterKind {
    /// Get a list of all filter names
    pub fn names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Grayscale => "Convert the image to grayscale (kept as 3-channel RGB)",
            Self::Sepia => "Apply a vintage sepia tone",
            Self::Blur => "Blur the image with a Gaussian filter",
            Self::Sharpen => "Sharpen the image to enhance details",
            Self::EdgeDetection => "Detect edges in the image",
            Self::Invert => "Invert the colors of the image",
            Self::Emboss => "Apply an emboss effect",
            Self::Contour => "Trace contours in the image",
            Self::Smooth => "Smooth the image",
            Self::Solarize => "Invert channel values at or above a threshold",
        }
    }

    /// Recognized optional parameters for this filter
    pub fn parameters(&self) -> &'static [ParamSpec] {
        match self {
            Self::Blur => BLUR_PARAMS,
            Self::Solarize => SOLARIZE_PARAMS,
            _ => &[],
        }
    }

    /// Keep only the recognized parameters, falling back to defaults for unusable values
    pub fn select_params(&self, extra: &Map<String, Value>) -> FilterParams {
        let mut values = BTreeMap::new();
        for spec in self.parameters() {
            let value = match extra.get(spec.name) {
                None | Some(Value::Null) => spec.default,
                Some(raw) => spec.default.coerce(raw).unwrap_or_else(|| {
                    warn!(
                        "Ignoring {} value {} for '{}', using default {:?}",
                        spec.type_name, raw, spec.name, spec.default
                    );
                    spec.default
                }),
            };
            values.insert(spec.name, value);
        }

        for name in extra.keys() {
            if !values.contains_key(name.as_str()) {
                debug!("Dropping unrecognized parameter '{}' for {} filter", name, self);
            }
        }

        FilterParams { values }
    }

    /// Build the filter for the selected parameters
    pub fn build(&self, params: &FilterParams) -> Box<dyn ImageFilter> {
        match self {
            Self::Grayscale => Box::new(GrayscaleFilter),
            Self::Sepia => Box::new(SepiaFilter),
            Self::Blur => Box::new(GaussianBlurFilter {
                radius: params.float("radius").unwrap_or(2.0) as f32,
            }),
            Self::Sharpen => Box::new(Kernel3x3::SHARPEN),
            Self::EdgeDetection => Box::new(Kernel3x3::FIND_EDGES),
            Self::Invert => Box::new(InvertFilter),
            Self::Emboss => Box::new(Kernel3x3::EMBOSS),
            Self::Contour => Box::new(Kernel3x3::CONTOUR),
            Self::Smooth => Box::new(Kernel3x3::SMOOTH),
            Self::Solarize => Box::new(SolarizeFilter {
                threshold: params.int("threshold").unwrap_or(128),
            }),
        }
    }

    pub fn descriptor(&self) -> FilterDescriptor {
        FilterDescriptor {
            name: self.name(),
            description: self.description(),
            parameters: self.parameters(),
        }
    }
}

/// Parameters that survived selection, keyed by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    values: BTreeMap<&'static str, ParamValue>,
}

impl FilterParams {
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            ParamValue::Float(v) => Some(v),
            ParamValue::Int(v) => Some(v as f64),
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            ParamValue::Int(v) => Some(v),
            ParamValue::Float(v) => Some(v as i64),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [ParamSpec],
}

/// Immutable name -> descriptor table, built once at startup
#[derive(Debug, Clone)]
pub struct FilterCatalog {
    descriptors: BTreeMap<&'static str, (FilterKind, FilterDescriptor)>,
}

impl FilterCatalog {
    pub fn new() -> Self {
        let descriptors = FilterKind::iter()
            .map(|kind| (kind.name(), (kind, kind.descriptor())))
            .collect();
        Self { descriptors }
    }

    pub fn lookup(&self, name: &str) -> Result<FilterKind> {
        self.descriptors
            .get(name)
            .map(|(kind, _)| *kind)
            .ok_or_else(|| FilterError::UnknownFilter(name.to_string()))
    }

    pub fn descriptor(&self, kind: FilterKind) -> Option<&FilterDescriptor> {
        self.descriptors.get(kind.name()).map(|(_, descriptor)| descriptor)
    }

    /// Descriptors in catalog (declaration) order
    pub fn descriptors(&self) -> Vec<&FilterDescriptor> {
        FilterKind::iter()
            .filter_map(|kind| self.descriptor(kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.descriptors())?)
    }
}

impl Default for FilterCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use serde_json::json;
    use std::str::FromStr;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_catalog_names_match_tools() {
        assert_eq!(
            FilterKind::names(),
            &[
                "grayscale", "sepia", "blur", "sharpen", "edge_detection",
                "invert", "emboss", "contour", "smooth", "solarize",
            ]
        );
        let catalog = FilterCatalog::new();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.lookup("edge_detection").unwrap(), FilterKind::EdgeDetection);
        assert!(matches!(catalog.lookup("posterize"), Err(FilterError::UnknownFilter(_))));
        assert_eq!(FilterKind::from_str("solarize").unwrap(), FilterKind::Solarize);
    }

    #[test]
    fn test_parameter_table() {
        let blur = FilterKind::Blur.parameters();
        assert_eq!(blur.len(), 1);
        assert_eq!(blur[0].name, "radius");
        assert_eq!(blur[0].default, ParamValue::Float(2.0));
        assert_eq!(FilterKind::Solarize.parameters()[0].default, ParamValue::Int(128));
        assert!(FilterKind::Sharpen.parameters().is_empty());
    }

    #[test]
    fn test_unrecognized_params_dropped() {
        let selected = FilterKind::Blur.select_params(&params(json!({
            "radius": 5.0,
            "strength": 3,
            "image_path": "/tmp/x.png",
        })));
        assert_eq!(selected.names().collect::<Vec<_>>(), vec!["radius"]);
        assert_eq!(selected.float("radius"), Some(5.0));

        let none = FilterKind::Invert.select_params(&params(json!({ "radius": 5.0 })));
        assert!(none.is_empty());
    }

    #[test]
    fn test_defaults_and_coercion() {
        let defaulted = FilterKind::Solarize.select_params(&Map::new());
        assert_eq!(defaulted.int("threshold"), Some(128));

        let from_string = FilterKind::Solarize.select_params(&params(json!({ "threshold": "100" })));
        assert_eq!(from_string.int("threshold"), Some(100));

        let from_float = FilterKind::Solarize.select_params(&params(json!({ "threshold": 99.0 })));
        assert_eq!(from_float.int("threshold"), Some(99));

        let int_radius = FilterKind::Blur.select_params(&params(json!({ "radius": 4 })));
        assert_eq!(int_radius.float("radius"), Some(4.0));

        let bogus = FilterKind::Blur.select_params(&params(json!({ "radius": [1, 2] })));
        assert_eq!(bogus.float("radius"), Some(2.0));
    }

    #[test]
    fn test_every_filter_yields_rgb_of_same_size() {
        let image = crate::test_image::gradient(40, 30);
        for kind in FilterKind::iter() {
            let filter = kind.build(&kind.select_params(&Map::new()));
            let result = filter.apply(&image).unwrap_or_else(|e| panic!("{kind} failed: {e}"));
            assert_eq!(result.dimensions(), (40, 30), "{kind}");
        }
    }

    #[test]
    fn test_build_uses_selected_params() {
        let red = RgbImage::from_pixel(8, 8, Rgb([255, 0, 0]));
        let high = FilterKind::Solarize.select_params(&params(json!({ "threshold": 300 })));
        let result = FilterKind::Solarize.build(&high).apply(&red).unwrap();
        assert_eq!(*result.get_pixel(0, 0), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_catalog_json() {
        let json: Value = serde_json::from_str(&FilterCatalog::new().to_json().unwrap()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[2]["name"], "blur");
        assert_eq!(entries[2]["parameters"][0]["default"], json!(2.0));
        assert_eq!(entries[9]["parameters"][0]["type"], "int");
    }
}
