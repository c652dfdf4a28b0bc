//! Attribute value codecs.
//!
//! Each codec converts between the raw attribute string and a typed Rust value.
//! Decoding errors carry a short reason; the attribute descriptors in
//! [`xmlchemy`](super::xmlchemy) turn them into `InvalidAttributeValue` errors
//! naming the offending attribute.

use crate::common::unit::Length;

/// A schema simple type: a codec between attribute text and `Self::Value`.
pub trait SimpleType {
    type Value: Clone + PartialEq;

    fn convert_from_xml(raw: &str) -> Result<Self::Value, String>;

    fn convert_to_xml(value: &Self::Value) -> String;

    /// Range/format checks applied before a value is written.
    fn validate(_value: &Self::Value) -> Result<(), String> {
        Ok(())
    }

    fn to_xml(value: &Self::Value) -> Result<String, String> {
        Self::validate(value)?;
        Ok(Self::convert_to_xml(value))
    }

    fn from_xml(raw: &str) -> Result<Self::Value, String> {
        let value = Self::convert_from_xml(raw)?;
        Self::validate(&value)?;
        Ok(value)
    }
}

fn parse_i64(raw: &str) -> Result<i64, String> {
    atoi_simd::parse::<i64, false, false>(raw.trim().as_bytes())
        .map_err(|_| format!("expected an integer, got {:?}", raw))
}

fn parse_i32(raw: &str) -> Result<i32, String> {
    atoi_simd::parse::<i32, false, false>(raw.trim().as_bytes())
        .map_err(|_| format!("expected a 32-bit integer, got {:?}", raw))
}

fn parse_u32(raw: &str) -> Result<u32, String> {
    atoi_simd::parse::<u32, false, false>(raw.trim().as_bytes())
        .map_err(|_| format!("expected an unsigned integer, got {:?}", raw))
}

fn check_range(value: i64, min: i64, max: i64) -> Result<(), String> {
    if value < min || value > max {
        return Err(format!(
            "value must be in range {} to {} inclusive, got {}",
            min, max, value
        ));
    }
    Ok(())
}

/// `xsd:boolean`, written as `1`/`0`.
pub struct XsdBoolean;

impl SimpleType for XsdBoolean {
    type Value = bool;

    fn convert_from_xml(raw: &str) -> Result<bool, String> {
        match raw {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(format!("expected xsd:boolean, got {:?}", raw)),
        }
    }

    fn convert_to_xml(value: &bool) -> String {
        if *value { "1" } else { "0" }.to_string()
    }
}

/// `xsd:int`
pub struct XsdInt;

impl SimpleType for XsdInt {
    type Value = i32;

    fn convert_from_xml(raw: &str) -> Result<i32, String> {
        parse_i32(raw)
    }

    fn convert_to_xml(value: &i32) -> String {
        itoa::Buffer::new().format(*value).to_string()
    }
}

/// `xsd:long`
pub struct XsdLong;

impl SimpleType for XsdLong {
    type Value = i64;

    fn convert_from_xml(raw: &str) -> Result<i64, String> {
        parse_i64(raw)
    }

    fn convert_to_xml(value: &i64) -> String {
        itoa::Buffer::new().format(*value).to_string()
    }
}

/// `xsd:unsignedInt`
pub struct XsdUnsignedInt;

impl SimpleType for XsdUnsignedInt {
    type Value = u32;

    fn convert_from_xml(raw: &str) -> Result<u32, String> {
        parse_u32(raw)
    }

    fn convert_to_xml(value: &u32) -> String {
        itoa::Buffer::new().format(*value).to_string()
    }
}

/// `xsd:string`, passed through untouched.
pub struct XsdString;

impl SimpleType for XsdString {
    type Value = String;

    fn convert_from_xml(raw: &str) -> Result<String, String> {
        Ok(raw.to_string())
    }

    fn convert_to_xml(value: &String) -> String {
        value.clone()
    }
}

/// `ST_RelationshipId`, a non-empty token such as `rId7`.
pub struct StRelationshipId;

impl SimpleType for StRelationshipId {
    type Value = String;

    fn convert_from_xml(raw: &str) -> Result<String, String> {
        Ok(raw.to_string())
    }

    fn convert_to_xml(value: &String) -> String {
        value.clone()
    }

    fn validate(value: &String) -> Result<(), String> {
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return Err(format!("expected a relationship id token, got {:?}", value));
        }
        Ok(())
    }
}

/// `ST_Coordinate`: a signed EMU offset.
pub struct StCoordinate;

impl SimpleType for StCoordinate {
    type Value = Length;

    fn convert_from_xml(raw: &str) -> Result<Length, String> {
        parse_i64(raw).map(Length::from_emus)
    }

    fn convert_to_xml(value: &Length) -> String {
        itoa::Buffer::new().format(value.emus()).to_string()
    }

    fn validate(value: &Length) -> Result<(), String> {
        check_range(value.emus(), -27_273_042_329_600, 27_273_042_316_900)
    }
}

/// `ST_PositiveCoordinate`: a non-negative EMU extent.
pub struct StPositiveCoordinate;

impl SimpleType for StPositiveCoordinate {
    type Value = Length;

    fn convert_from_xml(raw: &str) -> Result<Length, String> {
        parse_i64(raw).map(Length::from_emus)
    }

    fn convert_to_xml(value: &Length) -> String {
        itoa::Buffer::new().format(value.emus()).to_string()
    }

    fn validate(value: &Length) -> Result<(), String> {
        check_range(value.emus(), 0, 27_273_042_316_900)
    }
}

/// `ST_DrawingElementId`
pub struct StDrawingElementId;

impl SimpleType for StDrawingElementId {
    type Value = u32;

    fn convert_from_xml(raw: &str) -> Result<u32, String> {
        parse_u32(raw)
    }

    fn convert_to_xml(value: &u32) -> String {
        itoa::Buffer::new().format(*value).to_string()
    }
}

/// `ST_OnOff` as used by WordprocessingML: accepts `on`/`off` as well.
pub struct StOnOff;

impl SimpleType for StOnOff {
    type Value = bool;

    fn convert_from_xml(raw: &str) -> Result<bool, String> {
        match raw {
            "1" | "true" | "on" => Ok(true),
            "0" | "false" | "off" => Ok(false),
            _ => Err(format!("expected ST_OnOff, got {:?}", raw)),
        }
    }

    fn convert_to_xml(value: &bool) -> String {
        XsdBoolean::convert_to_xml(value)
    }
}

/// Preset geometry tokens (`ST_ShapeType`) for `a:prstGeom/@prst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetGeometry {
    Rectangle,
    RoundRectangle,
    Ellipse,
    Triangle,
    RightTriangle,
    Parallelogram,
    Trapezoid,
    Diamond,
    Pentagon,
    Hexagon,
    Octagon,
    Star5,
    Star6,
    RightArrow,
    LeftArrow,
    UpArrow,
    DownArrow,
    Line,
}

impl PresetGeometry {
    const TOKENS: [(PresetGeometry, &'static str); 18] = [
        (Self::Rectangle, "rect"),
        (Self::RoundRectangle, "roundRect"),
        (Self::Ellipse, "ellipse"),
        (Self::Triangle, "triangle"),
        (Self::RightTriangle, "rtTriangle"),
        (Self::Parallelogram, "parallelogram"),
        (Self::Trapezoid, "trapezoid"),
        (Self::Diamond, "diamond"),
        (Self::Pentagon, "pentagon"),
        (Self::Hexagon, "hexagon"),
        (Self::Octagon, "octagon"),
        (Self::Star5, "star5"),
        (Self::Star6, "star6"),
        (Self::RightArrow, "rightArrow"),
        (Self::LeftArrow, "leftArrow"),
        (Self::UpArrow, "upArrow"),
        (Self::DownArrow, "downArrow"),
        (Self::Line, "line"),
    ];

    /// The canonical token for this preset.
    pub fn token(&self) -> &'static str {
        Self::TOKENS
            .iter()
            .find(|(preset, _)| preset == self)
            .map(|(_, token)| *token)
            .unwrap_or("rect")
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::TOKENS
            .iter()
            .find(|(_, t)| *t == token)
            .map(|(preset, _)| *preset)
    }
}

/// `ST_ShapeType`
pub struct StShapeType;

impl SimpleType for StShapeType {
    type Value = PresetGeometry;

    fn convert_from_xml(raw: &str) -> Result<PresetGeometry, String> {
        PresetGeometry::from_token(raw)
            .ok_or_else(|| format!("unknown preset geometry {:?}", raw))
    }

    fn convert_to_xml(value: &PresetGeometry) -> String {
        value.token().to_string()
    }
}
