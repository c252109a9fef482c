//! Canonical cable design model.
//!
//! The seven canonical fields are the only vocabulary shared between the
//! normalizer, the prompt, the reasoning engine's answer and the caller.
//! Enumerated fields recognise their canonical codes exactly and keep any
//! other token verbatim, so nothing upstream of the engine reinterprets input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a stored design record.
pub type DesignId = i64;

/// The seven canonical field names, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Standard,
    Voltage,
    ConductorMaterial,
    ConductorClass,
    Csa,
    InsulationMaterial,
    InsulationThickness,
}

impl FieldName {
    pub const ALL: [FieldName; 7] = [
        FieldName::Standard,
        FieldName::Voltage,
        FieldName::ConductorMaterial,
        FieldName::ConductorClass,
        FieldName::Csa,
        FieldName::InsulationMaterial,
        FieldName::InsulationThickness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Standard => "standard",
            FieldName::Voltage => "voltage",
            FieldName::ConductorMaterial => "conductor_material",
            FieldName::ConductorClass => "conductor_class",
            FieldName::Csa => "csa",
            FieldName::InsulationMaterial => "insulation_material",
            FieldName::InsulationThickness => "insulation_thickness",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = String;

    /// Exact match only. Anything else is returned as the error value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Defines an enumerated field with canonical codes and a verbatim fallback.
macro_rules! coded_field {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $code:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// Any token that is not a canonical code, kept as supplied
            Other(String),
        }

        impl $name {
            pub fn code(&self) -> &str {
                match self {
                    $($name::$variant => $code,)+
                    $name::Other(raw) => raw.as_str(),
                }
            }

            pub fn is_canonical(&self) -> bool {
                !matches!(self, $name::Other(_))
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                match raw.as_str() {
                    $($code => $name::$variant,)+
                    _ => $name::Other(raw),
                }
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                $name::from(raw.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(raw) => raw,
                    other => other.code().to_string(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

coded_field! {
    /// Standard the design claims conformance with
    Standard {
        Iec60502_1 => "IEC 60502-1",
        Iec60228 => "IEC 60228",
    }
}

coded_field! {
    /// Conductor material code
    ConductorMaterial {
        Copper => "Cu",
        Aluminium => "Al",
    }
}

coded_field! {
    /// IEC 60228 stranding class
    ConductorClass {
        Class1 => "Class 1",
        Class2 => "Class 2",
        Class5 => "Class 5",
        Class6 => "Class 6",
    }
}

coded_field! {
    /// Insulation compound
    InsulationMaterial {
        Pvc => "PVC",
        Xlpe => "XLPE",
        Epr => "EPR",
    }
}

/// The seven canonical design fields. Every field is optional: partial
/// designs and free-text requests are legal, and an absent field is a
/// MISSING state the reasoning engine has to flag itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DesignFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<Standard>,
    /// Rated voltage, e.g. "0.6/1 kV"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conductor_material: Option<ConductorMaterial>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conductor_class: Option<ConductorClass>,
    /// Cross-sectional area in mm²
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulation_material: Option<InsulationMaterial>,
    /// Insulation thickness in mm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulation_thickness: Option<f64>,
}

impl DesignFields {
    /// Names of the fields that carry a value, in canonical order.
    pub fn present_fields(&self) -> Vec<FieldName> {
        FieldName::ALL
            .iter()
            .copied()
            .filter(|name| self.is_present(*name))
            .collect()
    }

    pub fn is_present(&self, name: FieldName) -> bool {
        self.display_value(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }

    /// String form of a field's value, as it would be quoted back to a user.
    pub fn display_value(&self, name: FieldName) -> Option<String> {
        match name {
            FieldName::Standard => self.standard.as_ref().map(|v| v.to_string()),
            FieldName::Voltage => self.voltage.clone(),
            FieldName::ConductorMaterial => self.conductor_material.as_ref().map(|v| v.to_string()),
            FieldName::ConductorClass => self.conductor_class.as_ref().map(|v| v.to_string()),
            FieldName::Csa => self.csa.map(|v| v.to_string()),
            FieldName::InsulationMaterial => {
                self.insulation_material.as_ref().map(|v| v.to_string())
            }
            FieldName::InsulationThickness => self.insulation_thickness.map(|v| v.to_string()),
        }
    }
}

/// Which input mode produced a design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Structured,
    FreeText,
    Database,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Structured => write!(f, "structured"),
            Provenance::FreeText => write!(f, "free_text"),
            Provenance::Database => write!(f, "database"),
        }
    }
}

/// Normalized design plus the input mode it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDesign {
    pub fields: DesignFields,
    pub provenance: Provenance,
}

impl CanonicalDesign {
    pub fn new(fields: DesignFields, provenance: Provenance) -> Self {
        Self { fields, provenance }
    }
}
