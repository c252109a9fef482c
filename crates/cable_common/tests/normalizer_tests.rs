//! Tests for input normalization.
//!
//! One mode in, one provenance-tagged design out. Free text is never
//! interpreted here.

use cable_common::{
    normalize, CanonicalDesign, ConductorClass, ConductorMaterial, DesignFields, DesignId,
    DesignInput, DesignLookup, FieldName, InputError, InputLimits, InsulationMaterial,
    LookupError, Provenance, Standard, ValidationRequest,
};
use std::collections::HashMap;

struct MapLookup {
    designs: HashMap<DesignId, DesignFields>,
}

impl MapLookup {
    fn empty() -> Self {
        Self {
            designs: HashMap::new(),
        }
    }

    fn with(id: DesignId, fields: DesignFields) -> Self {
        let mut designs = HashMap::new();
        designs.insert(id, fields);
        Self { designs }
    }
}

impl DesignLookup for MapLookup {
    fn lookup_design(&self, id: DesignId) -> Result<DesignFields, LookupError> {
        self.designs.get(&id).cloned().ok_or(LookupError::NotFound(id))
    }
}

struct BrokenLookup;

impl DesignLookup for BrokenLookup {
    fn lookup_design(&self, _id: DesignId) -> Result<DesignFields, LookupError> {
        Err(LookupError::Backend("database is locked".to_string()))
    }
}

fn full_design() -> DesignFields {
    DesignFields {
        standard: Some(Standard::Iec60502_1),
        voltage: Some("0.6/1 kV".to_string()),
        conductor_material: Some(ConductorMaterial::Copper),
        conductor_class: Some(ConductorClass::Class2),
        csa: Some(10.0),
        insulation_material: Some(InsulationMaterial::Pvc),
        insulation_thickness: Some(1.0),
    }
}

// === Structured mode ===

/// All seven fields survive unchanged in value and type
#[test]
fn test_structured_full_design_is_copied_unchanged() {
    let design = full_design();
    let normalized = normalize(
        DesignInput::Structured(design.clone()),
        &MapLookup::empty(),
        &InputLimits::default(),
    )
    .unwrap();

    assert_eq!(
        normalized.design,
        CanonicalDesign::new(design, Provenance::Structured)
    );
    assert_eq!(normalized.design.fields.present_fields(), FieldName::ALL.to_vec());
    assert!(normalized.free_text.is_none());
}

/// A design with no fields is a legal request, not an error
#[test]
fn test_structured_empty_design_is_legal() {
    let normalized = normalize(
        DesignInput::Structured(DesignFields::default()),
        &MapLookup::empty(),
        &InputLimits::default(),
    )
    .unwrap();

    assert!(normalized.design.fields.is_empty());
    assert_eq!(normalized.design.provenance, Provenance::Structured);
}

/// Non-canonical tokens pass through verbatim
#[test]
fn test_structured_keeps_unrecognised_tokens() {
    let design = DesignFields {
        conductor_material: Some(ConductorMaterial::from("copper")),
        insulation_material: Some(InsulationMaterial::from("PE")),
        ..Default::default()
    };
    let normalized = normalize(
        DesignInput::Structured(design),
        &MapLookup::empty(),
        &InputLimits::default(),
    )
    .unwrap();

    let fields = normalized.design.fields;
    assert_eq!(fields.display_value(FieldName::ConductorMaterial).as_deref(), Some("copper"));
    assert_eq!(fields.display_value(FieldName::InsulationMaterial).as_deref(), Some("PE"));
}

#[test]
fn test_structured_rejects_non_positive_numbers() {
    for bad in [0.0, -1.0, f64::NAN] {
        let design = DesignFields {
            insulation_thickness: Some(bad),
            ..Default::default()
        };
        let err = normalize(
            DesignInput::Structured(design),
            &MapLookup::empty(),
            &InputLimits::default(),
        )
        .unwrap_err();
        match err {
            InputError::InvalidValue { field, .. } => {
                assert_eq!(field, FieldName::InsulationThickness)
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}

// === Free-text mode ===

#[test]
fn test_free_text_passes_through_opaquely() {
    let normalized = normalize(
        DesignInput::FreeText("  10 sqmm copper cable \n".to_string()),
        &MapLookup::empty(),
        &InputLimits::default(),
    )
    .unwrap();

    assert_eq!(normalized.free_text.as_deref(), Some("10 sqmm copper cable"));
    assert_eq!(normalized.design.provenance, Provenance::FreeText);
    // No keyword extraction: "copper" and "10 sqmm" stay in the text only
    assert!(normalized.design.fields.is_empty());
}

#[test]
fn test_free_text_whitespace_only_is_empty() {
    for text in ["", "   ", "\n\t "] {
        let err = normalize(
            DesignInput::FreeText(text.to_string()),
            &MapLookup::empty(),
            &InputLimits::default(),
        )
        .unwrap_err();
        assert_eq!(err, InputError::Empty);
    }
}

#[test]
fn test_free_text_over_limit_is_rejected() {
    let limits = InputLimits {
        max_free_text_chars: 10,
    };
    let err = normalize(
        DesignInput::FreeText("a".repeat(11)),
        &MapLookup::empty(),
        &limits,
    )
    .unwrap_err();
    assert_eq!(err, InputError::TooLong { len: 11, max: 10 });

    assert!(normalize(
        DesignInput::FreeText("a".repeat(10)),
        &MapLookup::empty(),
        &limits
    )
    .is_ok());
}

// === Reference mode ===

#[test]
fn test_reference_copies_stored_record() {
    let stored = DesignFields {
        insulation_thickness: Some(0.9),
        ..full_design()
    };
    let normalized = normalize(
        DesignInput::ByReference(2),
        &MapLookup::with(2, stored.clone()),
        &InputLimits::default(),
    )
    .unwrap();

    assert_eq!(normalized.design.fields, stored);
    assert_eq!(normalized.design.provenance, Provenance::Database);
}

/// Missing records are an explicit error, never a default design
#[test]
fn test_reference_not_found_is_propagated() {
    let err = normalize(
        DesignInput::ByReference(99),
        &MapLookup::empty(),
        &InputLimits::default(),
    )
    .unwrap_err();
    assert_eq!(err, InputError::NotFound(99));
}

/// Ids below 1 are rejected before the store is consulted
#[test]
fn test_reference_non_positive_id_is_invalid() {
    for bad in [0, -5] {
        let err = normalize(
            DesignInput::ByReference(bad),
            &BrokenLookup,
            &InputLimits::default(),
        )
        .unwrap_err();
        assert_eq!(err, InputError::InvalidId(bad));
    }
}

#[test]
fn test_reference_backend_failure_is_storage_error() {
    let err = normalize(
        DesignInput::ByReference(1),
        &BrokenLookup,
        &InputLimits::default(),
    )
    .unwrap_err();
    assert_eq!(err, InputError::Storage("database is locked".to_string()));
}

// === Request resolution ===

#[test]
fn test_request_with_no_mode_is_empty() {
    assert_eq!(ValidationRequest::default().into_input(), Err(InputError::Empty));
}

#[test]
fn test_each_single_mode_is_honoured() {
    assert_eq!(
        ValidationRequest::structured(full_design()).into_input(),
        Ok(DesignInput::Structured(full_design()))
    );
    assert_eq!(
        ValidationRequest::free_text("10 sqmm").into_input(),
        Ok(DesignInput::FreeText("10 sqmm".to_string()))
    );
    assert_eq!(
        ValidationRequest::by_reference(7).into_input(),
        Ok(DesignInput::ByReference(7))
    );
}
