//! Integration tests for the Parameters collection

use resonator::parameters::{Parameter, ParameterError, Parameters};

fn resonator_parameters() -> Parameters {
    let mut params = Parameters::new();
    params
        .add_param_with_bounds("resonance_frequency", 5e9, 4.9e9, 5.1e9)
        .unwrap();
    params
        .add_param_with_bounds("internal_loss", 2e-5, 1e-12, 1.0)
        .unwrap();
    params
        .add_param_with_bounds("coupling_loss", 5e-5, 1e-12, 1.0)
        .unwrap();
    params.add_param("background_phase", 0.5).unwrap();
    params
}

#[test]
fn test_parameters_basic_operations() {
    let mut params = Parameters::new();
    assert_eq!(params.len(), 0);
    assert!(params.is_empty());

    params.add(Parameter::new("asymmetry", 0.1)).unwrap();
    params.add_param("kxin", 0.0).unwrap();
    params
        .add_param_with_bounds("coupling_loss", 5e-5, 1e-12, 1.0)
        .unwrap();

    assert_eq!(params.len(), 3);
    assert!(params.contains("kxin"));
    assert!(params.get("quality").is_none());
    assert_eq!(params.names(), vec!["asymmetry", "kxin", "coupling_loss"]);

    params.get_mut("kxin").unwrap().set_value(1e-9).unwrap();
    assert_eq!(params.value("kxin").unwrap(), 1e-9);

    assert!(matches!(
        params.value("quality"),
        Err(ParameterError::ParameterNotFound { .. })
    ));
    assert!(matches!(
        params.add_param("kxin", 0.0),
        Err(ParameterError::DuplicateParameter { .. })
    ));
}

#[test]
fn test_extend_keeps_order_and_rejects_clashes() {
    let mut params = resonator_parameters();
    let mut background = Parameters::new();
    background.add_param("background_magnitude", 0.7).unwrap();
    params.extend(background).unwrap();
    assert_eq!(params.names().last().unwrap(), "background_magnitude");

    let mut clash = Parameters::new();
    clash.add_param("internal_loss", 1e-5).unwrap();
    assert!(params.extend(clash).is_err());
}

#[test]
fn test_parameters_varying_fixed() {
    let mut params = resonator_parameters();
    assert_eq!(params.varying_count(), 4);

    params.get_mut("background_phase").unwrap().set_vary(false);
    let varying = params.varying();
    assert_eq!(varying.len(), 3);
    assert!(varying.iter().all(|p| p.name() != "background_phase"));

    // only varying parameters take part in the internal vector
    let internal = params.varying_internal_values().unwrap();
    assert_eq!(internal.len(), 3);
    assert!(params.update_from_internal(&[0.0; 4]).is_err());

    params.update_from_internal(&internal).unwrap();
    assert!((params.value("internal_loss").unwrap() - 2e-5).abs() < 1e-15);
    assert_eq!(params.value("background_phase").unwrap(), 0.5);
}

#[test]
fn test_parameters_reset() {
    let mut params = resonator_parameters();
    params
        .get_mut("internal_loss")
        .unwrap()
        .set_value(3e-5)
        .unwrap();
    params.get_mut("internal_loss").unwrap().set_stderr(Some(1e-7));

    params.reset();
    assert_eq!(params.value("internal_loss").unwrap(), 2e-5);
    assert!(params.get("internal_loss").unwrap().stderr().is_none());
}

#[test]
fn test_internal_values_always_map_into_bounds() {
    let mut params = resonator_parameters();
    params.get_mut("background_phase").unwrap().set_vary(false);

    for &internal in &[-10.0, -1.0, 0.0, 1.0, 10.0] {
        params
            .update_from_internal(&[internal, internal, internal])
            .unwrap();
        let fr = params.value("resonance_frequency").unwrap();
        let li = params.value("internal_loss").unwrap();
        assert!((4.9e9..=5.1e9).contains(&fr));
        assert!((1e-12..=1.0).contains(&li));
    }
}

#[test]
fn test_json_round_trip() {
    let mut params = resonator_parameters();
    params.get_mut("background_phase").unwrap().set_vary(false);
    params.get_mut("coupling_loss").unwrap().set_stderr(Some(2e-8));

    let json = params.to_json().unwrap();
    let restored = Parameters::from_json(&json).unwrap();

    assert_eq!(restored.names(), params.names());
    for (a, b) in restored.iter().zip(params.iter()) {
        assert_eq!(a.value(), b.value());
        assert_eq!(a.min(), b.min());
        assert_eq!(a.max(), b.max());
        assert_eq!(a.vary(), b.vary());
        assert_eq!(a.stderr(), b.stderr());
    }
    // the open bounds of the phase survive as nulls
    assert_eq!(restored.get("background_phase").unwrap().min(), f64::NEG_INFINITY);
}
