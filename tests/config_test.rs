use std::fs;

use termrast::core::RenderConfig;
use termrast::types::Rgb;
use termrast::ViewerConfig;

#[test]
fn empty_document_is_the_default() {
    let cfg = ViewerConfig::from_json("{}").unwrap();
    assert_eq!(cfg, ViewerConfig::default());
    assert_eq!(cfg.fps, 30);
    assert_eq!(cfg.render, RenderConfig::default());
}

#[test]
fn nested_fields_override_individually() {
    let cfg = ViewerConfig::from_json(
        r#"{
            "render": {
                "width": 120,
                "clear_back": { "r": 0, "g": 0, "b": 40 },
                "capacities": { "primitives": 4096 }
            },
            "style": { "back": 4 }
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.render.width, 120);
    assert_eq!(cfg.render.height, 24);
    assert_eq!(cfg.render.clear_back, Rgb::new(0, 0, 40));
    assert_eq!(cfg.render.capacities.primitives, 4096);
    assert_eq!(cfg.render.capacities.nodes, 1024);
    assert_eq!(cfg.style.back, 4);
    assert_eq!(cfg.style.front, 6);
}

#[test]
fn serialized_config_reads_back() {
    let mut cfg = ViewerConfig::default();
    cfg.fps = 12;
    cfg.render = cfg.render.with_parallel(true).with_clear_depth(50.0);
    let json = cfg.to_json().unwrap();
    assert_eq!(ViewerConfig::from_json(&json).unwrap(), cfg);
}

#[test]
fn bad_input_is_an_error() {
    assert!(ViewerConfig::from_json(r#"{ "fps": "fast" }"#).is_err());

    let missing = std::env::temp_dir().join("termrast-config-test-missing.json");
    let _ = fs::remove_file(&missing);
    let err = ViewerConfig::load(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("reading config"));
}

#[test]
fn load_reads_a_file() {
    let path = std::env::temp_dir().join(format!("termrast-config-test-{}.json", std::process::id()));
    fs::write(&path, r#"{ "fps": 24 }"#).unwrap();
    let cfg = ViewerConfig::load(&path).unwrap();
    let _ = fs::remove_file(&path);
    assert_eq!(cfg.fps, 24);
}
