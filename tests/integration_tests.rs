use castep_input::{load_from_lines, load_from_path, CastepInput, CellInput, ParamInput, Value};
use nalgebra::{Matrix3, Vector3};
use std::path::PathBuf;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

#[test]
fn test_cell_and_positions_from_samples() {
    let cases = vec![
        (
            "cell_example_1.cell",
            Matrix3::from_diagonal(&Vector3::new(4.0, 4.0, 4.0)),
            vec![Vector3::new(1.0, 1.0, 1.0), Vector3::new(2.0, 2.0, 2.0)],
        ),
        (
            "cell_example_2.cell",
            Matrix3::from_diagonal(&Vector3::new(2.0, 2.0, 2.0)),
            vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0)],
        ),
    ];

    for (name, cell, positions) in cases {
        let input_path = data(name);
        assert!(input_path.exists(), "Test file not found: {:?}", input_path);

        let input: CellInput = load_from_path(&input_path).expect("Failed to parse cell file");
        assert_eq!(input.get_cell().unwrap(), Some(cell), "cell of {}", name);
        assert_eq!(input.get_positions().unwrap().coordinates, positions, "positions of {}", name);
    }
}

#[test]
fn test_sample_cell_keywords_and_tags() {
    let input = load_from_path(data("cell_example_1.cell")).unwrap();

    assert_eq!(input.get("kpoints_mp_grid"), Some(&Value::IntArray(vec![4, 4, 4])));
    assert_eq!(input.get("symmetry_generate"), Some(&Value::Str(String::new())));
    assert_eq!(input.get("fix_all_cell"), Some(&Value::Bool(true)));

    let positions = input.get_positions().unwrap();
    assert_eq!(positions.elements, ["O", "O"]);
    assert_eq!(positions.tags, ["SPIN=1", ""]);
}

#[test]
fn test_param_file_types() {
    let input: ParamInput = load_from_path(data("example.param")).unwrap();

    assert_eq!(input.get("task"), Some(&Value::Str("SinglePoint".into())));
    assert_eq!(input.get("cut_off_energy"), Some(&Value::Str("300 eV".into())));
    assert_eq!(input.get("opt_strategy"), Some(&Value::Str("speed".into())));
    assert_eq!(input.get("elec_energy_tol"), Some(&Value::Float(1e-6)));
    assert_eq!(input.get("spin_polarized"), Some(&Value::Bool(false)));
    assert_eq!(input.get("nextra_bands"), Some(&Value::Int(8)));
    assert_eq!(input.get("write_cell_structure"), Some(&Value::Str(String::new())));
    assert_eq!(
        input.keys().collect::<Vec<_>>(),
        [
            "task",
            "xc_functional",
            "cut_off_energy",
            "opt_strategy",
            "elec_energy_tol",
            "spin_polarized",
            "nextra_bands",
            "write_cell_structure",
        ]
    );
}

#[test]
fn test_plain_load_keeps_strings() {
    let input = CastepInput::from_file(data("example.param"), true).unwrap();
    assert_eq!(input.get("nextra_bands"), Some(&Value::Str("8".into())));
    assert!(input.iter().all(|(_, v)| matches!(v, Value::Str(_))));
}

#[test]
fn test_broken_block_is_a_format_error() {
    let err = load_from_path(data("broken.cell")).unwrap_err();
    assert!(err.is_format(), "unexpected error: {}", err);
}

#[test]
fn test_save_and_reload_samples() {
    let dir = tempfile::tempdir().unwrap();

    for name in ["cell_example_1.cell", "cell_example_2.cell", "example.param"] {
        let input = load_from_path(data(name)).unwrap();
        let out = dir.path().join(name);
        input.save_to_path(&out).unwrap();

        let reloaded = load_from_path(&out).unwrap();
        assert_eq!(reloaded, input, "round trip of {}", name);
        if input.contains_key("positions_abs") || input.contains_key("positions_frac") {
            assert_eq!(reloaded.get_positions().unwrap(), input.get_positions().unwrap());
        }
    }
}

#[test]
fn test_build_cell_file_from_scratch() {
    let mut input = CellInput::new();
    input.header_mut().push("Generated rock salt cell".to_string());
    input.set_cell([4.2, 4.2, 4.2]).unwrap();
    input
        .set_positions(
            &["Mg", "O"],
            &[Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.5, 0.5, 0.5)],
            None,
            true,
        )
        .unwrap();
    input.set("kpoints_mp_grid", vec![4_i64, 4, 4]);
    input.set("symmetry_generate", "");
    input.set_unit("lattice_cart", "ang");

    let text = input.to_text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "# Generated rock salt cell");
    assert_eq!(lines[1], "%BLOCK lattice_cart");
    assert_eq!(lines[2], "ang");
    assert_eq!(lines[3], "4.2000000000  0.0000000000  0.0000000000");
    assert!(lines.contains(&"kpoints_mp_grid     : 4 4 4"));
    assert_eq!(lines.last(), Some(&"symmetry_generate"));

    // the header comes back as a comment, the unit line is skipped by the geometry readers
    let reloaded = load_from_lines(&lines).unwrap();
    assert_eq!(reloaded.get_cell().unwrap(), input.get_cell().unwrap());
    let positions = reloaded.get_positions().unwrap();
    assert_eq!(positions.elements, ["Mg", "O"]);
    assert_eq!(positions.coordinates[1], Vector3::new(2.1, 2.1, 2.1));

    let block = reloaded.get("lattice_cart").and_then(Value::as_block).unwrap();
    assert_eq!(block.first().map(String::as_str), Some("ang"));
}
