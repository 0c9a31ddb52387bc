#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
use pyo3::prelude::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod ast;
pub mod error;
pub mod format;
pub mod layout;
pub mod painter;
pub mod parser;
pub mod tokenizer;
pub mod types;

pub use error::Error;
pub use format::{format_string, format_string_with};
pub use layout::{paint_structogram, paint_structogram_with, render_text};
pub use parser::parse_string;
pub use tokenizer::tokenize;

/// The parsed tree as pretty JSON.
pub fn parse_text_json(text: &str) -> Result<String, Error> {
    let structogram = parse_string(text)?;
    Ok(serde_json::to_string_pretty(&structogram)?)
}

/// Recorded drawing as pretty JSON. `options_json` may be empty or name any
/// subset of the render options.
pub fn render_text_json(text: &str, options_json: &str) -> Result<String, Error> {
    let options: types::RenderOptions = if options_json.trim().is_empty() {
        types::RenderOptions::default()
    } else {
        serde_json::from_str(options_json)?
    };
    let drawing = render_text(text, &options)?;
    Ok(serde_json::to_string_pretty(&drawing)?)
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
fn py_err(e: Error) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string())
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pyfunction]
fn format_text(text: String) -> PyResult<String> {
    format_string(&text).map_err(py_err)
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pyfunction]
fn parse_text(text: String) -> PyResult<String> {
    parse_text_json(&text).map_err(py_err)
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pyfunction]
#[pyo3(name = "render_text", signature = (text, options_json = String::new()))]
fn render_text_py(text: String, options_json: String) -> PyResult<String> {
    render_text_json(&text, &options_json).map_err(py_err)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn format_text_wasm(text: &str) -> Result<String, JsValue> {
    format_string(text).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn parse_text_wasm(text: &str) -> Result<String, JsValue> {
    parse_text_json(text).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn render_text_wasm(text: &str, options_json: &str) -> Result<String, JsValue> {
    render_text_json(text, options_json).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pymodule]
fn nsd_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(format_text, m)?)?;
    m.add_function(wrap_pyfunction!(parse_text, m)?)?;
    m.add_function(wrap_pyfunction!(render_text_py, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn run_fixture(input_path: &Path) {
        let golden_path = input_path.with_extension("nsd.golden");
        let input = fs::read_to_string(input_path).expect("Failed to read input");
        let golden = fs::read_to_string(&golden_path).expect("Failed to read golden");

        let out = format_string(&input)
            .unwrap_or_else(|e| panic!("{}: {e}", input_path.display()));
        if out != golden {
            for (i, (a, b)) in out.lines().zip(golden.lines()).enumerate() {
                if a != b {
                    println!("Mismatch at line {}", i + 1);
                    println!("Got: {a:?}");
                    println!("Exp: {b:?}");
                    break;
                }
            }
            assert_eq!(out, golden, "Mismatch in fixture {}", input_path.display());
        }
        assert_eq!(format_string(&golden).unwrap(), golden, "golden is not stable");
    }

    #[test]
    fn test_fixtures() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let mut inputs: Vec<_> = fs::read_dir(&dir)
            .expect("Failed to read fixtures")
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|x| x == "nsd"))
            .collect();
        inputs.sort();
        assert!(!inputs.is_empty(), "no fixtures in {}", dir.display());
        for input in &inputs {
            run_fixture(input);
        }
    }

    #[test]
    fn parse_json_is_tagged_by_statement_type() {
        let json = parse_text_json(r#"while "i<10" { break "x" }"#).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        let stmt = &v["statements"][0];
        assert_eq!(stmt["type"], "While");
        assert_eq!(stmt["condition"]["text"], "i<10");
        assert_eq!(stmt["block"]["statements"][0]["type"], "Break");
    }

    #[test]
    fn render_json_accepts_partial_options() {
        let json = render_text_json(r#""a""#, r#"{"metrics": {"char_width": 10}}"#).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["width"], 28);
        assert_eq!(v["ops"][0]["op"], "rect");
        assert_eq!(v["ops"][1], serde_json::json!({"op": "text", "x": 8, "y": 8, "text": "a"}));

        assert!(render_text_json(r#""a""#, "").is_ok());
        assert!(matches!(
            render_text_json(r#""a""#, r#"{"metrics":{"line_height":1500000000}}"#),
            Err(Error::InvalidOption { name: "line_height", .. })
        ));
        assert!(matches!(
            render_text_json(r#""a""#, "{"),
            Err(Error::Json(_))
        ));
    }
}
