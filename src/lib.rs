#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compose;
pub mod document;
pub mod feature;
pub mod geom;
pub mod parse;

use std::collections::BTreeMap;
use std::fmt;

use compose::PlacementExport;
use document::{Document, RecomputeResult};
use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start the rayon thread pool: {err}")))
}

#[derive(Debug, Serialize)]
struct FeatureInfo {
    name: String,
    must_execute: bool,
}

#[derive(Debug, Serialize)]
struct GeometryExport {
    positions: Vec<f64>,
    indices: Vec<u32>,
}

impl From<&RecomputeResult> for GeometryExport {
    fn from(result: &RecomputeResult) -> Self {
        Self {
            positions: result.shape.positions.iter().flatten().copied().collect(),
            indices: result.shape.indices.clone(),
        }
    }
}

/// Public entry point for JS consumers.
#[wasm_bindgen]
pub struct Engine {
    document: Option<Document>,
    results: BTreeMap<String, RecomputeResult>,
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        Engine {
            document: None,
            results: BTreeMap::new(),
        }
    }

    #[wasm_bindgen]
    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// Load an XML feature document, replacing the previous one.
    #[wasm_bindgen]
    pub fn load_document(&mut self, xml: &str) -> Result<(), JsValue> {
        let document = parse::document_xml::parse_str(xml).map_err(to_js_error)?;
        self.document = Some(document);
        self.results.clear();
        Ok(())
    }

    /// MultiTransform features with their recompute state.
    #[wasm_bindgen]
    pub fn get_features(&self) -> Result<JsValue, JsValue> {
        let features = self.feature_infos().map_err(|err| js_error(&err))?;
        serde_wasm_bindgen::to_value(&features).map_err(|err| JsError::new(&err.to_string()).into())
    }

    #[wasm_bindgen]
    pub fn set_property(&mut self, object: &str, property: &str, value: &str) -> Result<(), JsValue> {
        let document = self.document_mut().map_err(|err| js_error(&err))?;
        document
            .set_property(object, property, value)
            .map_err(to_js_error)
    }

    /// Recompute every MultiTransform whose inputs changed.
    #[wasm_bindgen]
    pub fn recompute(&mut self) -> Result<(), JsValue> {
        self.recompute_pending().map_err(|err| js_error(&err))
    }

    #[wasm_bindgen]
    pub fn get_placements(&self, feature: &str) -> Result<JsValue, JsValue> {
        let result = self.result(feature).map_err(|err| js_error(&err))?;
        let placements: Vec<PlacementExport> =
            result.placements.iter().map(PlacementExport::from).collect();
        serde_wasm_bindgen::to_value(&placements)
            .map_err(|err| JsError::new(&err.to_string()).into())
    }

    #[wasm_bindgen]
    pub fn get_geometry(&self, feature: &str) -> Result<JsValue, JsValue> {
        let result = self.result(feature).map_err(|err| js_error(&err))?;
        serde_wasm_bindgen::to_value(&GeometryExport::from(result))
            .map_err(|err| JsError::new(&err.to_string()).into())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    fn document(&self) -> Result<&Document, String> {
        self.document
            .as_ref()
            .ok_or_else(|| "no document loaded".to_owned())
    }

    fn document_mut(&mut self) -> Result<&mut Document, String> {
        self.document
            .as_mut()
            .ok_or_else(|| "no document loaded".to_owned())
    }

    fn feature_infos(&self) -> Result<Vec<FeatureInfo>, String> {
        let document = self.document()?;
        document
            .multi_transforms()
            .into_iter()
            .map(|name| {
                let must_execute = document.must_execute(name).map_err(|err| err.to_string())?;
                Ok(FeatureInfo {
                    name: name.to_owned(),
                    must_execute,
                })
            })
            .collect()
    }

    /// Results are stored as each feature succeeds. A failing feature loses
    /// its cached result and stays pending for the next call.
    fn recompute_pending(&mut self) -> Result<(), String> {
        let pending: Vec<String> = self
            .feature_infos()?
            .into_iter()
            .filter(|info| info.must_execute || !self.results.contains_key(&info.name))
            .map(|info| info.name)
            .collect();

        let Some(document) = self.document.as_mut() else {
            return Err("no document loaded".to_owned());
        };
        for name in pending {
            match document.recompute(&name) {
                Ok(result) => {
                    self.results.insert(name, result);
                }
                Err(err) => {
                    self.results.remove(&name);
                    return Err(format!("{name}: {err}"));
                }
            }
        }
        Ok(())
    }

    fn result(&self, feature: &str) -> Result<&RecomputeResult, String> {
        self.results
            .get(feature)
            .ok_or_else(|| format!("`{feature}` has not been recomputed"))
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<Document>
  <Object name="Box" type="Part::Box"/>
  <Object name="Polar" type="PartDesign::PolarPattern">
    <Property name="Occurrences" value="4"/>
  </Object>
  <Object name="MultiTransform" type="PartDesign::MultiTransform">
    <Property name="Originals" value="Box"/>
    <Property name="Transformations" value="Polar"/>
  </Object>
</Document>"#;

    #[test]
    fn recompute_requires_document() {
        let mut engine = Engine::new();
        assert!(!engine.is_loaded());
        assert_eq!(engine.recompute_pending().unwrap_err(), "no document loaded");
    }

    #[test]
    fn recompute_fills_results() {
        let mut engine = Engine::new();
        engine.load_document(DOC).unwrap();
        engine.recompute_pending().unwrap();

        let result = engine.result("MultiTransform").unwrap();
        assert_eq!(result.placements.len(), 4);

        let geometry = GeometryExport::from(result);
        assert_eq!(geometry.positions.len(), 4 * 8 * 3);
        assert_eq!(geometry.indices.len(), 4 * 36);
    }

    #[test]
    fn property_changes_mark_features_pending() {
        let mut engine = Engine::new();
        engine.load_document(DOC).unwrap();
        engine.recompute_pending().unwrap();
        assert!(engine.feature_infos().unwrap().iter().all(|f| !f.must_execute));

        engine.set_property("Polar", "Occurrences", "6").unwrap();
        assert!(engine.feature_infos().unwrap()[0].must_execute);

        engine.recompute_pending().unwrap();
        assert_eq!(engine.result("MultiTransform").unwrap().placements.len(), 6);
    }

    #[test]
    fn failure_keeps_results_of_earlier_features() {
        const SHARED: &str = r#"<Document>
  <Object name="Box" type="Part::Box"/>
  <Object name="Polar" type="PartDesign::PolarPattern">
    <Property name="Occurrences" value="4"/>
  </Object>
  <Object name="Scaled" type="PartDesign::Scaled"/>
  <Object name="Ring" type="PartDesign::MultiTransform">
    <Property name="Originals" value="Box"/>
    <Property name="Transformations" value="Polar"/>
  </Object>
  <Object name="Growing" type="PartDesign::MultiTransform">
    <Property name="Originals" value="Box"/>
    <Property name="Transformations" value="Polar, Scaled"/>
  </Object>
</Document>"#;

        let mut engine = Engine::new();
        engine.load_document(SHARED).unwrap();
        engine.recompute_pending().unwrap();
        assert_eq!(engine.result("Growing").unwrap().placements.len(), 4);

        engine.set_property("Polar", "Occurrences", "3").unwrap();
        let err = engine.recompute_pending().unwrap_err();
        assert!(err.starts_with("Growing:"), "{err}");
        assert_eq!(engine.result("Ring").unwrap().placements.len(), 3);
        assert!(engine.result("Growing").is_err());

        engine.set_property("Scaled", "Occurrences", "3").unwrap();
        engine.recompute_pending().unwrap();
        assert_eq!(engine.result("Ring").unwrap().placements.len(), 3);
        assert_eq!(engine.result("Growing").unwrap().placements.len(), 3);
    }

    #[test]
    fn unknown_feature_has_no_result() {
        let engine = Engine::new();
        assert!(engine.result("Nope").is_err());
    }
}
