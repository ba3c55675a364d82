//! WebAssembly bindings for pifs

use crate::{Compressed, Compressor, PifsConfig, PifsError, SampleGrid};
use image::DynamicImage;
use wasm_bindgen::prelude::*;

fn to_js(err: PifsError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WasmCompressor {
    config: PifsConfig,
}

#[wasm_bindgen]
impl WasmCompressor {
    /// Create a compressor for the given block sizes
    ///
    /// # Arguments
    /// * `range_block_size` - Edge of the blocks the image is partitioned into
    /// * `domain_block_size` - Edge of the candidate source blocks, twice the range size
    #[wasm_bindgen(constructor)]
    pub fn new(
        range_block_size: usize,
        domain_block_size: usize,
    ) -> Result<WasmCompressor, JsValue> {
        let config = PifsConfig { range_block_size, domain_block_size, ..Default::default() };
        config.validate().map_err(to_js)?;
        Ok(WasmCompressor { config })
    }

    #[wasm_bindgen]
    pub fn set_simple_fit(&mut self, enabled: bool) {
        self.config.use_simple_fit = enabled;
    }

    #[wasm_bindgen]
    pub fn set_iterations(&mut self, iterations: usize) {
        self.config.decode_iterations = iterations;
    }

    #[wasm_bindgen]
    pub fn set_channel(&mut self, channel: usize) {
        self.config.channel = channel;
    }

    #[wasm_bindgen]
    pub fn set_seed(&mut self, seed: u32) {
        self.config.seed = seed as u64;
    }

    /// Compress RGBA pixel data of a square image; returns the records as JSON
    #[wasm_bindgen]
    pub fn compress(&self, image_data: &[u8], width: u32, height: u32) -> Result<String, JsValue> {
        let img = image::RgbaImage::from_raw(width, height, image_data.to_vec())
            .ok_or_else(|| JsValue::from_str("Invalid image dimensions"))?;
        let compressed = Compressor::from_config(self.config.clone())
            .compress_image(&DynamicImage::ImageRgba8(img))
            .map_err(to_js)?;
        let message = format!("pifs: {} transform records", compressed.records.len());
        web_sys::console::log_1(&message.into());
        compressed.to_json().map_err(to_js)
    }

    /// Decode JSON records into grayscale RGBA pixel data
    #[wasm_bindgen]
    pub fn decompress(&self, json: &str) -> Result<Vec<u8>, JsValue> {
        let grid = self.decode(json)?;
        let gray = DynamicImage::ImageLuma8(grid.to_luma8());
        Ok(gray.to_rgba8().into_raw())
    }

    /// Decode JSON records into raw samples, row by row
    #[wasm_bindgen]
    pub fn decompress_samples(&self, json: &str) -> Result<js_sys::Float32Array, JsValue> {
        let grid = self.decode(json)?;
        let samples: Vec<f32> = grid.view().iter().copied().collect();
        Ok(js_sys::Float32Array::from(&samples[..]))
    }

    fn decode(&self, json: &str) -> Result<SampleGrid, JsValue> {
        let compressed = Compressed::from_json(json).map_err(to_js)?;
        Compressor::from_config(self.config.clone()).decompress(&compressed).map_err(to_js)
    }
}
