//! Sprite manifest and image loading
//!
//! Sprites are optional: a sprite that fails to load is logged and the
//! entity is drawn as a coloured placeholder instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("failed to load image {0}")]
    ImageLoad(String),
    #[error("element #{0} not found")]
    MissingElement(String),
    #[error("browser call failed: {0}")]
    Js(String),
}

/// Image files used by the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    /// Prefix prepended to every file name
    pub base_url: String,
    pub player: String,
    /// One is picked at random for each rival
    pub rivals: Vec<String>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            player: "k2.png".to_string(),
            rivals: ["doge.png", "pepe.png", "shaggy.png", "shiba.png"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl AssetManifest {
    pub fn player_url(&self) -> String {
        format!("{}{}", self.base_url, self.player)
    }

    pub fn rival_urls(&self) -> Vec<String> {
        self.rivals.iter().map(|r| format!("{}{}", self.base_url, r)).collect()
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::{Sprites, load_image, load_sprites};

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{AssetError, AssetManifest};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::HtmlImageElement;

    /// Loaded sprite images; `None` where loading failed
    #[derive(Debug, Default)]
    pub struct Sprites {
        pub player: Option<HtmlImageElement>,
        pub rivals: Vec<Option<HtmlImageElement>>,
    }

    /// Load one image and wait for it to decode
    pub async fn load_image(url: &str) -> Result<HtmlImageElement, AssetError> {
        let img = HtmlImageElement::new().map_err(|e| AssetError::Js(format!("{:?}", e)))?;
        let promise = {
            let img = img.clone();
            let url = url.to_string();
            js_sys::Promise::new(&mut move |resolve, reject| {
                let on_load = Closure::once_into_js(move || {
                    let _ = resolve.call0(&JsValue::NULL);
                });
                let on_error = Closure::once_into_js(move || {
                    let _ = reject.call0(&JsValue::NULL);
                });
                img.set_onload(Some(on_load.unchecked_ref()));
                img.set_onerror(Some(on_error.unchecked_ref()));
                img.set_src(&url);
            })
        };
        JsFuture::from(promise)
            .await
            .map_err(|_| AssetError::ImageLoad(url.to_string()))?;
        Ok(img)
    }

    async fn load_or_warn(url: &str) -> Option<HtmlImageElement> {
        match load_image(url).await {
            Ok(img) => Some(img),
            Err(e) => {
                log::warn!("{}; using placeholder", e);
                None
            }
        }
    }

    /// Load every sprite in the manifest
    pub async fn load_sprites(manifest: &AssetManifest) -> Sprites {
        let player = load_or_warn(&manifest.player_url()).await;
        let mut rivals = Vec::with_capacity(manifest.rivals.len());
        for url in manifest.rival_urls() {
            rivals.push(load_or_warn(&url).await);
        }
        log::info!(
            "Sprites loaded: player {}, rivals {}/{}",
            player.is_some(),
            rivals.iter().filter(|r| r.is_some()).count(),
            rivals.len()
        );
        Sprites { player, rivals }
    }
}
