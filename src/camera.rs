//! Camera HTTP client
//!
//! Talks to the ESP32 camera module over plain HTTP: `/flash` toggles
//! the LED, `/capture` returns a JPEG frame. Requests carry bounded
//! timeouts so a powered-off camera fails fast instead of hanging.

use std::time::{Duration, Instant};

use base64::Engine;

use crate::{Error, Result};

/// Timeout for the flash toggle request
const FLASH_TIMEOUT: Duration = Duration::from_secs(1);

/// Timeout for the capture request
const CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between switching the flash on and capturing, letting exposure
/// settle
const FLASH_SETTLE: Duration = Duration::from_millis(150);

/// Client for the camera module's HTTP endpoints
pub struct CameraClient {
    client: reqwest::Client,
    base_url: String,
}

impl CameraClient {
    /// Create a client for a camera at `base_url`
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Toggle the camera flash LED
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or times out
    pub async fn toggle_flash(&self) -> Result<()> {
        self.client
            .get(format!("{}/flash", self.base_url))
            .timeout(FLASH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Capture one JPEG frame
    ///
    /// With `flash` set, the LED is switched on, given a moment to
    /// settle, and switched back off after the capture. Flash toggle
    /// failures are logged and ignored; only the capture itself is
    /// required to succeed.
    ///
    /// # Errors
    ///
    /// Returns error if the capture request fails or times out
    pub async fn capture(&self, flash: bool) -> Result<Vec<u8>> {
        let start = Instant::now();

        if flash {
            if let Err(e) = self.toggle_flash().await {
                tracing::warn!(error = %e, "flash on failed, capturing anyway");
            }
            tokio::time::sleep(FLASH_SETTLE).await;
        }

        let capture = self
            .client
            .get(format!("{}/capture", self.base_url))
            .timeout(CAPTURE_TIMEOUT)
            .send()
            .await;

        if flash {
            if let Err(e) = self.toggle_flash().await {
                tracing::warn!(error = %e, "flash off failed");
            }
        }

        let response = capture?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Camera(format!("capture returned {status}")));
        }

        let bytes = response.bytes().await?;
        tracing::debug!(
            bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "image captured"
        );
        Ok(bytes.to_vec())
    }

    /// Capture one frame and encode it as a `data:image/jpeg` URL for
    /// the vision API
    ///
    /// # Errors
    ///
    /// Returns error if the capture fails
    pub async fn capture_data_url(&self, flash: bool) -> Result<String> {
        let raw = self.capture(flash).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&raw);
        Ok(format!("data:image/jpeg;base64,{encoded}"))
    }
}
