//! Camera adapter.
//!
//! Implements [`CameraPort`].
//!
//! - **`target_os = "espidf"`** — the `esp32-camera` component (pulled in
//!   as an ESP-IDF extra component, bindings under `esp_idf_sys::camera`).
//!   Frames are the driver's own `camera_fb_t` buffers and must go back
//!   through `esp_camera_fb_return`.
//! - **all other targets** — a simulated sensor that yields a synthetic
//!   JPEG and can be told to fail.
//!
//! `Option<C>` is itself a camera: `None` stands for a sensor that failed
//! to initialise, and every capture from it reports no frame.

use crate::app::ports::CameraPort;

/// Sensor settings picked from the memory available for frame buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    /// SVGA when set, VGA otherwise.
    pub svga: bool,
    pub jpeg_quality: i32,
    pub fb_count: usize,
    pub in_psram: bool,
}

impl FramePlan {
    pub fn for_memory(psram: bool) -> Self {
        if psram {
            Self {
                svga: true,
                jpeg_quality: 12,
                fb_count: 2,
                in_psram: true,
            }
        } else {
            Self {
                svga: false,
                jpeg_quality: 14,
                fb_count: 1,
                in_psram: false,
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF camera
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use core::ptr::NonNull;

    use esp_idf_sys::camera;
    use esp_idf_sys::{esp, EspError};
    use log::{error, info, warn};

    use super::FramePlan;
    use crate::app::ports::CameraPort;
    use crate::pins;

    /// Driver-owned frame buffer.
    pub struct EspFrame(NonNull<camera::camera_fb_t>);

    impl AsRef<[u8]> for EspFrame {
        fn as_ref(&self) -> &[u8] {
            // SAFETY: the driver guarantees `buf` points at `len` bytes until
            // the buffer is returned, and returning consumes `self`.
            unsafe {
                let fb = self.0.as_ref();
                core::slice::from_raw_parts(fb.buf, fb.len)
            }
        }
    }

    pub struct EspCamera {
        _private: (),
    }

    impl EspCamera {
        /// Initialise the sensor as JPEG.  With PSRAM: SVGA, two frame
        /// buffers in PSRAM.  Without: VGA, one buffer in DRAM.
        pub fn init() -> Result<Self, EspError> {
            // SAFETY: read-only heap statistics.
            let psram_bytes =
                unsafe { esp_idf_sys::heap_caps_get_total_size(esp_idf_sys::MALLOC_CAP_SPIRAM) };
            let plan = FramePlan::for_memory(psram_bytes > 0);
            if !plan.in_psram {
                warn!("Camera: no PSRAM, falling back to VGA with one DRAM buffer");
            }
            let config = camera::camera_config_t {
                pin_pwdn: pins::CAM_PWDN_GPIO,
                pin_reset: pins::CAM_RESET_GPIO,
                pin_xclk: pins::CAM_XCLK_GPIO,
                __bindgen_anon_1: camera::camera_config_t__bindgen_ty_1 {
                    pin_sccb_sda: pins::CAM_SIOD_GPIO,
                },
                __bindgen_anon_2: camera::camera_config_t__bindgen_ty_2 {
                    pin_sccb_scl: pins::CAM_SIOC_GPIO,
                },
                pin_d7: pins::CAM_Y9_GPIO,
                pin_d6: pins::CAM_Y8_GPIO,
                pin_d5: pins::CAM_Y7_GPIO,
                pin_d4: pins::CAM_Y6_GPIO,
                pin_d3: pins::CAM_Y5_GPIO,
                pin_d2: pins::CAM_Y4_GPIO,
                pin_d1: pins::CAM_Y3_GPIO,
                pin_d0: pins::CAM_Y2_GPIO,
                pin_vsync: pins::CAM_VSYNC_GPIO,
                pin_href: pins::CAM_HREF_GPIO,
                pin_pclk: pins::CAM_PCLK_GPIO,
                xclk_freq_hz: pins::CAM_XCLK_FREQ_HZ,
                ledc_timer: esp_idf_sys::ledc_timer_t_LEDC_TIMER_0,
                ledc_channel: esp_idf_sys::ledc_channel_t_LEDC_CHANNEL_0,
                pixel_format: camera::pixformat_t_PIXFORMAT_JPEG,
                frame_size: if plan.svga {
                    camera::framesize_t_FRAMESIZE_SVGA
                } else {
                    camera::framesize_t_FRAMESIZE_VGA
                },
                jpeg_quality: plan.jpeg_quality,
                fb_count: plan.fb_count,
                fb_location: if plan.in_psram {
                    camera::camera_fb_location_t_CAMERA_FB_IN_PSRAM
                } else {
                    camera::camera_fb_location_t_CAMERA_FB_IN_DRAM
                },
                grab_mode: camera::camera_grab_mode_t_CAMERA_GRAB_LATEST,
                ..Default::default()
            };

            esp!(unsafe { camera::esp_camera_init(&config) }).inspect_err(|e| {
                error!("Camera: init failed ({})", e);
            })?;
            info!(
                "Camera: initialised ({} JPEG, {} buffer(s))",
                if plan.svga { "SVGA" } else { "VGA" },
                plan.fb_count
            );
            Ok(Self { _private: () })
        }
    }

    impl CameraPort for EspCamera {
        type Frame = EspFrame;

        fn capture_frame(&mut self) -> Option<EspFrame> {
            NonNull::new(unsafe { camera::esp_camera_fb_get() }).map(EspFrame)
        }

        fn release_frame(&mut self, frame: EspFrame) {
            unsafe { camera::esp_camera_fb_return(frame.0.as_ptr()) };
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{EspCamera, EspFrame};

// ───────────────────────────────────────────────────────────────
// Absent camera
// ───────────────────────────────────────────────────────────────

impl<C: CameraPort> CameraPort for Option<C> {
    type Frame = C::Frame;

    fn capture_frame(&mut self) -> Option<C::Frame> {
        self.as_mut()?.capture_frame()
    }

    fn release_frame(&mut self, frame: C::Frame) {
        if let Some(camera) = self {
            camera.release_frame(frame);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

/// Minimal JFIF: SOI, APP0, EOI.
const SIM_JPEG: [u8; 22] = [
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];

/// Host-side camera: hands out copies of a fixed JPEG.
pub struct SimCamera {
    /// When set, every capture returns `None`.
    pub fail: bool,
    frame: Vec<u8>,
    outstanding: usize,
}

impl Default for SimCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SimCamera {
    pub fn new() -> Self {
        Self::with_frame(SIM_JPEG.to_vec())
    }

    /// A sensor that yields copies of `frame`.
    pub fn with_frame(frame: Vec<u8>) -> Self {
        Self {
            fail: false,
            frame,
            outstanding: 0,
        }
    }

    /// Frames handed out and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
}

impl CameraPort for SimCamera {
    type Frame = Vec<u8>;

    fn capture_frame(&mut self) -> Option<Vec<u8>> {
        if self.fail {
            log::warn!("Camera(sim): simulated capture failure");
            return None;
        }
        self.outstanding += 1;
        Some(self.frame.clone())
    }

    fn release_frame(&mut self, _frame: Vec<u8>) {
        self.outstanding = self.outstanding.saturating_sub(1);
    }
}
