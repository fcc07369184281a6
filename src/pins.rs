//! GPIO / peripheral pin assignments for the Aurix camera board.
//!
//! Single source of truth: every driver and `main` references this module
//! rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Push-buttons (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// Button 1: panic.
pub const PANIC_BUTTON_GPIO: i32 = 1;
/// Button 2: defence mode.
pub const DEFENCE_BUTTON_GPIO: i32 = 2;
/// Button 3: "I am safe".
pub const SAFE_BUTTON_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Indicators (active HIGH)
// ---------------------------------------------------------------------------

pub const LED_A_GPIO: i32 = 4;
pub const LED_B_GPIO: i32 = 5;
pub const LED_C_GPIO: i32 = 6;
pub const LED_D_GPIO: i32 = 7;
/// Active buzzer, driven directly (no PWM).
pub const BUZZER_GPIO: i32 = 8;

/// High-power illumination LED used while capturing.
pub const FLASH_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// GPS receiver (NMEA over UART1)
// ---------------------------------------------------------------------------

pub const GPS_UART_TX_GPIO: i32 = 43;
pub const GPS_UART_RX_GPIO: i32 = 44;
pub const GPS_BAUD: u32 = 9600;

// ---------------------------------------------------------------------------
// Camera (DVP, OV2640 module)
// ---------------------------------------------------------------------------

/// -1 = not connected.
pub const CAM_PWDN_GPIO: i32 = -1;
pub const CAM_RESET_GPIO: i32 = -1;
pub const CAM_XCLK_GPIO: i32 = 10;
pub const CAM_SIOD_GPIO: i32 = 40;
pub const CAM_SIOC_GPIO: i32 = 39;

pub const CAM_Y9_GPIO: i32 = 48;
pub const CAM_Y8_GPIO: i32 = 11;
pub const CAM_Y7_GPIO: i32 = 12;
pub const CAM_Y6_GPIO: i32 = 14;
pub const CAM_Y5_GPIO: i32 = 16;
pub const CAM_Y4_GPIO: i32 = 18;
pub const CAM_Y3_GPIO: i32 = 17;
pub const CAM_Y2_GPIO: i32 = 15;
pub const CAM_VSYNC_GPIO: i32 = 38;
pub const CAM_HREF_GPIO: i32 = 47;
pub const CAM_PCLK_GPIO: i32 = 13;

/// Camera master clock (20 MHz).
pub const CAM_XCLK_FREQ_HZ: i32 = 20_000_000;
