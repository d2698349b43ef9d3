//! Display contract and a headless implementation

use tracing::{debug, trace};

/// Fallback refresh rate when the display cannot report one
pub const DEFAULT_REFRESH_HZ: u32 = 60;

/// Buffer swap behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapInterval {
    /// Present as soon as possible
    Immediate,
    /// Wait for vertical sync
    VSync,
}

/// Graphics output
pub trait Display {
    /// Size the output window; called once when the host is built
    fn set_window_size(&mut self, width: u32, height: u32);

    /// Upload a `width * height` RGBA bitmap as the next frame
    fn upload_frame(&mut self, pixels: &[u32], width: usize, height: usize);

    /// Show the uploaded frame
    fn present(&mut self);

    /// Change how presents are synchronised
    fn set_swap_interval(&mut self, interval: SwapInterval);

    /// Enter or leave fullscreen
    fn set_fullscreen(&mut self, fullscreen: bool);

    /// Monitor refresh rate, if known
    fn refresh_rate_hz(&self) -> Option<u32> {
        None
    }
}

/// Display that keeps the latest frame in memory
#[derive(Debug, Clone)]
pub struct HeadlessDisplay {
    frame: Vec<u32>,
    uploads: u64,
    presents: u64,
    swap_interval: SwapInterval,
    fullscreen: bool,
    refresh_hz: Option<u32>,
    window_size: Option<(u32, u32)>,
}

impl Default for HeadlessDisplay {
    fn default() -> Self {
        Self {
            frame: Vec::new(),
            uploads: 0,
            presents: 0,
            swap_interval: SwapInterval::VSync,
            fullscreen: false,
            refresh_hz: None,
            window_size: None,
        }
    }
}

impl HeadlessDisplay {
    /// Create a display reporting `hz` as its refresh rate
    pub fn with_refresh_rate(hz: u32) -> Self {
        Self {
            refresh_hz: Some(hz),
            ..Self::default()
        }
    }

    /// Last uploaded frame
    pub fn frame(&self) -> &[u32] {
        &self.frame
    }

    /// Number of frames uploaded
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    /// Number of presents
    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Current swap interval
    pub fn swap_interval(&self) -> SwapInterval {
        self.swap_interval
    }

    /// Whether fullscreen is on
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Window size in pixels, once set
    pub fn window_size(&self) -> Option<(u32, u32)> {
        self.window_size
    }
}

impl Display for HeadlessDisplay {
    fn set_window_size(&mut self, width: u32, height: u32) {
        debug!("Window size: {}x{}", width, height);
        self.window_size = Some((width, height));
    }

    fn upload_frame(&mut self, pixels: &[u32], width: usize, height: usize) {
        let len = (width * height).min(pixels.len());
        self.frame.clear();
        self.frame.extend_from_slice(&pixels[..len]);
        self.uploads += 1;
    }

    fn present(&mut self) {
        self.presents += 1;
        trace!("Presented frame {}", self.presents);
    }

    fn set_swap_interval(&mut self, interval: SwapInterval) {
        debug!("Swap interval: {:?}", interval);
        self.swap_interval = interval;
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        debug!("Fullscreen: {}", fullscreen);
        self.fullscreen = fullscreen;
    }

    fn refresh_rate_hz(&self) -> Option<u32> {
        self.refresh_hz
    }
}

/// Milliseconds per refresh for `hz`, falling back to 60 Hz when unknown
pub fn refresh_period_ms(hz: Option<u32>) -> f64 {
    let hz = match hz {
        Some(hz) if hz > 0 => hz,
        _ => DEFAULT_REFRESH_HZ,
    };
    1000.0 / hz as f64
}
