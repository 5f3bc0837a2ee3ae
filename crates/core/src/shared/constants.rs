pub const DEFAULT_MAX_FACES: usize = 1;

/// Tick rate used when emulating a display refresh outside a compositor.
pub const DEFAULT_TICK_RATE_HZ: u32 = 30;

/// Directory name under the platform config dir.
pub const CONFIG_DIR_NAME: &str = "visage";
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
