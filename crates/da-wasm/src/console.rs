//! Browser console logging and the panic hook.

/// Route `log` to the browser console and install the panic hook. Safe to
/// call once per widget; only the first call installs anything.
pub fn init(level: log::Level) {
    if console_log::init_with_level(level).is_err() {
        log::debug!("console logger already installed");
    }
    console_error_panic_hook_setup();
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("draw-annotation panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
