use once_cell::sync::Lazy;
use std::sync::Arc;

pub static HOME_DIR: Lazy<Option<Arc<str>>> = Lazy::new(|| {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USER").map(|user| format!("/home/{}", user)))
        .map(Arc::from)
        .ok()
});

pub static CONFIG_DIR: Lazy<Option<Arc<str>>> = Lazy::new(|| {
    std::env::var("XDG_CONFIG_HOME")
        .map(Arc::from)
        .ok()
        .or_else(|| {
            HOME_DIR
                .as_ref()
                .map(|home| format!("{}/.config", home).into())
        })
});
