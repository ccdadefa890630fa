use vrgraft_core::config::Context;

const DOCUMENTATION: &str = r#"# VRGraft context. You may edit this file, but be aware that formatting and comments will not
# be preserved if it is ever rewritten. Every field is optional, missing ones take their defaults.

# `ui_layer` and `invisible_layer` name host layers. The UI layer is captured into the 2D surfaces,
# neither is ever rendered in stereo. Unknown names are warned about and treated as no layer at all.
# `ignore_mask` holds the raw bits of further layers hidden from the stereo viewpoint.
# `preferred_gui` is one of "Canvas" or "Immediate".

"#;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

const FILENAME: &str = "context.toml";

/// Load the context at `path`, or from the preferences dir if None.
///
/// A missing preferences file is created with the defaults. An explicitly given path must exist.
pub fn load_context(path: Option<&std::path::Path>) -> anyhow::Result<Context> {
    if let Some(path) = path {
        let string = std::fs::read_to_string(path)?;
        return Ok(Context::from_toml(&string)?);
    }

    let Some(mut path) = preferences_dir() else {
        log::warn!("No preferences dir found, using the default context.");
        return Ok(Context::default());
    };
    path.push(FILENAME);
    if path.exists() {
        let string = std::fs::read_to_string(&path)?;
        Ok(Context::from_toml(&string)?)
    } else {
        let context = Context::default();
        if let Err(e) = save_default(&context) {
            log::warn!("Failed to write default context to {path:?}:\n{e:?}");
        }
        Ok(context)
    }
}

fn save_default(context: &Context) -> anyhow::Result<()> {
    let result: anyhow::Result<std::path::PathBuf> = try_block::try_block! {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Only our own directory is created, never its parents.
        // It may already exist, real failures surface from the write.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(FILENAME);
        let string = DOCUMENTATION.to_owned() + &context.to_toml()?;
        std::fs::write(&preferences, string)?;
        Ok(preferences)
    };
    let path = result?;
    log::info!("Wrote default context to {path:?}");
    Ok(())
}
