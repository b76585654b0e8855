use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::packing::AtlasLayout;

/// Write the atlas layout as pretty-printed JSON.
pub fn write_layout(layout: &AtlasLayout, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(layout)?;
    fs::write(path, json)?;

    debug!(path = %path.display(), tiles = layout.tiles.len(), "Wrote atlas layout");
    Ok(())
}
